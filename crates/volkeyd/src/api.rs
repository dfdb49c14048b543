//! HTTP surface
//!
//! Endpoints:
//!   POST /upload         — multipart `file` + text fields; saves the file and
//!                          merges the fields into the config document
//!   GET  /config         — the config document as a JSON object
//!   POST /generate_keys  — `{password, cipher_mode}` → `{key, iv, salt}`
//!   GET  /healthz        — liveness probe, never behind auth

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Request, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use volkey_core::config::{ServerConfig, VolkeyConfig};
use volkey_core::{ConfigDocument, KeyMaterial};
use volkey_keys::{KeyMaterialGenerator, KeyPrimitive, OpensslPrimitive};
use volkey_store::{ConfigStore, StoreError, UploadStore};

use crate::error::ApiError;

/// Name of the multipart part carrying the uploaded file
const FILE_FIELD: &str = "file";

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config_store: Arc<ConfigStore>,
    pub uploads: Arc<UploadStore>,
    pub keys: Arc<KeyMaterialGenerator>,
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn from_config(config: &VolkeyConfig) -> Self {
        let primitive: Arc<dyn KeyPrimitive> = Arc::new(OpensslPrimitive::from_config(&config.keys));
        Self::new(config, primitive)
    }

    pub fn new(config: &VolkeyConfig, primitive: Arc<dyn KeyPrimitive>) -> Self {
        Self {
            config_store: Arc::new(ConfigStore::from_config(&config.store)),
            uploads: Arc::new(UploadStore::new(config.store.uploads_path())),
            keys: Arc::new(KeyMaterialGenerator::new(primitive)),
            auth_token: config.server.auth_token.as_deref().map(Arc::from),
        }
    }
}

pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let guarded = Router::new()
        .route("/upload", post(upload))
        .route("/config", get(get_config))
        .route("/generate_keys", post(generate_keys))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if server.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Reject requests without the configured bearer token. No-op when auth is
/// disabled.
async fn require_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.auth_token.as_deref() {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!("received upload request");

    // A body that is not multipart cannot carry a file part
    let mut multipart = multipart.map_err(|_| ApiError::BadRequest("No file part".into()))?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields: Vec<(String, String)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            Some(file_name) if name == FILE_FIELD && file.is_none() => {
                let data = field.bytes().await?;
                file = Some((file_name, data.to_vec()));
            }
            Some(_) => {
                debug!(field = %name, "ignoring extra file part");
            }
            None => {
                let value = field.text().await?;
                fields.push((name, value));
            }
        }
    }

    let Some((file_name, data)) = file else {
        return Err(ApiError::BadRequest("No file part".into()));
    };
    if file_name.is_empty() {
        return Err(ApiError::BadRequest("No selected file".into()));
    }

    let saved = state
        .uploads
        .save(&file_name, &data)
        .await
        .map_err(|e| match e {
            StoreError::InvalidFileName(_) => ApiError::BadRequest("Invalid file name".into()),
            other => {
                warn!("failed to save upload: {other}");
                ApiError::Internal("Failed to save file".into())
            }
        })?;

    let field_names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
    debug!(fields = ?field_names, "form data received");

    state.config_store.update(fields).await.map_err(|e| {
        warn!("failed to save config: {e}");
        ApiError::Internal("Failed to save config file".into())
    })?;

    info!(
        path = %saved.display(),
        bytes = data.len(),
        "file uploaded and config saved"
    );
    Ok(Json(MessageResponse {
        message: "File uploaded and config saved successfully".into(),
    }))
}

async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigDocument>, ApiError> {
    let outcome = state
        .config_store
        .read_outcome()
        .await
        .map_err(|e| ApiError::Internal(format!("Error reading config: {e}")))?;
    Ok(Json(outcome.document))
}

/// Body of POST /generate_keys. Absent and `null` fields count as missing.
#[derive(Deserialize)]
pub struct GenerateKeysRequest {
    password: Option<String>,
    cipher_mode: Option<String>,
}

async fn generate_keys(
    State(state): State<AppState>,
    payload: Result<Json<GenerateKeysRequest>, JsonRejection>,
) -> Result<Json<KeyMaterial>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let password = SecretString::from(req.password.unwrap_or_default());
    let cipher_mode = req.cipher_mode.unwrap_or_default();

    let material = state.keys.generate(&password, &cipher_mode).await?;
    debug!(cipher_mode = %cipher_mode, has_iv = material.iv.is_some(), "key material generated");
    Ok(Json(material))
}
