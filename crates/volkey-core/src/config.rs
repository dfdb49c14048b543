use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{VolkeyError, VolkeyResult};

/// Top-level service configuration (loaded from volkey.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolkeyConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub keys: KeysConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address (default: 0.0.0.0:5005)
    pub listen: String,
    /// Allowed CORS origins; "*" allows any origin
    pub cors_origins: Vec<String>,
    /// Upper bound on a single upload request body
    pub max_upload_bytes: usize,
    /// Shared bearer token; when unset every route is open
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory for relative paths below
    pub data_dir: PathBuf,
    /// JSON configuration document (default: config/config.json)
    pub config_file: PathBuf,
    /// Directory receiving uploaded files (default: uploads)
    pub uploads_dir: PathBuf,
    /// Serialize read-merge-write cycles behind a mutex
    pub serialize_updates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Path or name of the openssl binary
    pub openssl_path: PathBuf,
    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
    /// Pass -pbkdf2 to `openssl enc` for password-based derivation
    pub pbkdf2: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5005".into(),
            cors_origins: vec!["*".into()],
            max_upload_bytes: 1024 * 1024 * 1024,
            auth_token: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            config_file: PathBuf::from("config/config.json"),
            uploads_dir: PathBuf::from("uploads"),
            serialize_updates: true,
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            openssl_path: PathBuf::from("openssl"),
            timeout_secs: 10,
            pbkdf2: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl VolkeyConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> VolkeyResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VolkeyError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Reject settings the daemon cannot start with.
    pub fn validate(&self) -> VolkeyResult<()> {
        self.server.listen_addr()?;
        if self.keys.timeout_secs == 0 {
            return Err(VolkeyError::Config("keys.timeout_secs must be > 0".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(VolkeyError::Config(
                "server.max_upload_bytes must be > 0".into(),
            ));
        }
        if matches!(self.server.auth_token.as_deref(), Some("")) {
            return Err(VolkeyError::Config(
                "server.auth_token must not be empty (omit it to disable auth)".into(),
            ));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> VolkeyResult<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| VolkeyError::Config(format!("invalid listen address {:?}: {e}", self.listen)))
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl StoreConfig {
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(&self.config_file)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.data_dir.join(&self.uploads_dir)
    }

    /// Create the uploads directory and the config file's parent.
    pub fn prepare_dirs(&self) -> VolkeyResult<()> {
        let config_path = self.config_path();
        let mut dirs = vec![self.uploads_path()];
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent.to_path_buf());
        }

        for dir in dirs {
            std::fs::create_dir_all(&dir)
                .map_err(|e| VolkeyError::Storage(format!("creating {}: {e}", dir.display())))?;
        }
        Ok(())
    }
}
