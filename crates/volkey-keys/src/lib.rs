//! volkey-keys: key material for disk/volume encryption settings
//!
//! Two derivation paths, picked by cipher mode:
//!   - `aes-256-xts`: password ignored; 64 random bytes from the primitive
//!     become the key, with no iv or salt
//!   - anything else: the primitive derives key/iv/salt from the password for
//!     the flag `-<mode>`, and its `key=value` listing is parsed into
//!     `KeyMaterial`
//!
//! Either way callers get `{key, iv, salt}` with every field present.

pub mod error;
pub mod primitive;

pub use error::{KeyError, Param};
pub use primitive::{KeyPrimitive, OpensslPrimitive, PASSWORD_ENV};

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;
use volkey_core::KeyMaterial;

/// Cipher mode whose two-key material is drawn from the RNG instead of the
/// password.
pub const XTS_MODE: &str = "aes-256-xts";

/// Random bytes requested for XTS (512 bits, two AES-256 keys).
pub const XTS_KEY_BYTES: usize = 64;

pub struct KeyMaterialGenerator {
    primitive: Arc<dyn KeyPrimitive>,
}

impl KeyMaterialGenerator {
    pub fn new(primitive: Arc<dyn KeyPrimitive>) -> Self {
        Self { primitive }
    }

    /// Produce key material for `cipher_mode`.
    ///
    /// Both inputs must be non-empty; the password is checked first and
    /// nothing is invoked when either is missing. The primitive is called
    /// exactly once, never retried.
    pub async fn generate(
        &self,
        password: &SecretString,
        cipher_mode: &str,
    ) -> Result<KeyMaterial, KeyError> {
        if password.expose_secret().is_empty() {
            return Err(KeyError::MissingParameter(Param::Password));
        }
        if cipher_mode.is_empty() {
            return Err(KeyError::MissingParameter(Param::CipherMode));
        }

        if cipher_mode == XTS_MODE {
            debug!(cipher_mode, bytes = XTS_KEY_BYTES, "generating random XTS key");
            let raw = self.primitive.random_hex(XTS_KEY_BYTES).await?;
            let key = parse_random_hex(&raw, XTS_KEY_BYTES)?;
            return Ok(KeyMaterial {
                key: Some(key),
                iv: None,
                salt: None,
            });
        }

        debug!(cipher_mode, "deriving key material from password");
        let raw = self
            .primitive
            .derive(password, &format!("-{cipher_mode}"))
            .await?;
        parse_derive_output(&raw)
    }
}

/// Parse the `key=value` listing printed by `openssl enc -P`.
///
/// Keys are lower-cased and trimmed, values trimmed; the split is on the
/// first `=`. Blank lines are skipped, a non-blank line without `=` is an
/// error. A missing `iv` is normal for modes without one and stays `None`.
pub fn parse_derive_output(output: &str) -> Result<KeyMaterial, KeyError> {
    let mut material = KeyMaterial::default();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| KeyError::UnexpectedOutput(format!("line without '=': {line:?}")))?;
        let value = value.trim().to_string();

        match name.trim().to_lowercase().as_str() {
            "key" => material.key = Some(value),
            "iv" => material.iv = Some(value),
            "salt" => material.salt = Some(value),
            other => debug!(field = other, "ignoring unknown field in primitive output"),
        }
    }

    Ok(material)
}

/// Trim and check a hex string of `n_bytes` bytes.
fn parse_random_hex(output: &str, n_bytes: usize) -> Result<String, KeyError> {
    let hex = output.trim();
    if hex.len() != n_bytes * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KeyError::UnexpectedOutput(format!(
            "expected {} hex characters, got {:?}",
            n_bytes * 2,
            hex
        )));
    }
    Ok(hex.to_string())
}
