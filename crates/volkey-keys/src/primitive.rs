//! External cryptographic primitive.
//!
//! The service only needs two capabilities from the tool:
//!   - password-based derivation of key/iv/salt for a cipher flag
//!     (`openssl enc -<mode> -P -pass env:VOLKEY_PASS`)
//!   - N random bytes as hex (`openssl rand -hex N`)
//!
//! `KeyPrimitive` captures exactly those two, so tests and alternative tools
//! can stand in for openssl.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use volkey_core::config::KeysConfig;

use crate::error::KeyError;

/// Child environment variable carrying the password to `openssl enc`.
/// Read whole by openssl, unlike `-pass stdin` which stops at the first
/// newline.
pub const PASSWORD_ENV: &str = "VOLKEY_PASS";

#[async_trait]
pub trait KeyPrimitive: Send + Sync {
    /// Derive key material for `cipher_flag` (e.g. `-aes-256-cbc`) from
    /// `password`, returning the tool's raw `key=value` listing.
    async fn derive(&self, password: &SecretString, cipher_flag: &str)
        -> Result<String, KeyError>;

    /// Produce `n_bytes` of randomness, hex encoded.
    async fn random_hex(&self, n_bytes: usize) -> Result<String, KeyError>;
}

/// `KeyPrimitive` backed by the openssl command-line tool.
#[derive(Debug, Clone)]
pub struct OpensslPrimitive {
    binary: PathBuf,
    timeout: Duration,
    pbkdf2: bool,
}

impl OpensslPrimitive {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            pbkdf2: false,
        }
    }

    pub fn from_config(config: &KeysConfig) -> Self {
        Self::new(
            config.openssl_path.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .with_pbkdf2(config.pbkdf2)
    }

    /// Ask `openssl enc` for PBKDF2 instead of the legacy EVP_BytesToKey.
    pub fn with_pbkdf2(mut self, enabled: bool) -> Self {
        self.pbkdf2 = enabled;
        self
    }

    /// Run the tool once with `args` and extra environment `envs`, bounded
    /// by the configured timeout. The child is killed if the timeout fires.
    async fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<String, KeyError> {
        let label = args.first().copied().unwrap_or_default();

        let child = Command::new(&self.binary)
            .args(args)
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| KeyError::tool(format!("spawning {}: {e}", self.binary.display())))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(KeyError::tool(format!("openssl {label}: {e}"))),
            Err(_) => {
                return Err(KeyError::tool(format!(
                    "openssl {label} timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(KeyError::ExternalTool {
                message: format!("openssl {label} failed ({}): {stderr}", output.status),
                status: output.status.code(),
                stderr,
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|_| KeyError::UnexpectedOutput(format!("openssl {label} output is not UTF-8")))
    }
}

#[async_trait]
impl KeyPrimitive for OpensslPrimitive {
    async fn derive(
        &self,
        password: &SecretString,
        cipher_flag: &str,
    ) -> Result<String, KeyError> {
        let source = format!("env:{PASSWORD_ENV}");
        let mut args = vec!["enc", cipher_flag, "-P", "-pass", source.as_str()];
        if self.pbkdf2 {
            args.push("-pbkdf2");
        }
        // Not in argv: the environment is private to the child
        self.run(&args, &[(PASSWORD_ENV, password.expose_secret())])
            .await
    }

    async fn random_hex(&self, n_bytes: usize) -> Result<String, KeyError> {
        let count = n_bytes.to_string();
        self.run(&["rand", "-hex", &count], &[]).await
    }
}
