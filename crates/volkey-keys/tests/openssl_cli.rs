//! Integration test: the real openssl binary, when one is installed
//!
//! Each test returns early if `openssl version` cannot be run, so the suite
//! still passes on hosts without openssl.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use volkey_keys::{KeyMaterialGenerator, OpensslPrimitive};

fn openssl_available() -> bool {
    std::process::Command::new("openssl")
        .arg("version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn generator() -> KeyMaterialGenerator {
    KeyMaterialGenerator::new(Arc::new(OpensslPrimitive::new(
        "openssl",
        Duration::from_secs(10),
    )))
}

#[tokio::test]
async fn xts_key_is_128_hex_chars() {
    if !openssl_available() {
        eprintln!("openssl not installed, skipping");
        return;
    }

    let material = generator()
        .generate(&SecretString::from("p"), "aes-256-xts")
        .await
        .unwrap();

    let key = material.key.unwrap();
    assert_eq!(key.len(), 128);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(material.iv.is_none());
    assert!(material.salt.is_none());
}

#[tokio::test]
async fn cbc_yields_key_salt_and_iv() {
    if !openssl_available() {
        eprintln!("openssl not installed, skipping");
        return;
    }

    let material = generator()
        .generate(&SecretString::from("p"), "aes-256-cbc")
        .await
        .unwrap();

    assert_eq!(material.key.as_ref().map(String::len), Some(64));
    assert_eq!(material.salt.as_ref().map(String::len), Some(16));
    assert_eq!(material.iv.as_ref().map(String::len), Some(32));
}

#[tokio::test]
async fn unknown_cipher_is_tool_error() {
    if !openssl_available() {
        eprintln!("openssl not installed, skipping");
        return;
    }

    let err = generator()
        .generate(&SecretString::from("p"), "no-such-cipher")
        .await
        .unwrap_err();

    assert!(matches!(err, volkey_keys::KeyError::ExternalTool { .. }));
}
