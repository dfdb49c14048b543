//! Integration test: a primitive that never answers is cut off by the timeout
//!
//! Kept in its own test binary so no other test forks while the fake tool
//! script is being written.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::time::{Duration, Instant};
use volkey_keys::{KeyError, KeyPrimitive, OpensslPrimitive};

#[tokio::test]
async fn hung_tool_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("openssl");
    std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let prim = OpensslPrimitive::new(&script, Duration::from_millis(300));
    let started = Instant::now();
    let err = prim.random_hex(64).await.unwrap_err();

    match err {
        KeyError::ExternalTool { message, status, .. } => {
            assert!(message.contains("timed out"), "{message}");
            assert_eq!(status, None);
        }
        other => panic!("expected ExternalTool, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}
