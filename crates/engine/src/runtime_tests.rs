// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn binary_names() {
    assert_eq!(ContainerRuntime::Docker.binary(), "docker");
    assert_eq!(ContainerRuntime::Podman.binary(), "podman");
}

#[test]
fn missing_binary_is_not_executable() {
    assert!(!is_executable(Path::new("/definitely/not/here/docker")));
}

#[cfg(unix)]
#[test]
fn executable_detection_checks_mode_bits() {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain");
    std::fs::File::create(&plain).unwrap().write_all(b"x").unwrap();
    assert!(!is_executable(&plain));

    let exec = dir.path().join("exec");
    std::fs::File::create(&exec).unwrap().write_all(b"x").unwrap();
    let mut perms = std::fs::metadata(&exec).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&exec, perms).unwrap();
    assert!(is_executable(&exec));
}
