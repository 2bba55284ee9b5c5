//! Binary smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn smbmount() -> Command {
    let mut cmd = Command::cargo_bin("smbmount").unwrap();
    cmd.env_remove("SMBMOUNT_PASSWORD")
        .env_remove("SMBMOUNT_BACKEND");
    cmd
}

#[test]
fn help_lists_subcommands() {
    smbmount()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mount"))
        .stdout(predicate::str::contains("unmount"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn mount_requires_password() {
    smbmount()
        .args(["mount", "//smb-server/share", "/mnt/smb", "--username", "user"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--password"));
}

#[test]
fn unreachable_helper_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let socket = dir.path().join("absent.sock");
    smbmount()
        .args(["check", "/mnt/smb", "--fs-endpoint"])
        .arg(&socket)
        .arg("--smb-endpoint")
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("transport"));
}

#[cfg(unix)]
#[test]
fn native_check_reports_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let absent = dir.path().join("absent");
    smbmount()
        .args(["--backend", "native", "check", "--format", "json"])
        .arg(&absent)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""exists":false"#))
        .stdout(predicate::str::contains(r#""is_mount_point":false"#));
}
