//! CLI-contract tests for the key authorizer binary.
//!
//! The group scan itself is covered by unit tests in githost-common;
//! these check the invocation surface sshd depends on: flag shape, the
//! closed key-type set, and silence on stdout for every rejection.

use std::process::{Command, Output};

fn githost_keys(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_githost-keys"))
        .args(args)
        .env_remove("GITHOST_CONFIG")
        .output()
        .expect("failed to run githost-keys")
}

#[test]
fn help_names_both_required_flags() {
    let output = githost_keys(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-G"));
    assert!(stdout.contains("-t"));
}

#[test]
fn missing_group_is_a_usage_error() {
    let output = githost_keys(&["-t", "ssh-ed25519", "AAAA"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_key_type_is_a_usage_error() {
    let output = githost_keys(&["-G", "git-users", "AAAA"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn unrecognized_key_type_is_rejected_with_the_accepted_set() {
    let output = githost_keys(&["-G", "git-users", "-t", "ssh-bogus", "AAAA"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ssh-ed25519"), "stderr: {stderr}");
    assert!(stderr.contains("ssh-rsa"), "stderr: {stderr}");
}

#[test]
fn absent_group_rejects_quietly_with_status_one() {
    let output = githost_keys(&[
        "-G",
        "githost-no-such-group-fixture",
        "-t",
        "ssh-ed25519",
        "AAAAC3NzaC1lZDI1NTE5AAAAIBGr",
    ]);
    assert_eq!(output.status.code(), Some(1));
    // Rejections never emit a key line.
    assert!(output.stdout.is_empty());
}
