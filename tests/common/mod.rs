use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;

/// Passphrase of every encrypted fixture key.
#[allow(dead_code)]
pub const FIXTURE_PASSPHRASE: &str = "p@ss";

/// Path to a key under `tests/fixtures/`.
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a key under `tests/fixtures/`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("failed to read fixture")
}

/// Create a new temporary git repository with user config set.
#[allow(dead_code)]
pub fn create_git_repo() -> TempDir {
    let temp = TempDir::new().expect("failed to create temp dir");

    StdCommand::new("git")
        .args(["init"])
        .current_dir(temp.path())
        .output()
        .expect("failed to init git repo");

    StdCommand::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(temp.path())
        .output()
        .expect("failed to set git user.email");

    StdCommand::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(temp.path())
        .output()
        .expect("failed to set git user.name");

    temp
}

/// Number of entries directly inside `dir`.
#[allow(dead_code)]
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// The git-credential-bind binary with settings isolated from the host:
/// no git probe, no user config, logs quiet.
#[allow(dead_code)]
pub fn bind_cmd(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("git-credential-bind");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("GIT_CREDENTIAL_BIND_LOG")
        .env_remove("GIT_CREDENTIAL_BIND_GIT_EXECUTABLE")
        .env_remove("GIT_CREDENTIAL_BIND_SSH_EXECUTABLE")
        .env_remove("GIT_CREDENTIAL_BIND_WORKSPACE")
        .env("GIT_CREDENTIAL_BIND_SSH_COMMAND_OVERRIDE", "true");
    cmd
}

/// Whether an OpenSSH `ssh-keygen` binary is on PATH.
#[allow(dead_code)]
pub fn ssh_keygen_available() -> bool {
    StdCommand::new("ssh-keygen")
        .arg("-?")
        .output()
        .is_ok()
}
