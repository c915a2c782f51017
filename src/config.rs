//! Layered settings, lowest precedence first:
//!
//! 1. `<config dir>/git-credential-bind/config.toml`
//! 2. `.git-credential-bind.toml` in the repository root
//! 3. `GIT_CREDENTIAL_BIND_*` environment variables

use crate::error::{BindError, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "git-credential-bind";
const USER_CONFIG_FILE: &str = "config.toml";
pub const REPO_CONFIG_FILE: &str = ".git-credential-bind.toml";
const ENV_PREFIX: &str = "GIT_CREDENTIAL_BIND_";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Git client probed for its version.
    #[serde(default = "default_git_executable")]
    pub git_executable: String,
    /// Explicit ssh client; resolved per platform when unset.
    pub ssh_executable: Option<PathBuf>,
    /// Parent directory for scratch workspaces.
    pub workspace: Option<PathBuf>,
    /// Skip probing and force `GIT_SSH_COMMAND` support on or off.
    pub ssh_command_override: Option<bool>,
}

fn default_git_executable() -> String {
    "git".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            git_executable: default_git_executable(),
            ssh_executable: None,
            workspace: None,
            ssh_command_override: None,
        }
    }
}

/// User config file location, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(USER_CONFIG_FILE))
}

/// Load settings for a run rooted at `repo_root`.
pub fn load_settings(repo_root: &Path) -> Result<Settings> {
    load_from(user_config_path().as_deref(), repo_root)
}

pub(crate) fn load_from(user_file: Option<&Path>, repo_root: &Path) -> Result<Settings> {
    let repo_file = repo_root.join(REPO_CONFIG_FILE);

    let mut builder = Config::builder();
    for path in user_file.into_iter().chain([repo_file.as_path()]) {
        if path.is_file() {
            debug!(path = %path.display(), "loading settings file");
            let name = path
                .to_str()
                .ok_or_else(|| BindError::Config(format!("invalid config path: {}", path.display())))?;
            builder = builder.add_source(File::new(name, FileFormat::Toml));
        }
    }

    let mut settings: Settings = builder
        .build()
        .and_then(|cfg| cfg.try_deserialize())
        .map_err(|err| BindError::Config(format!("failed to load settings: {err}")))?;

    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
    if let Ok(git) = env::var(format!("{ENV_PREFIX}GIT_EXECUTABLE")) {
        settings.git_executable = git;
    }
    if let Ok(ssh) = env::var(format!("{ENV_PREFIX}SSH_EXECUTABLE")) {
        settings.ssh_executable = Some(ssh.into());
    }
    if let Ok(workspace) = env::var(format!("{ENV_PREFIX}WORKSPACE")) {
        settings.workspace = Some(workspace.into());
    }
    if let Ok(value) = env::var(format!("{ENV_PREFIX}SSH_COMMAND_OVERRIDE")) {
        let flag = value.trim().parse::<bool>().map_err(|_| {
            BindError::Config(format!(
                "{ENV_PREFIX}SSH_COMMAND_OVERRIDE must be true or false, got {value:?}"
            ))
        })?;
        settings.ssh_command_override = Some(flag);
    }
    Ok(())
}
