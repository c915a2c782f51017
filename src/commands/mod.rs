pub mod detect;
pub mod ssh;
pub mod userpass;

pub use detect::detect;
pub use ssh::ssh;
pub use userpass::userpass;

use crate::binding::{BindContext, GitCredentialBinding};
use crate::config::{load_settings, Settings};
use crate::error::{BindError, Result};
use crate::git::{self, GitCapabilities, GitRepo};
use crate::invocation::{self, Platform};
use crate::runner::run_with_environment;
use crate::workspace::LocalWorkspace;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

/// Where a passphrase or password comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// No secret (empty string).
    None,
    /// Read from the named environment variable.
    Env(String),
    /// Prompt on the terminal without echo.
    Prompt,
}

impl SecretSource {
    pub(crate) fn read(&self, prompt: &str) -> Result<Zeroizing<String>> {
        match self {
            SecretSource::None => Ok(Zeroizing::new(String::new())),
            SecretSource::Env(var) => env::var(var)
                .map(Zeroizing::new)
                .map_err(|_| BindError::Config(format!("environment variable {var} is not set"))),
            SecretSource::Prompt => Ok(Zeroizing::new(rpassword::prompt_password(prompt)?)),
        }
    }
}

/// Bind `binding`, run `command` with the result and unbind again.
pub(crate) fn run_bound(
    binding: &dyn GitCredentialBinding,
    workspace: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    if command.is_empty() {
        return Err(BindError::Config("no command specified".to_string()));
    }

    let cwd = env::current_dir()?;
    let settings = load_settings(&repo_root(&cwd))?;
    let ctx = bind_context(&settings)?;

    let root = workspace
        .map(Path::to_path_buf)
        .or_else(|| settings.workspace.clone())
        .unwrap_or_else(|| git::default_workspace_root(&cwd));
    debug!(root = %root.display(), "workspace root");

    let mut bound = binding.bind(Box::new(LocalWorkspace::new(root)), &ctx)?;
    let code = run_with_environment(bound.mapping(), command)?;
    bound.unbind()?;
    Ok(code)
}

fn repo_root(cwd: &Path) -> PathBuf {
    GitRepo::discover(cwd)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
        .unwrap_or_else(|| cwd.to_path_buf())
}

fn bind_context(settings: &Settings) -> Result<BindContext> {
    let platform = Platform::current()?;

    let git = match settings.ssh_command_override {
        Some(modern) => {
            debug!(modern, "git capabilities forced by settings");
            if modern {
                GitCapabilities::modern()
            } else {
                GitCapabilities::legacy()
            }
        }
        None => GitCapabilities::from_version(&git::probe(&settings.git_executable)?),
    };

    let ssh = settings.ssh_executable.clone().unwrap_or_else(|| {
        invocation::ssh_executable(platform, Some(Path::new(&settings.git_executable)))
    });

    Ok(BindContext::new(platform, git).with_ssh_executable(ssh))
}
