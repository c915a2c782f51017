//! # Credential Bindings
//!
//! A binding exposes one credential to a git subprocess through environment
//! variables for the lifetime of a run. Each [`GitCredentialBinding`] takes a
//! fresh scratch [`Workspace`], writes whatever files git needs into it, and
//! returns a [`BoundEnvironment`]: the variables to install plus the
//! [`UnbindHandle`] that removes the files again.
//!
//! ## Variables
//!
//! | Name | Set by | Value |
//! |---|---|---|
//! | `PRIVATE_KEY` | ssh | raw key text (sensitive) |
//! | `PASSPHRASE` | ssh | raw passphrase (sensitive) |
//! | `GIT_TERMINAL_PROMPT` | both | `false`, non-Windows with git >= 2.3 |
//! | `GCM_INTERACTIVE` | both | `false`, otherwise |
//! | `GIT_SSH_COMMAND` | ssh | full ssh command line |
//! | `GIT_SSH` | ssh | path to a wrapper script |
//! | `GIT_USERNAME` | userpass | username |
//! | `GIT_PASSWORD` | userpass | password (sensitive) |
//! | `GIT_ASKPASS` | userpass | path to the askpass script |
//!
//! A failed bind returns no mapping and leaves no files behind.

pub mod ssh;
pub mod userpass;

pub use ssh::SshPrivateKeyBinding;
pub use userpass::UsernamePasswordBinding;

use crate::error::Result;
use crate::git::GitCapabilities;
use crate::invocation::{self, Platform};
use crate::workspace::{UnbindHandle, Workspace};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;
use zeroize::Zeroizing;

pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const PASSPHRASE: &str = "PASSPHRASE";
pub const GIT_TERMINAL_PROMPT: &str = "GIT_TERMINAL_PROMPT";
pub const GCM_INTERACTIVE: &str = "GCM_INTERACTIVE";
pub const GIT_SSH_COMMAND: &str = "GIT_SSH_COMMAND";
pub const GIT_SSH: &str = "GIT_SSH";
pub const GIT_USERNAME: &str = "GIT_USERNAME";
pub const GIT_PASSWORD: &str = "GIT_PASSWORD";
pub const GIT_ASKPASS: &str = "GIT_ASKPASS";

/// A credential that can be bound into a git subprocess environment.
pub trait GitCredentialBinding {
    /// Every variable name this binding may set.
    fn variables(&self) -> Vec<&'static str>;

    /// Materialize the credential into `workspace` and build the environment.
    ///
    /// The workspace is owned by the returned handle. On error it has already
    /// been removed.
    fn bind(&self, workspace: Box<dyn Workspace>, ctx: &BindContext) -> Result<BoundEnvironment>;
}

/// Host facts a binding needs. Supplied by the caller, never discovered here.
#[derive(Debug, Clone)]
pub struct BindContext {
    pub platform: Platform,
    pub git: GitCapabilities,
    pub ssh_executable: PathBuf,
}

impl BindContext {
    /// Context with the default ssh client for `platform`.
    pub fn new(platform: Platform, git: GitCapabilities) -> Self {
        Self {
            platform,
            git,
            ssh_executable: invocation::ssh_executable(platform, None),
        }
    }

    pub fn with_ssh_executable(mut self, ssh: impl Into<PathBuf>) -> Self {
        self.ssh_executable = ssh.into();
        self
    }
}

struct Entry {
    name: String,
    value: Zeroizing<String>,
    sensitive: bool,
}

/// Ordered variable name to value mapping. Values are wiped on drop.
#[derive(Default)]
pub struct EnvironmentMapping {
    entries: Vec<Entry>,
}

impl EnvironmentMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable. Replacing an existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name.into(), value.into(), false);
    }

    /// Set a variable whose value must never be logged or echoed.
    pub fn insert_sensitive(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name.into(), value.into(), true);
    }

    fn set(&mut self, name: String, value: String, sensitive: bool) {
        let value = Zeroizing::new(value);
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.value = value;
                entry.sensitive = sensitive;
            }
            None => self.entries.push(Entry {
                name,
                value,
                sensitive,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name && e.sensitive)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// `(name, value)` pairs in insertion order, ready for `Command::envs`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_str()))
    }
}

impl fmt::Debug for EnvironmentMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.entries {
            if entry.sensitive {
                map.entry(&entry.name, &"<redacted>");
            } else {
                map.entry(&entry.name, &entry.value.as_str());
            }
        }
        map.finish()
    }
}

/// The result of a successful bind.
#[derive(Debug)]
pub struct BoundEnvironment {
    mapping: EnvironmentMapping,
    handle: UnbindHandle,
}

impl BoundEnvironment {
    pub fn new(mapping: EnvironmentMapping, handle: UnbindHandle) -> Self {
        Self { mapping, handle }
    }

    pub fn mapping(&self) -> &EnvironmentMapping {
        &self.mapping
    }

    /// Scratch directory holding the bound files, `None` once unbound.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.handle.path()
    }

    pub fn unbind(&mut self) -> Result<()> {
        self.handle.unbind()
    }

    pub fn into_parts(self) -> (EnvironmentMapping, UnbindHandle) {
        (self.mapping, self.handle)
    }
}

/// Set exactly one of `GIT_TERMINAL_PROMPT` or `GCM_INTERACTIVE` to `false`.
pub fn apply_prompt_flags(mapping: &mut EnvironmentMapping, ctx: &BindContext) {
    if !ctx.platform.is_windows() && ctx.git.terminal_prompt {
        mapping.insert(GIT_TERMINAL_PROMPT, "false");
    } else {
        mapping.insert(GCM_INTERACTIVE, "false");
    }
}

/// Run `populate` against `workspace`, removing the workspace if it fails.
pub(crate) fn bind_with<F>(workspace: Box<dyn Workspace>, populate: F) -> Result<BoundEnvironment>
where
    F: FnOnce(&dyn Workspace) -> Result<EnvironmentMapping>,
{
    let mut handle = UnbindHandle::new(workspace);

    let outcome = match handle.workspace() {
        Some(workspace) => populate(workspace),
        None => Ok(EnvironmentMapping::new()),
    };

    match outcome {
        Ok(mapping) => Ok(BoundEnvironment::new(mapping, handle)),
        Err(e) => {
            if let Err(cleanup) = handle.unbind() {
                warn!(error = %cleanup, "failed to remove scratch directory after bind error");
            }
            Err(e)
        }
    }
}

/// Write `contents` to a fresh file in `workspace` and restrict it to `mode`.
pub(crate) fn write_restricted(
    workspace: &dyn Workspace,
    prefix: &str,
    suffix: &str,
    contents: &[u8],
    mode: u32,
) -> Result<PathBuf> {
    let path = workspace.create_temp_file(prefix, suffix)?;
    workspace.write(&path, contents)?;
    workspace.set_permission(&path, mode)?;
    Ok(path)
}
