use crate::error::{BindError, Result};
use git2::Repository;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Directory under `.git/` that holds scratch workspaces.
const SCRATCH_SUBDIR: &str = "credential-bind";

pub struct GitRepo {
    repo: Repository,
}

impl GitRepo {
    /// Open the repository containing `path`
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Ok(Self { repo })
    }

    /// Get the git directory path
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Working tree root, `None` for a bare repository
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Parent directory for scratch workspaces; never part of the working tree
    pub fn scratch_root(&self) -> PathBuf {
        self.git_dir().join(SCRATCH_SUBDIR)
    }
}

/// Where scratch workspaces go when none is configured: inside the current
/// repository's git dir, or the system temp dir outside a repository.
pub fn default_workspace_root(cwd: impl AsRef<Path>) -> PathBuf {
    match GitRepo::discover(cwd) {
        Ok(repo) => repo.scratch_root(),
        Err(_) => std::env::temp_dir(),
    }
}

/// Version reported by `git --version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub rev: u32,
    pub build: u32,
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, rev: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            rev,
            build,
        }
    }

    /// Parse `git version 2.39.2`, `git version 2.37.1.windows.1`,
    /// `git version 2.39.3 (Apple Git-145)` and similar.
    pub fn parse(output: &str) -> Result<Self> {
        let version = output
            .trim()
            .strip_prefix("git version")
            .map(str::trim)
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(|| {
                BindError::GitClient(format!("unrecognized version output: {}", output.trim()))
            })?;

        let mut numbers = version
            .split('.')
            .map(|part| part.parse::<u32>().ok());

        let major = numbers.next().flatten().ok_or_else(|| {
            BindError::GitClient(format!("unrecognized git version: {version}"))
        })?;
        let mut next = || numbers.next().flatten().unwrap_or(0);
        let minor = next();
        let rev = next();
        let build = next();

        Ok(Self::new(major, minor, rev, build))
    }

    pub fn is_at_least(&self, major: u32, minor: u32, rev: u32, build: u32) -> bool {
        *self >= Self::new(major, minor, rev, build)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.rev)?;
        if self.build > 0 {
            write!(f, ".{}", self.build)?;
        }
        Ok(())
    }
}

/// What the configured git client can do, as far as bindings care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GitCapabilities {
    /// `GIT_SSH_COMMAND` is honoured.
    pub ssh_command_override: bool,
    /// `GIT_TERMINAL_PROMPT=false` suppresses interactive prompts.
    pub terminal_prompt: bool,
}

impl GitCapabilities {
    /// Both features arrived in git 2.3.0.
    pub fn from_version(version: &GitVersion) -> Self {
        let modern = version.is_at_least(2, 3, 0, 0);
        Self {
            ssh_command_override: modern,
            terminal_prompt: modern,
        }
    }

    pub fn modern() -> Self {
        Self {
            ssh_command_override: true,
            terminal_prompt: true,
        }
    }

    /// A client with neither feature (old command line git, embedded implementations).
    pub fn legacy() -> Self {
        Self::default()
    }
}

/// Run `<git> --version` and parse the result.
pub fn probe(git_executable: &str) -> Result<GitVersion> {
    let output = Command::new(git_executable)
        .arg("--version")
        .output()
        .map_err(|e| BindError::GitClient(format!("failed to run {git_executable}: {e}")))?;

    if !output.status.success() {
        return Err(BindError::GitClient(format!(
            "{git_executable} --version exited with {}",
            output.status
        )));
    }

    let version = GitVersion::parse(&String::from_utf8_lossy(&output.stdout))?;
    debug!(%version, git = git_executable, "probed git client");
    Ok(version)
}
