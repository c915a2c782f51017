//! # Scratch Workspace
//!
//! Secret material is only ever written inside a per-bind scratch directory.
//! The directory is owned by exactly one bind call and removed wholesale by
//! its [`UnbindHandle`].
//!
//! ## Layout
//!
//! ```text
//! <run workspace>/
//! └── bindXXXXXXXXXXXX/        # 0700, random name
//!     ├── privateXXXXXXXXXXXX.key   # 0500
//!     └── sshXXXXXXXXXXXX.sh        # 0500 (wrapper script, when needed)
//! ```
//!
//! Permissions are only enforced on Unix. Windows has no equivalent mode bits.

use crate::error::Result;
use rand::{distributions::Alphanumeric, Rng};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SCRATCH_DIR_PREFIX: &str = "bind";
const RANDOM_NAME_LEN: usize = 12;
const CREATE_ATTEMPTS: usize = 16;

/// Filesystem primitives for one scratch directory.
pub trait Workspace: Send {
    /// Directory holding every file this workspace creates.
    fn path(&self) -> &Path;

    /// Create an empty file with a unique name inside the workspace.
    fn create_temp_file(&self, prefix: &str, suffix: &str) -> io::Result<PathBuf>;

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn set_permission(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Remove the directory and everything in it. Succeeds if it is already gone.
    fn remove_all(&self) -> io::Result<()>;
}

/// A scratch directory on the local filesystem, created lazily on first write.
#[derive(Debug)]
pub struct LocalWorkspace {
    dir: PathBuf,
}

impl LocalWorkspace {
    /// Pick a fresh, randomly named directory under `parent`.
    pub fn new(parent: impl AsRef<Path>) -> Self {
        let name = format!("{SCRATCH_DIR_PREFIX}{}", random_name());
        Self {
            dir: parent.as_ref().join(name),
        }
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }

        if let Some(parent) = self.dir.parent() {
            fs::create_dir_all(parent)?;
        }

        // Owner-only from creation; the umask can only narrow it
        let mut builder = DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.dir)?;

        debug!(path = %self.dir.display(), "created scratch directory");
        Ok(())
    }
}

impl Workspace for LocalWorkspace {
    fn path(&self) -> &Path {
        &self.dir
    }

    fn create_temp_file(&self, prefix: &str, suffix: &str) -> io::Result<PathBuf> {
        self.ensure_dir()?;

        for _ in 0..CREATE_ATTEMPTS {
            let path = self
                .dir
                .join(format!("{prefix}{}{suffix}", random_name()));

            let mut options = OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }

            match options.open(&path) {
                Ok(_) => return Ok(path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("could not create a unique file in {}", self.dir.display()),
        ))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    #[cfg(unix)]
    fn set_permission(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_permission(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    fn remove_all(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect()
}

/// One-shot cleanup for a bound workspace.
///
/// `unbind` is idempotent. Dropping the handle unbinds as well, so a handle
/// held in scope cleans up even on early return.
pub struct UnbindHandle {
    workspace: Option<Box<dyn Workspace>>,
}

impl UnbindHandle {
    pub fn new(workspace: Box<dyn Workspace>) -> Self {
        Self {
            workspace: Some(workspace),
        }
    }

    /// Scratch directory, or `None` once unbound.
    pub fn path(&self) -> Option<&Path> {
        self.workspace.as_deref().map(|ws| ws.path())
    }

    pub fn is_unbound(&self) -> bool {
        self.workspace.is_none()
    }

    pub(crate) fn workspace(&self) -> Option<&dyn Workspace> {
        self.workspace.as_deref()
    }

    /// Remove the scratch directory. Calling this again is a no-op.
    pub fn unbind(&mut self) -> Result<()> {
        if let Some(workspace) = &self.workspace {
            workspace.remove_all()?;
            debug!(path = %workspace.path().display(), "removed scratch directory");
        }
        self.workspace = None;
        Ok(())
    }
}

impl std::fmt::Debug for UnbindHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnbindHandle")
            .field("path", &self.path())
            .finish()
    }
}

impl Drop for UnbindHandle {
    fn drop(&mut self) {
        if let Err(e) = self.unbind() {
            warn!(error = %e, "failed to remove scratch directory");
        }
    }
}
