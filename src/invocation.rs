//! # SSH Invocation Builder
//!
//! Composes what git needs to reach the materialized key:
//!
//! - **DirectOverride**: git >= 2.3 reads a full command line from
//!   `GIT_SSH_COMMAND`.
//! - **WrapperScript**: older clients only accept a program path in
//!   `GIT_SSH`, so the flags go into a small `.sh` / `.bat` script.
//!
//! Output is consumed byte-for-byte by git, so quoting is exact: the key
//! path is always double quoted, and so is the ssh path on Windows.

use crate::error::{BindError, Result};
use crate::git::GitCapabilities;
use std::path::{Path, PathBuf};

/// Owner read+execute, applied to the key file and to generated scripts.
pub const KEY_FILE_MODE: u32 = 0o500;
pub const SCRIPT_FILE_MODE: u32 = 0o500;

const HOST_KEY_OPTION: &str = "-o StrictHostKeyChecking=no";

/// Host platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_family(std::env::consts::FAMILY)
    }

    /// Map an OS family name (`std::env::consts::FAMILY`) to a platform.
    pub fn from_family(family: &str) -> Result<Self> {
        match family {
            "windows" => Ok(Platform::Windows),
            "unix" => Ok(Platform::Posix),
            other => Err(BindError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn script_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".bat",
            Platform::Posix => ".sh",
        }
    }
}

/// How a bind exposes the key to git. Chosen once per bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStrategy {
    DirectOverride,
    WrapperScript,
}

impl InvocationStrategy {
    pub fn select(git: &GitCapabilities) -> Self {
        if git.ssh_command_override {
            InvocationStrategy::DirectOverride
        } else {
            InvocationStrategy::WrapperScript
        }
    }
}

/// Locate the ssh client git should use.
pub fn ssh_executable(platform: Platform, git_executable: Option<&Path>) -> PathBuf {
    ssh_executable_with(platform, git_executable, |path| path.is_file())
}

fn ssh_executable_with(
    platform: Platform,
    git_executable: Option<&Path>,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    match platform {
        Platform::Posix => PathBuf::from("ssh"),
        Platform::Windows => {
            let mut candidates = Vec::new();

            // Git for Windows: <install>\cmd\git.exe or <install>\bin\git.exe
            if let Some(install) = git_executable
                .and_then(Path::parent)
                .and_then(Path::parent)
            {
                candidates.push(install.join("usr").join("bin").join("ssh.exe"));
                candidates.push(install.join("bin").join("ssh.exe"));
            }

            for program_files in [r"C:\Program Files\Git", r"C:\Program Files (x86)\Git"] {
                candidates.push(PathBuf::from(format!(r"{program_files}\usr\bin\ssh.exe")));
                candidates.push(PathBuf::from(format!(r"{program_files}\bin\ssh.exe")));
            }

            candidates
                .into_iter()
                .find(|candidate| exists(candidate))
                .unwrap_or_else(|| PathBuf::from("ssh.exe"))
        }
    }
}

/// Value for `GIT_SSH_COMMAND`.
pub fn ssh_command(platform: Platform, ssh: &Path, key: &Path) -> String {
    format!(
        "{} -i {} {HOST_KEY_OPTION}",
        program(platform, ssh),
        quote(platform, &key.to_string_lossy())
    )
}

/// A generated script and the file suffix it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperScript {
    pub suffix: &'static str,
    pub body: String,
}

/// Script for `GIT_SSH` that forwards git's arguments to ssh with the key flags.
pub fn wrapper_script(platform: Platform, ssh: &Path, key: &Path) -> WrapperScript {
    let invocation = ssh_command(platform, ssh, key);
    let body = match platform {
        Platform::Windows => format!("@echo off\r\n{invocation} %*\r\n"),
        Platform::Posix => format!("#!/bin/sh\n{invocation} \"$@\"\n"),
    };

    WrapperScript {
        suffix: platform.script_suffix(),
        body,
    }
}

/// Script for `GIT_ASKPASS` answering git's username and password prompts
/// from the named environment variables. The secrets never enter the script.
pub fn askpass_script(platform: Platform, username_var: &str, password_var: &str) -> WrapperScript {
    let body = match platform {
        Platform::Windows => format!(
            "@echo off\r\n\
             setlocal EnableDelayedExpansion\r\n\
             set \"ARG=%~1\"\r\n\
             if /I \"!ARG:~0,8!\"==\"Username\" (\r\n\
             \x20   echo(!{username_var}!\r\n\
             ) else (\r\n\
             \x20   echo(!{password_var}!\r\n\
             )\r\n"
        ),
        Platform::Posix => format!(
            "#!/bin/sh\n\
             case \"$1\" in\n\
             \x20   Username*) printf '%s\\n' \"${username_var}\" ;;\n\
             \x20   Password*) printf '%s\\n' \"${password_var}\" ;;\n\
             esac\n"
        ),
    };

    WrapperScript {
        suffix: platform.script_suffix(),
        body,
    }
}

fn program(platform: Platform, ssh: &Path) -> String {
    let ssh = ssh.to_string_lossy();
    match platform {
        Platform::Windows => quote(platform, &ssh),
        Platform::Posix if ssh.chars().any(char::is_whitespace) => quote(platform, &ssh),
        Platform::Posix => ssh.into_owned(),
    }
}

fn quote(platform: Platform, value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    match platform {
        // Windows paths cannot contain a double quote
        Platform::Windows => quoted.push_str(value),
        Platform::Posix => {
            for c in value.chars() {
                if matches!(c, '"' | '\\' | '$' | '`') {
                    quoted.push('\\');
                }
                quoted.push(c);
            }
        }
    }
    quoted.push('"');
    quoted
}
