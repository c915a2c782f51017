use std::process::Command;

use crate::binding::EnvironmentMapping;
use crate::error::{BindError, Result};
use tracing::debug;

/// Run a command with a bound environment added on top of the current one.
/// Returns the child's exit code, or 1 if it was killed by a signal.
pub fn run_with_environment(mapping: &EnvironmentMapping, command: &[String]) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| BindError::Config("no command specified".to_string()))?;

    debug!(
        program = program.as_str(),
        variables = ?mapping.names().collect::<Vec<_>>(),
        "running command"
    );

    let status = Command::new(program)
        .args(args)
        .envs(mapping.iter())
        .status()?;

    Ok(status.code().unwrap_or(1))
}
