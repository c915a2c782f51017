use super::{run_bound, SecretSource};
use crate::binding::UsernamePasswordBinding;
use crate::credential::UsernamePassword;
use crate::error::Result;
use std::path::Path;

/// Run `command` with a username and password bound for git over HTTPS
pub fn userpass(
    username: &str,
    password: &SecretSource,
    workspace: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    let password = password.read(&format!("Password for {username}: "))?;
    let credential = UsernamePassword::new(username, username, password.as_str());

    run_bound(&UsernamePasswordBinding::new(credential), workspace, command)
}
