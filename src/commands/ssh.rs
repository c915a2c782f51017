use super::{run_bound, SecretSource};
use crate::binding::SshPrivateKeyBinding;
use crate::credential::SshUserPrivateKey;
use crate::error::Result;
use std::fs;
use std::path::Path;
use zeroize::Zeroizing;

/// Run `command` with the private key in `key_file` bound for git over SSH
pub fn ssh(
    key_file: &Path,
    passphrase: &SecretSource,
    workspace: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    let key = Zeroizing::new(fs::read_to_string(key_file)?);
    let passphrase = passphrase.read("Key passphrase: ")?;

    let id = key_file.display().to_string();
    let credential = SshUserPrivateKey::new(id, "git")
        .with_private_key(key.as_str())
        .with_passphrase(passphrase.as_str());

    run_bound(&SshPrivateKeyBinding::new(credential), workspace, command)
}
