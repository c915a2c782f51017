use super::{
    apply_prompt_flags, bind_with, write_restricted, BindContext, BoundEnvironment,
    EnvironmentMapping, GitCredentialBinding, GCM_INTERACTIVE, GIT_SSH, GIT_SSH_COMMAND,
    GIT_TERMINAL_PROMPT, PASSPHRASE, PRIVATE_KEY,
};
use crate::credential::SshUserPrivateKey;
use crate::error::Result;
use crate::invocation::{self, InvocationStrategy, KEY_FILE_MODE, SCRIPT_FILE_MODE};
use crate::normalize::normalize;
use crate::workspace::Workspace;
use tracing::{debug, info};

/// Binds an SSH private key for git over `ssh://` remotes.
#[derive(Debug)]
pub struct SshPrivateKeyBinding {
    credential: SshUserPrivateKey,
}

impl SshPrivateKeyBinding {
    pub fn new(credential: SshUserPrivateKey) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &SshUserPrivateKey {
        &self.credential
    }
}

impl GitCredentialBinding for SshPrivateKeyBinding {
    fn variables(&self) -> Vec<&'static str> {
        vec![
            PRIVATE_KEY,
            PASSPHRASE,
            GIT_TERMINAL_PROMPT,
            GCM_INTERACTIVE,
            GIT_SSH_COMMAND,
            GIT_SSH,
        ]
    }

    fn bind(&self, workspace: Box<dyn Workspace>, ctx: &BindContext) -> Result<BoundEnvironment> {
        bind_with(workspace, |workspace| {
            let material = self.credential.key_material()?;

            // Decrypt before touching the filesystem so a bad key leaves nothing behind
            let key = normalize(&material)?;

            let mut mapping = EnvironmentMapping::new();
            mapping.insert_sensitive(PRIVATE_KEY, material.raw_text());
            mapping.insert_sensitive(PASSPHRASE, material.passphrase());
            drop(material);

            apply_prompt_flags(&mut mapping, ctx);

            let key_file =
                write_restricted(workspace, "private", ".key", key.as_bytes(), KEY_FILE_MODE)?;
            drop(key);
            debug!(path = %key_file.display(), "wrote private key");

            let strategy = InvocationStrategy::select(&ctx.git);
            match strategy {
                InvocationStrategy::DirectOverride => {
                    let command =
                        invocation::ssh_command(ctx.platform, &ctx.ssh_executable, &key_file);
                    mapping.insert(GIT_SSH_COMMAND, command);
                }
                InvocationStrategy::WrapperScript => {
                    let script =
                        invocation::wrapper_script(ctx.platform, &ctx.ssh_executable, &key_file);
                    let script_file = write_restricted(
                        workspace,
                        "ssh",
                        script.suffix,
                        script.body.as_bytes(),
                        SCRIPT_FILE_MODE,
                    )?;
                    debug!(path = %script_file.display(), "wrote ssh wrapper script");
                    mapping.insert(GIT_SSH, script_file.to_string_lossy());
                }
            }

            info!(
                credential = self.credential.id(),
                ?strategy,
                platform = ?ctx.platform,
                "bound ssh private key"
            );
            Ok(mapping)
        })
    }
}
