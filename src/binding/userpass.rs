use super::{
    apply_prompt_flags, bind_with, write_restricted, BindContext, BoundEnvironment,
    EnvironmentMapping, GitCredentialBinding, GCM_INTERACTIVE, GIT_ASKPASS, GIT_PASSWORD,
    GIT_TERMINAL_PROMPT, GIT_USERNAME,
};
use crate::credential::UsernamePassword;
use crate::error::Result;
use crate::invocation::{self, SCRIPT_FILE_MODE};
use crate::workspace::Workspace;
use tracing::{debug, info};

/// Binds a username and password for git over HTTPS through `GIT_ASKPASS`.
///
/// The askpass script reads the answers from `GIT_USERNAME` and
/// `GIT_PASSWORD`, so the password exists only in the child environment.
#[derive(Debug)]
pub struct UsernamePasswordBinding {
    credential: UsernamePassword,
}

impl UsernamePasswordBinding {
    pub fn new(credential: UsernamePassword) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &UsernamePassword {
        &self.credential
    }
}

impl GitCredentialBinding for UsernamePasswordBinding {
    fn variables(&self) -> Vec<&'static str> {
        vec![
            GIT_USERNAME,
            GIT_PASSWORD,
            GIT_TERMINAL_PROMPT,
            GCM_INTERACTIVE,
            GIT_ASKPASS,
        ]
    }

    fn bind(&self, workspace: Box<dyn Workspace>, ctx: &BindContext) -> Result<BoundEnvironment> {
        bind_with(workspace, |workspace| {
            let mut mapping = EnvironmentMapping::new();
            mapping.insert(GIT_USERNAME, self.credential.username());
            mapping.insert_sensitive(GIT_PASSWORD, self.credential.password());
            apply_prompt_flags(&mut mapping, ctx);

            let script = invocation::askpass_script(ctx.platform, GIT_USERNAME, GIT_PASSWORD);
            let script_file = write_restricted(
                workspace,
                "askpass",
                script.suffix,
                script.body.as_bytes(),
                SCRIPT_FILE_MODE,
            )?;
            debug!(path = %script_file.display(), "wrote askpass script");
            mapping.insert(GIT_ASKPASS, script_file.to_string_lossy());

            info!(credential = self.credential.id(), "bound username/password");
            Ok(mapping)
        })
    }
}
