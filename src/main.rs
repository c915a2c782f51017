use clap::{Args, Parser, Subcommand};
use git_credential_bind::commands::{self, SecretSource};
use git_credential_bind::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "git-credential-bind")]
#[command(version)]
#[command(about = "Bind SSH keys and passwords to a single git run", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command with an SSH private key bound for git
    Ssh {
        /// Private key file (OpenSSH or PEM)
        #[arg(short, long)]
        key_file: PathBuf,

        /// Read the key passphrase from this environment variable
        #[arg(long, value_name = "VAR", conflicts_with = "ask_passphrase")]
        passphrase_env: Option<String>,

        /// Prompt for the key passphrase
        #[arg(long)]
        ask_passphrase: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run a command with a username and password bound for git over HTTPS
    Userpass {
        #[arg(short, long)]
        username: String,

        /// Read the password from this environment variable
        #[arg(long, value_name = "VAR", conflicts_with = "ask_password")]
        password_env: Option<String>,

        /// Prompt for the password
        #[arg(long)]
        ask_password: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the encoding of a private key file (openssh or pem)
    Detect {
        key_file: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Parent directory for the scratch workspace
    #[arg(short, long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Command to run, usually git
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

fn secret_source(env: Option<String>, ask: bool) -> SecretSource {
    match (env, ask) {
        (Some(var), _) => SecretSource::Env(var),
        (None, true) => SecretSource::Prompt,
        (None, false) => SecretSource::None,
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("GIT_CREDENTIAL_BIND_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("git_credential_bind=debug")
        } else {
            EnvFilter::new("git_credential_bind=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    match run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Ssh {
            key_file,
            passphrase_env,
            ask_passphrase,
            run,
        } => commands::ssh(
            &key_file,
            &secret_source(passphrase_env, ask_passphrase),
            run.workspace.as_deref(),
            &run.command,
        ),
        Commands::Userpass {
            username,
            password_env,
            ask_password,
            run,
        } => commands::userpass(
            &username,
            &secret_source(password_env, ask_password),
            run.workspace.as_deref(),
            &run.command,
        ),
        Commands::Detect { key_file } => commands::detect(&key_file).map(|()| 0),
    }
}
