use std::{path::PathBuf, process::ExitCode};

use api::Config;
use clap::{Args, Parser, Subcommand, ValueEnum};
use types::Role;
use url::Url;

mod commands;

#[derive(Parser)]
#[command(
    name = "complaints-admin",
    version,
    about = "Admin client for the municipal complaint service"
)]
struct Cli {
    /// Base URL of the complaint service. Overrides the config file and COMPLAINTS_API_URL.
    #[arg(long, global = true)]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a session check against the service and print its answer.
    ///
    /// Cookies are kept in memory only, so a fresh process carries no session
    /// and this reports "not signed in" unless the service says otherwise. Use
    /// it to check that the service is reachable and answering.
    Whoami,
    /// Sign in and print the admin dashboard.
    Dashboard(LoginArgs),
    /// Sign in and write all complaints to a CSV file.
    Export {
        #[command(flatten)]
        login: LoginArgs,
        /// File or directory to write to. Defaults to the current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "COMPLAINTS_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, value_enum, default_value_t = RoleArg::Admin)]
    role: RoleArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

fn load_config(api_url: Option<Url>) -> types::Result<Config> {
    match api_url {
        Some(url) => Ok(Config::load()
            .map(|config| config.with_api_url(url.clone()))
            .unwrap_or_else(|_| Config::new(url))),
        None => Config::load().map_err(|error| error.context("failed to load configuration")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    api::init_tracing();
    let cli = Cli::parse();

    let result = match load_config(cli.api_url) {
        Ok(config) => commands::run(config, cli.command).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(?error, "command failed");
            eprintln!("error: {}", error.chain().join(": "));
            ExitCode::FAILURE
        }
    }
}
