//! Billboard server runner. Run as a command-line tool.

use bb_server::serve::ServeCommand;
use clap::{Args as ClapArgs, Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}
#[derive(Debug, Subcommand)]
#[command(about)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeCommand),
    /// Store a new admin password, replacing the current one.
    SetPassword(SetPasswordCommand),
}

#[derive(Debug, ClapArgs)]
pub struct SetPasswordCommand {
    #[arg(short = 'c', long = "config", env = "BB_CFG_FILE")]
    config: Option<PathBuf>,
    #[arg(long, env = "BB_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

async fn set_password(cmd: SetPasswordCommand) -> miette::Result<()> {
    let config = bb_server::config::load_configuration(cmd.config.as_deref())?;
    bb_server::serve::init_tracing(&config.log.filter);
    let catalog = bb_server::serve::catalog_from_config(&config.database).await?;
    let service = bb_server::serve::service_from_config(&config, catalog);
    service
        .set_admin_password(&cmd.password)
        .await
        .into_diagnostic()
        .wrap_err("failed to store admin password")?;
    tracing::info!("admin password updated");
    Ok(())
}

impl Command {
    async fn run(self) -> miette::Result<()> {
        match self {
            Command::Serve(serve_cmd) => bb_server::serve::serve(serve_cmd).await,
            Command::SetPassword(cmd) => set_password(cmd).await,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli_args = Args::parse();

    if let Err(e) = cli_args.command.run().await {
        eprintln!("Failed to run command:\n{e:?}");
        std::process::exit(1);
    }
}
