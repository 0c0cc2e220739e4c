use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use refer_earn::config::ReferConfig;
use refer_earn::logging;

mod cmd;

#[derive(Parser)]
#[command(name = "refer-earn")]
#[command(version, about = "Refer a friend to a course and earn a reward")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to refer.toml (defaults to ./refer.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL. Overrides refer.toml and REFER_BACKEND_URL.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify your email and refer a friend
    Refer,
    /// List accepted course and relationship values
    Options,
    /// Run an in-memory backend for local development
    Sandbox {
        /// Host to bind (default from refer.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on (default from refer.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Allow cross-origin requests from any origin
        #[arg(long)]
        cors: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default refer.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let serving = matches!(cli.command, Commands::Sandbox { .. });
    logging::init(logging::default_directive(cli.verbose, serving), cli.log_json);

    match &cli.command {
        Commands::Refer => {
            let config = ReferConfig::load(cli.config.as_deref(), cli.backend_url.as_deref())?;
            cmd::cmd_refer(&config).await?;
        }
        Commands::Options => cmd::cmd_options(),
        Commands::Sandbox { host, port, cors } => {
            let config = ReferConfig::load(cli.config.as_deref(), cli.backend_url.as_deref())?;
            cmd::cmd_sandbox(&config, host.as_deref(), *port, *cors).await?;
        }
        Commands::Config { command } => cmd::cmd_config(
            cli.config.as_deref(),
            cli.backend_url.as_deref(),
            command.clone(),
        )?,
    }

    Ok(())
}
