mod check_config_cmd;
mod commands_cmd;
mod console;
mod dispatch_cmd;
mod runtime;
mod serve_cmd;
mod storage_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use dispatch_cmd::DispatchArgs;
use runtime::Runtime;

#[derive(Parser)]
#[command(name = "kippo")]
#[command(about = "Kippo: attendance and project status over Slack slash commands")]
#[command(version)]
struct Cli {
    /// Directory holding config.yaml (default: $KIPPO_CONFIG_DIR or ~/.kippo)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log filter, overriding logging.level from the config
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the slash command HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one slash command locally and print the Slack output
    Dispatch {
        /// Organization name (default: the first configured)
        #[arg(long = "org")]
        organization: Option<String>,
        /// Slack username issuing the command
        #[arg(long = "user")]
        slack_username: String,
        /// Channel the command is issued from
        #[arg(long, default_value = "general")]
        channel: String,
        /// Command text, e.g. `clock-in 09:30`
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// List sub-commands and their aliases
    Commands,
    /// Create the bucket that holds database dumps
    CreateBuckets,
    /// Dump the database to the object store
    Dump,
    /// Load a database dump from the object store
    Load {
        /// Object key; defaults to the newest dump
        #[arg(long)]
        key: Option<String>,
    },
    /// Validate config.yaml and print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.unwrap_or_else(kippo_config::config_dir);
    let runtime = Runtime::load(config_dir, cli.log_level.as_deref()).await?;

    match cli.command {
        Commands::Serve { port } => serve_cmd::run(runtime, port).await?,
        Commands::Dispatch {
            organization,
            slack_username,
            channel,
            text,
        } => {
            let args = DispatchArgs {
                organization,
                slack_username,
                channel,
                text,
            };
            dispatch_cmd::run(runtime, args).await?;
        }
        Commands::Commands => commands_cmd::run(&runtime)?,
        Commands::CreateBuckets => storage_cmd::create_buckets(&runtime).await?,
        Commands::Dump => {
            storage_cmd::dump(&runtime).await?;
        }
        Commands::Load { key } => {
            storage_cmd::load(&runtime, key).await?;
        }
        Commands::CheckConfig => {
            if let Err(e) = check_config_cmd::run(&runtime) {
                terminal_output::note_error(&e.to_string());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
