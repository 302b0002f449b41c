use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "screenshot-etl")]
#[command(about = "Extract profile cards from screenshots and append them to a sheet")]
pub struct Cli {
    /// TOML configuration file; environment variables are used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Accept screenshot uploads over HTTP
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Process one local image in the foreground
    Extract {
        image: PathBuf,

        /// Append to this CSV file instead of the configured sink
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
}
