use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lavka")]
#[command(author, version, about = "Multi-tenant Telegram storefront bot runtime", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the fleet: poll desired state and keep tenant bots alive
    Run {
        /// Override the desired-state poll interval, in seconds
        #[arg(long)]
        poll_interval: Option<u64>,
    },

    /// Fetch the desired state once and print it (connectivity check)
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
