use clap::{Parser, Subcommand};

/// market-notify: marketplace notifications from the command line
#[derive(Parser)]
#[command(name = "market-notify", version, about)]
pub struct Cli {
    /// API base URL (overrides MARKET_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "MARKET_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll notifications and print changes until interrupted
    Watch {
        /// Signed-in user id; polling only runs when one is known
        #[arg(long, default_value = "me")]
        user: String,
    },

    /// Print one page of notifications
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Also fetch every following page
        #[arg(long)]
        all: bool,
    },

    /// Mark a notification as read
    Read { id: String },

    /// Delete a notification
    Delete { id: String },

    /// Delete every notification of the signed-in user
    Clear,

    /// Create a notification (mostly useful against a dev backend)
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        content: String,
        #[arg(long = "type", default_value = "system")]
        notification_type: String,
        /// JSON object attached as metadata
        #[arg(long)]
        metadata: Option<String>,
    },
}
