use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "schoolhub")]
#[command(about = "Multi-tenant school website platform", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve(ServeArgs),
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the database and the platform admin account
    Init {
        /// Data directory for the database
        #[arg(long, env = "SCHOOLHUB_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Email of the platform admin
        #[arg(long, default_value = "admin@schoolhub.local")]
        admin_email: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

/// Flags override values from the config file; unset flags keep them.
#[derive(Args, Default)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(long, env = "SCHOOLHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Data directory for the database
    #[arg(long, env = "SCHOOLHUB_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Parent domain of school subdomains (e.g. "schoolhub.site")
    #[arg(long, env = "SCHOOLHUB_PUBLIC_HOST_SUFFIX")]
    pub public_host_suffix: Option<String>,

    #[arg(long, env = "RAZORPAY_KEY_ID")]
    pub razorpay_key_id: Option<String>,

    #[arg(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    pub razorpay_key_secret: Option<String>,

    #[arg(long, env = "RAZORPAY_WEBHOOK_SECRET", hide_env_values = true)]
    pub razorpay_webhook_secret: Option<String>,

    #[arg(long, env = "RAZORPAY_API_BASE")]
    pub razorpay_api_base: Option<String>,
}
