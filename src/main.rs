use clap::Parser;
use tracing_subscriber::EnvFilter;

use schoolhub::cli::{AdminCommands, Cli, Commands, run_init, run_serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("schoolhub=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                admin_email,
                non_interactive,
            } => {
                run_init(data_dir, admin_email, non_interactive)?;
            }
        },
        Commands::Serve(args) => {
            run_serve(args).await?;
        }
    }

    Ok(())
}
