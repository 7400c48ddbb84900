use anyhow::Result;
use clap::{Parser, Subcommand};
use jackblog_backend::config::BlogConfig;
use jackblog_backend::{api, bootstrap, telemetry, utils};

#[derive(Parser)]
#[command(author, version, about = "Jackblog comment backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for the comment API
    Serve,
    /// Create the data directories and apply database migrations, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    utils::print_banner();

    let args = Args::parse();

    let config = BlogConfig::from_env()?;
    let resources = bootstrap::initialize(&config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, resources.database).await,
        Command::Migrate => {
            tracing::info!(
                database_initialized = resources.database_initialized,
                "migrations applied"
            );
            Ok(())
        }
    }
}
