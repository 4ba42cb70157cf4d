use clap::Parser;
use proration_api::cli::{self, Cli, Command};
use proration_api::config::ProrationConfig;
use proration_api::create_app;
use proration_api::tracing_setup::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProrationConfig::from_path(path)?,
        None => ProrationConfig::load()?,
    }
    .apply_profile();
    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment.env_type,
        "Starting proration service"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => start_server(config).await,
        Command::Prorate { input, pretty, summary } => {
            let json = cli::read_request(input.as_ref())?;
            let run = cli::prorate_json(&json, &config.limits)?;
            println!("{}", cli::render_allocations(&run, pretty)?);
            if summary {
                eprintln!("{}", cli::summarize(&run));
            }
            Ok(())
        }
        Command::Example => {
            println!("{}", cli::example_json()?);
            Ok(())
        }
        Command::Explain => {
            println!("{}", cli::EXPLANATION);
            Ok(())
        }
    }
}

async fn start_server(config: ProrationConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let app = create_app(config)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "Proration server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Proration server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
