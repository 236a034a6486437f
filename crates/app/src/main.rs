use anyhow::Context;
use app::config::{Cli, Command, prepare_sqlite_file};
use clap::Parser;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_filter).context("invalid log filter")?)
        .init();

    let db_url = cli.database_url();
    prepare_sqlite_file(&db_url)?;

    let clock = Clock::system();
    let services = AppServices::new_sqlite(&db_url, clock, &cli.certificate_base_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;

    match cli.command() {
        Command::Serve => serve(cli, services).await,
        Command::Seed => {
            let report = app::seed::seed_catalog(&services, clock).await?;
            println!(
                "seeded {} categories, {} courses, {} lessons, {} webinars",
                report.categories, report.courses, report.lessons, report.webinars
            );
            Ok(())
        }
    }
}

async fn serve(cli: Cli, services: AppServices) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "lms api listening");

    axum::serve(listener, app::router(services))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("lms api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
