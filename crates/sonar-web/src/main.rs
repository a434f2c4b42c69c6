use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sonar_core::{Credentials, MarketDataSource, MarketStatusPoller, PolygonAdapter, ReqwestHttpClient};
use sonar_web::AppState;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "sonar-web", version, about = "Serve the sonar chat, transcription and market data API")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("sonar-web failed: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> std::io::Result<()> {
    let credentials = Credentials::from_env();
    log::info!("credentials: {credentials:?}");

    let polygon: Arc<dyn MarketDataSource> = Arc::new(PolygonAdapter::new(
        Arc::new(ReqwestHttpClient::new()),
        credentials.polygon.clone(),
    ));
    let poller = MarketStatusPoller::new(Arc::clone(&polygon)).start();
    let state = AppState::from_credentials(&credentials, polygon, poller.subscribe());

    let listener = TcpListener::bind(args.listen).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, sonar_web::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.stop();
    log::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        log::warn!("cannot listen for ctrl-c: {error}");
        std::future::pending::<()>().await;
    }
}
