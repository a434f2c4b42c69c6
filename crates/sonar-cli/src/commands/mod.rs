mod chart;
mod chat;
mod status;
mod transcribe;

use std::sync::Arc;

use sonar_core::{Credentials, MarketDataSource, PolygonAdapter, ReqwestHttpClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let credentials = Credentials::from_env();
    log::debug!("credentials: {credentials:?}");

    match &cli.command {
        Command::Chart(args) => chart::run(args, polygon(&credentials), cli.pretty).await,
        Command::Status(args) => status::run(args, polygon(&credentials), cli.pretty).await,
        Command::Chat(args) => chat::run(args, &credentials).await,
        Command::Transcribe(args) => transcribe::run(args, &credentials, cli.pretty).await,
    }
}

fn polygon(credentials: &Credentials) -> Arc<dyn MarketDataSource> {
    Arc::new(PolygonAdapter::new(
        Arc::new(ReqwestHttpClient::new()),
        credentials.polygon.clone(),
    ))
}
