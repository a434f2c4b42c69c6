use std::sync::Arc;

use sonar_core::{MarketDataSource, MarketStatusPoller};

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output;

pub async fn run(args: &StatusArgs, source: Arc<dyn MarketDataSource>, pretty: bool) -> Result<(), CliError> {
    if !args.watch {
        let snapshot = source.market_status().await?;
        return output::render(&snapshot, pretty);
    }

    let poller = MarketStatusPoller::new(source);
    log::info!("watching market status every {:?}, Ctrl-C to stop", poller.interval());
    let handle = poller.start();
    let mut updates = handle.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                output::render(&output::status_view(&view)?, false)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop();
    Ok(())
}
