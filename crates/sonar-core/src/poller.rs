//! Recurring market status refresh with an explicit start/stop lifecycle.
//!
//! [`MarketStatusPoller::start`] spawns a tokio task that polls immediately and then
//! once per interval. State is published through a `watch` channel as a
//! [`MarketStatusView`]; readers never block the poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::STATUS_POLL_INTERVAL;
use crate::{MarketDataSource, MarketStatusSnapshot, UtcDateTime};

/// Shortest accepted poll period; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What readers of the poller see.
///
/// A fresh error and the last good snapshot can be present at the same time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketStatusView {
    pub snapshot: Option<Arc<MarketStatusSnapshot>>,
    pub error: Option<String>,
    /// Wall-clock time of the last successful refresh.
    pub last_success: Option<UtcDateTime>,
    /// Completed polls, successful or not.
    pub attempts: u64,
}

impl MarketStatusView {
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && self.snapshot.is_some()
    }
}

pub struct MarketStatusPoller {
    source: Arc<dyn MarketDataSource>,
    interval: Duration,
}

impl MarketStatusPoller {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            interval: STATUS_POLL_INTERVAL,
        }
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the polling task. Must be called from within a tokio runtime.
    pub fn start(self) -> PollerHandle {
        let (sender, receiver) = watch::channel(MarketStatusView::default());
        let source = self.source;
        let period = self.interval;

        log::debug!(
            "starting market status poller for {} every {:?}",
            source.name(),
            period
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                poll_once(source.as_ref(), &sender).await;
            }
        });

        PollerHandle {
            task: Some(task),
            view: receiver,
        }
    }
}

/// Run a single poll and publish the result.
pub async fn poll_once(source: &dyn MarketDataSource, sender: &watch::Sender<MarketStatusView>) {
    let result = source.market_status().await;
    sender.send_modify(|view| {
        view.attempts += 1;
        match result {
            Ok(snapshot) => {
                log::debug!("market status refreshed: market {}", snapshot.market);
                view.snapshot = Some(Arc::new(snapshot));
                view.error = None;
                view.last_success = Some(UtcDateTime::now());
            }
            Err(error) => {
                log::warn!("market status poll failed: {error}");
                view.error = Some(error.message().to_owned());
            }
        }
    });
}

/// Owner of a running poller. Dropping the handle stops the poller.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
    view: watch::Receiver<MarketStatusView>,
}

impl PollerHandle {
    /// Latest published state.
    pub fn current(&self) -> MarketStatusView {
        self.view.borrow().clone()
    }

    /// Independent receiver for change notifications.
    pub fn subscribe(&self) -> watch::Receiver<MarketStatusView> {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the timer task. No poll starts after this returns.
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("market status poller stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
