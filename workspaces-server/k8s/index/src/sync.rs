use crate::Error;
use futures::prelude::*;
use kube::runtime::watcher;
use tokio::{
    sync::watch,
    time::{self, Duration, Instant},
};

/// Tracks whether each watched kind has completed its initial listing.
#[derive(Debug, Default)]
pub struct SyncTracker {
    pending: Vec<(&'static str, watch::Receiver<bool>)>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a watch event stream so that the tracker observes the end of its
    /// initial listing.
    pub fn track<T, S>(&mut self, kind: &'static str, events: S) -> impl Stream<Item = S::Item>
    where
        S: Stream<Item = watcher::Event<T>>,
    {
        let (tx, rx) = watch::channel(false);
        self.pending.push((kind, rx));
        events.inspect(move |ev| {
            if matches!(ev, watcher::Event::InitDone) && !*tx.borrow() {
                tracing::info!(kind, "Initial sync complete");
                tx.send_replace(true);
            }
        })
    }

    /// Waits for every tracked kind to complete its initial listing.
    ///
    /// Fails if any kind does not complete within `timeout`. There is no
    /// retry; the caller decides whether to restart.
    pub async fn wait(self, timeout: Duration) -> Result<(), Error> {
        let deadline = Instant::now() + timeout;
        for (kind, mut rx) in self.pending {
            match time::timeout_at(deadline, rx.wait_for(|synced| *synced)).await {
                Ok(Ok(_)) => {}
                Ok(Err(_)) => return Err(Error::WatchClosed { kind }),
                Err(_) => return Err(Error::SyncTimeout { kind, timeout }),
            }
        }
        Ok(())
    }
}
