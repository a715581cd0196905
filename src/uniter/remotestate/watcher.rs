use super::Snapshot;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::watch;

/// Source of remote state for the resolver loop.
pub trait Watcher: Send {
    /// Latest known remote state. Never blocks.
    fn snapshot(&self) -> Snapshot;

    /// Resolves once the remote state has changed since the last call.
    /// Bursts of changes may be reported once. Resolves to `false` when the
    /// source has shut down and no further changes will arrive.
    fn remote_state_changed(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// [`Watcher`] fed through a `tokio::sync::watch` channel.
#[derive(Debug, Clone)]
pub struct ChannelWatcher {
    rx: watch::Receiver<Snapshot>,
}

/// Create a watcher together with the sender that publishes new snapshots.
pub fn channel(initial: Snapshot) -> (watch::Sender<Snapshot>, ChannelWatcher) {
    let (tx, rx) = watch::channel(initial);
    (tx, ChannelWatcher { rx })
}

impl Watcher for ChannelWatcher {
    fn snapshot(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    fn remote_state_changed(&mut self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { self.rx.changed().await.is_ok() })
    }
}
