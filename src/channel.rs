use serde::Serialize;
use tokio::sync::watch;

use crate::system::snapshot::UsageSnapshot;

/// What the listener receives on every sampling tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Update {
    #[serde(flatten)]
    pub snapshot: UsageSnapshot,
    /// Load is still being built up toward its target.
    pub loading: bool,
    pub simulating: bool,
}

/// Single-listener, latest-value delivery of [`Update`]s.
///
/// Registering a listener disconnects the previous one. A listener that
/// falls behind only ever sees the newest update.
#[derive(Default)]
pub struct UpdateChannel {
    tx: Option<watch::Sender<Option<Update>>>,
}

impl UpdateChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self) -> Listener {
        let (tx, rx) = watch::channel(None);
        // Dropping the old sender closes the previous listener.
        self.tx = Some(tx);
        Listener { rx }
    }

    pub fn has_listener(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.receiver_count() > 0)
    }

    /// Returns `false` when nobody is listening; the update is dropped.
    pub fn publish(&self, update: Update) -> bool {
        match &self.tx {
            Some(tx) if tx.receiver_count() > 0 => {
                tx.send_replace(Some(update));
                true
            }
            _ => false,
        }
    }
}

pub struct Listener {
    rx: watch::Receiver<Option<Update>>,
}

impl Listener {
    /// Waits for the next update. `None` once the channel has moved on to
    /// another listener or was dropped.
    pub async fn next(&mut self) -> Option<Update> {
        self.rx.changed().await.ok()?;
        *self.rx.borrow_and_update()
    }

    pub fn latest(&self) -> Option<Update> {
        *self.rx.borrow()
    }
}
