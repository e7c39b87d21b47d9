//! # Connection status cell.
//!
//! [`ConnectionStatus`] lives in a [`tokio::sync::watch`] channel: writes are
//! serialized by the channel, readers take cheap snapshots or await a transition
//! (the health check waits for `Offline`, the receive loop for `Online`).

use tokio::sync::watch;

/// Whether the session currently holds a usable connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    Online,
    #[default]
    Offline,
}

impl ConnectionStatus {
    #[inline]
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }
}

pub(crate) struct StatusCell {
    tx: watch::Sender<ConnectionStatus>,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionStatus::Offline);
        Self { tx }
    }

    pub(crate) fn get(&self) -> ConnectionStatus {
        *self.tx.borrow()
    }

    /// Stores `status`; returns `true` if it differs from the previous value.
    pub(crate) fn set(&self, status: ConnectionStatus) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        })
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.tx.subscribe()
    }
}

/// Waits until the observed status satisfies `want`; `false` if the cell is gone.
pub(crate) async fn wait_until(
    rx: &mut watch::Receiver<ConnectionStatus>,
    want: impl FnMut(&ConnectionStatus) -> bool,
) -> bool {
    rx.wait_for(want).await.is_ok()
}
