use std::future::pending;

use tokio::sync::watch;

/// Caller side of a cancellation pair.
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Pipeline side of a cancellation pair. Cheap to clone; every clone observes the same cancel.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>
}

impl CancellationToken {
    pub fn pair() -> (CancellationHandle, CancellationToken) {
        let (sender, receiver) = watch::channel(false);
        (CancellationHandle { sender }, CancellationToken { receiver })
    }

    /// A token nobody can cancel.
    #[cfg(test)]
    pub fn never() -> Self {
        let (_, token) = Self::pair();
        token
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();

        loop {
            if *receiver.borrow_and_update() {
                return;
            }

            if receiver.changed().await.is_err() {
                pending::<()>().await;
            }
        }
    }
}
