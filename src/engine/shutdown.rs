use std::sync::Arc;
use tokio::sync::watch;

/// Session-scoped cancellation. Cancelling is sticky and may be repeated.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        // send_replace succeeds even when every signal has been dropped
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to each task of a session.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the session is cancelled. Never resolves if the
    /// `Shutdown` is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_cancel_wakes_every_signal() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.signal();
        let mut b = shutdown.signal();

        let waiter = tokio::spawn(async move { a.cancelled().await });
        shutdown.cancel();

        waiter.await.unwrap();
        timeout(Duration::from_millis(50), b.cancelled()).await.unwrap();
        assert!(b.is_cancelled());
    }

    #[tokio::test]
    async fn test_signal_created_after_cancel_is_cancelled() {
        let shutdown = Shutdown::new();
        shutdown.cancel();
        shutdown.cancel();

        let mut late = shutdown.signal();
        timeout(Duration::from_millis(50), late.cancelled()).await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_shutdown_never_cancels() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.signal();
        drop(shutdown);

        let result = timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
