use std::sync::Arc;
use tokio::sync::watch;

/// Shared signal that stops a run before its next item. Clones observe the
/// same signal.
#[derive(Debug, Clone)]
pub struct RunCancellation {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for RunCancellation {
    fn default() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }
}

impl RunCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `cancel` has been called on any clone
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        while !*receiver.borrow_and_update() {
            // The sender lives as long as `self`
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}
