use tokio::sync::watch;

/// Caller-side handle that stops an in-flight pipeline.
#[derive(Debug)]
pub struct CancellationTrigger {
    sender: watch::Sender<bool>,
}

impl CancellationTrigger {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Pipeline-side view of a cancellation request. Cheap to clone into tasks.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: watch::Receiver<bool>,
}

pub fn cancellation() -> (CancellationTrigger, CancellationSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancellationTrigger { sender }, CancellationSignal { receiver })
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = cancellation();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the trigger
    /// was dropped without firing.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
