//! Countdown latch built on a watch channel

use tokio::sync::watch;

/// A countdown that waiters can await reaching zero
#[derive(Debug)]
pub struct CountDownLatch {
    remaining: watch::Sender<usize>,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        let (remaining, _) = watch::channel(count);
        Self { remaining }
    }

    /// Decrement by one, saturating at zero. Returns the new count.
    pub fn count_down(&self) -> usize {
        let mut now = 0;
        self.remaining.send_modify(|n| {
            *n = n.saturating_sub(1);
            now = *n;
        });
        now
    }

    /// Current count
    pub fn count(&self) -> usize {
        *self.remaining.borrow()
    }

    /// Wait until the count reaches zero
    pub async fn wait(&self) {
        let mut rx = self.remaining.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}
