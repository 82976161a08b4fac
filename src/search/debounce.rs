use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-debounce handle: at most one scheduled action is pending, and
/// scheduling again cancels the previous one before its delay elapses.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending action and schedules `action` to run after
    /// `delay` of quiet.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn only_last_scheduled_action_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        for _ in 0..3 {
            let fired = fired.clone();
            debouncer.schedule(Duration::from_millis(700), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_the_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new();

        let counter = fired.clone();
        debouncer.schedule(Duration::from_millis(700), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
