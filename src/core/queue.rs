use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Shared queue of pending units of work.
///
/// `pending` counts items pushed but not yet completed, so an empty queue
/// with in-flight items keeps idle workers waiting for more work instead of
/// exiting early.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    pending: AtomicUsize,
    notify: Notify,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            pending: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, item: T) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.notify.notify_one();
    }

    /// Marks one popped item as finished.
    pub fn complete(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn try_pop(&self) -> Option<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Waits for the next item. Returns `None` once all work is done or the
    /// token is cancelled.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<T> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if self.pending() == 0 {
                // Wake the other idle workers so they observe the drain too.
                self.notify.notify_waiters();
                return None;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn drains_and_terminates() {
        let queue = WorkQueue::new();
        let cancel = CancellationToken::new();
        queue.push(1);
        queue.push(2);

        assert_eq!(queue.next(&cancel).await, Some(1));
        queue.complete();
        assert_eq!(queue.next(&cancel).await, Some(2));
        queue.complete();
        assert_eq!(queue.next(&cancel).await, None);
    }

    #[tokio::test]
    async fn waits_for_in_flight_work() {
        let queue = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();
        queue.push(1);
        let first = queue.next(&cancel).await;
        assert_eq!(first, Some(1));

        let waiter = {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.next(&cancel).await })
        };

        // The in-flight item spawns a child before completing.
        tokio::task::yield_now().await;
        queue.push(2);
        queue.complete();

        assert_eq!(waiter.await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn cancellation_stops_waiting() {
        let queue: Arc<WorkQueue<u32>> = Arc::new(WorkQueue::new());
        let cancel = CancellationToken::new();
        queue.push(1);
        let _ = queue.next(&cancel).await;

        let waiter = {
            let queue = Arc::clone(&queue);
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.next(&cancel).await })
        };
        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), None);
    }
}
