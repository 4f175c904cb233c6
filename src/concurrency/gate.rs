//! Bound on simultaneous external lookups

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many external lookups run at the same time.
///
/// A limit of zero disables the bound entirely. Waiters are admitted in no
/// particular order; only the bound itself is guaranteed.
#[derive(Clone)]
pub struct ConcurrencyGate {
    permits: Option<Arc<Semaphore>>,
}

impl ConcurrencyGate {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: (limit > 0).then(|| Arc::new(Semaphore::new(limit))),
        }
    }

    /// Waits until a slot is free and returns a ticket held for the duration
    /// of the lookup. `None` when the gate is unbounded.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .expect("gate semaphore closed"),
            ),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;

    #[tokio::test]
    async fn bounded_gate_never_exceeds_the_limit() {
        let gate = ConcurrencyGate::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let gate = gate.clone();
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let _ticket = gate.acquire().await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        });

        join_all(tasks).await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_limit_gate_is_unbounded() {
        let gate = ConcurrencyGate::new(0);
        assert!(gate.acquire().await.is_none());
    }

    #[tokio::test]
    async fn ticket_release_admits_a_waiter() {
        let gate = ConcurrencyGate::new(1);
        let first = gate.acquire().await;
        drop(first);
        // Completes only if the first ticket was actually released
        let _second = gate.acquire().await;
    }
}
