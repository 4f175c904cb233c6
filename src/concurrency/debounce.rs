//! Burst-coalescing trigger for recomputation work
//!
//! Not a work queue and not classic debouncing: the first call of a burst
//! always runs (immediately or after `wait`), and calls arriving while a
//! unit is in flight overwrite a single pending slot, so only the most
//! recent arguments survive. At most one unit is ever in flight.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::sleep;

type Work<A> = Box<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

enum TriggerState<A> {
    Idle,
    /// A driver task owns the trigger; `next` holds the coalesced arguments
    /// it should run next, if any.
    Running { next: Option<A> },
}

struct TriggerInner<A> {
    state: Mutex<TriggerState<A>>,
    wait: Option<Duration>,
    delay: Option<Duration>,
    work: Work<A>,
}

pub struct DebouncedTrigger<A> {
    inner: Arc<TriggerInner<A>>,
}

impl<A: Send + 'static> DebouncedTrigger<A> {
    /// `wait` delays the first run of a fresh burst; `delay` separates a
    /// completed run from the coalesced pending one.
    pub fn new(
        wait: Option<Duration>,
        delay: Option<Duration>,
        work: impl Fn(A) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(TriggerInner {
                state: Mutex::new(TriggerState::Idle),
                wait,
                delay,
                work: Box::new(work),
            }),
        }
    }

    /// Request a run with `args`. While a unit is in flight (or armed during
    /// `wait`), the arguments overwrite the pending slot instead of queueing.
    pub fn call(&self, args: A) {
        let mut state = self.inner.state.lock().expect("trigger state poisoned");
        match &mut *state {
            TriggerState::Idle => {
                *state = TriggerState::Running { next: Some(args) };
                drop(state);
                let inner = Arc::clone(&self.inner);
                tokio::spawn(drive(inner));
            }
            TriggerState::Running { next } => *next = Some(args),
        }
    }
}

/// Driver loop: runs coalesced units until the pending slot stays empty,
/// then returns the trigger to idle. An explicit loop, not self-invocation.
async fn drive<A: Send + 'static>(inner: Arc<TriggerInner<A>>) {
    if let Some(wait) = inner.wait {
        sleep(wait).await;
    }
    loop {
        let args = {
            let mut state = inner.state.lock().expect("trigger state poisoned");
            match &mut *state {
                TriggerState::Running { next } => match next.take() {
                    Some(args) => args,
                    None => {
                        *state = TriggerState::Idle;
                        return;
                    }
                },
                TriggerState::Idle => return,
            }
        };
        (inner.work)(args).await;
        if let Some(delay) = inner.delay {
            sleep(delay).await;
        }
    }
}
