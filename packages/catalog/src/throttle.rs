//! Rate-limited processing of a batch of work items.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};

/// Runs at most `concurrency` items at a time and pauses `pause` after
/// each one before its slot is reused.
///
/// With the defaults (one at a time, 100 ms) a batch of deletions reaches
/// the backend as a slow, strictly sequential trickle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub concurrency: usize,
    pub pause: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            concurrency: 1,
            pause: Duration::from_millis(100),
        }
    }
}

impl Throttle {
    pub fn new(concurrency: usize, pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            pause,
        }
    }

    /// Apply `work` to every item. Results come back in input order.
    pub async fn run<I, T, F, Fut, R>(&self, items: I, work: F) -> Vec<R>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let pause = self.pause;
        let work = &work;
        stream::iter(items)
            .map(|item| async move {
                let result = work(item).await;
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                result
            })
            .buffered(self.concurrency.max(1))
            .collect()
            .await
    }
}
