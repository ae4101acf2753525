//! Token-bucket-ish rate limiter throttling outbound product-catalog
//! lookups (spec.md §4.9.1).
//!
//! Construction immediately emits one full batch of tokens, then a
//! background task refills `max_requests` tokens every `interval`.
//! Tokens never accumulate past `max_requests`: the refill uses
//! `try_send` into a channel bounded to that capacity, so a batch that
//! lands on a still-full channel is silently dropped rather than queued.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct RateLimiter {
    rx: tokio::sync::Mutex<mpsc::Receiver<()>>,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    pub fn new(interval: Duration, max_requests: usize) -> Self {
        let (tx, rx) = mpsc::channel(max_requests.max(1));
        run_batch(&tx, max_requests);

        let refill = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // interval's first tick fires immediately; skip it, the batch above already ran
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    return;
                }
                run_batch(&tx, max_requests);
            }
        });

        Self {
            rx: tokio::sync::Mutex::new(rx),
            refill,
        }
    }

    /// Blocks until one token is available.
    pub async fn wait(&self) {
        let mut rx = self.rx.lock().await;
        let _ = rx.recv().await;
    }

    /// Stops the refill timer and closes the channel; pending [`wait`]
    /// callers observe a closed channel rather than hanging forever.
    pub fn shutdown(&self) {
        self.refill.abort();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

fn run_batch(tx: &mpsc::Sender<()>, max_requests: usize) {
    for _ in 0..max_requests {
        if tx.try_send(()).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_initial_batch_without_waiting_for_interval() {
        let lim = RateLimiter::new(Duration::from_secs(10), 3);
        for _ in 0..3 {
            tokio::time::timeout(Duration::from_millis(10), lim.wait())
                .await
                .expect("token should be available immediately");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refills_on_each_interval_tick() {
        let lim = RateLimiter::new(Duration::from_secs(1), 2);
        for _ in 0..2 {
            lim.wait().await;
        }

        // no more tokens until the next tick
        assert!(tokio::time::timeout(Duration::from_millis(1), lim.wait())
            .await
            .is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::time::timeout(Duration::from_millis(10), lim.wait())
            .await
            .expect("token should be available after refill");
    }
}
