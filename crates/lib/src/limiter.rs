//! # Request Rate Limiting
//!
//! A process-wide throttle for the remote AI service. Both the embedding and
//! the captioning paths consume the same backend quota, so a single limiter
//! instance is shared by every caller and enforces a dual constraint:
//! minimum spacing between calls (`rps`) and a sliding 60-second window
//! (`rpm`). `acquire` never rejects a call, it only delays it.

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct LimiterState {
    /// Timestamp of the most recently permitted call.
    last_call: Option<Instant>,
    /// Timestamps of permitted calls within the last 60 seconds.
    window: VecDeque<Instant>,
}

/// Dual-constraint rate limiter shared by all remote callers in a run.
///
/// Instantiated once and passed around behind an `Arc`; recreating it
/// mid-run would discard the call history its sliding window must reflect.
#[derive(Debug)]
pub struct RateLimiter {
    rps: f64,
    rpm: usize,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(2.0, 60)
    }
}

impl RateLimiter {
    /// Creates a limiter permitting at most `rps` calls per second and `rpm`
    /// calls per sliding minute.
    pub fn new(rps: f64, rpm: usize) -> Self {
        Self {
            rps,
            rpm: rpm.max(1),
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Blocks until a call is permitted, then records it.
    ///
    /// The state lock is held across the waits, which serializes concurrent
    /// callers through a single arbitration point.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        // Minimum spacing between consecutive calls.
        let min_gap = Duration::from_secs_f64(1.0 / self.rps);
        if let Some(last) = state.last_call {
            let elapsed = last.elapsed();
            if elapsed < min_gap {
                sleep(min_gap - elapsed).await;
            }
        }

        // Sliding-window quota: wait for the oldest call to age out.
        Self::prune(&mut state.window);
        if state.window.len() >= self.rpm {
            if let Some(&oldest) = state.window.front() {
                sleep_until(oldest + WINDOW).await;
            }
            Self::prune(&mut state.window);
        }

        let now = Instant::now();
        state.last_call = Some(now);
        state.window.push_back(now);
    }

    fn prune(window: &mut VecDeque<Instant>) {
        let now = Instant::now();
        while let Some(&front) = window.front() {
            if now.duration_since(front) >= WINDOW {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_spacing() {
        let limiter = RateLimiter::new(2.0, 60);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        // Four inter-call gaps of at least 500ms each.
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_is_not_delayed() {
        let limiter = RateLimiter::new(2.0, 60);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn sliding_window_blocks_until_oldest_call_expires() {
        // Spacing effectively disabled so only the window constraint bites.
        let limiter = RateLimiter::new(1000.0, 3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        let before_window_wait = start.elapsed();
        assert!(before_window_wait < Duration::from_secs(1));

        limiter.acquire().await;
        // The fourth call must wait out the first call's 60-second window.
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
