//! Bounded poll-until-predicate helpers.
//!
//! Frame discovery, post-login detection, and outcome confirmation all share
//! the same "probe the live state, sleep, repeat until budget runs out"
//! shape; these two functions are that shape, parameterised by predicate,
//! interval, and either an attempt count or a deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// A successful poll: the probed value plus the 1-based tick it appeared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polled<T> {
    pub value: T,
    pub tick: u32,
}

/// Run `probe` up to `max_attempts` times, `interval` apart, until it yields
/// a value. Returns `Ok(None)` once the attempt budget is spent; the probe
/// has then run exactly `max_attempts` times. Probe errors abort the poll.
pub async fn poll_ticks<T, F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut probe: F,
) -> anyhow::Result<Option<Polled<T>>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    for tick in 1..=max_attempts {
        if let Some(value) = probe().await? {
            return Ok(Some(Polled { value, tick }));
        }
        if tick < max_attempts {
            sleep(interval).await;
        }
    }
    Ok(None)
}

/// Deadline-based variant: probe every `interval` until `deadline` has
/// elapsed. Always probes at least once; never sleeps past the deadline.
pub async fn poll_within<T, F, Fut>(
    deadline: Duration,
    interval: Duration,
    mut probe: F,
) -> anyhow::Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }
        if started.elapsed() + interval > deadline {
            return Ok(None);
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_the_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Option<Polled<()>> =
            poll_ticks(20, Duration::from_millis(100), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_the_tick_a_value_appeared_on() {
        let calls = AtomicU32::new(0);
        let result = poll_ticks(10, Duration::from_millis(50), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n == 3).then_some("found"))
        })
        .await
        .unwrap()
        .expect("value appears on the third tick");

        assert_eq!(result.value, "found");
        assert_eq!(result.tick, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_abort_the_poll() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<Option<Polled<()>>> =
            poll_ticks(5, Duration::from_millis(10), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("boom"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_variant_probes_at_least_once() {
        let calls = AtomicU32::new(0);
        let result: Option<()> =
            poll_within(Duration::ZERO, Duration::from_millis(100), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_variant_stops_on_first_hit() {
        let calls = AtomicU32::new(0);
        let result = poll_within(Duration::from_secs(5), Duration::from_millis(100), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n == 2).then_some(n))
        })
        .await
        .unwrap();

        assert_eq!(result, Some(2));
    }
}
