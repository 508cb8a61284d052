//! Bounded polling and timeout guards.
//!
//! The overlay has to wait on things it cannot observe directly: a canvas
//! that has not committed layout, an image that has not decoded, a page that
//! pdf.js is still rasterising. Every such wait goes through [`retry`] or
//! [`with_timeout`] so that a hang becomes a reported failure.
//!
//! Sleeping is injected: the web crate passes a `setTimeout`-backed future,
//! tests pass an immediately-ready one.

use std::fmt::Display;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{self, Either};
use serde::{Deserialize, Serialize};

use crate::error::RetryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub interval_ms: u32,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const fn new(interval_ms: u32, max_attempts: u32) -> Self {
        Self { interval_ms, max_attempts }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms as u64)
    }

    /// Upper bound on how long the loop can take, ignoring attempt cost.
    pub fn patience(&self) -> Duration {
        self.interval() * self.max_attempts.saturating_sub(1)
    }
}

/// Call `attempt` until it succeeds or the policy runs out.
///
/// `attempt` is synchronous on purpose: callers borrow their state for the
/// duration of one attempt only, never across a sleep. It receives the
/// 1-based attempt number.
pub async fn retry<T, E, A, S, F>(
    policy: RetryPolicy,
    what: &str,
    mut attempt: A,
    mut sleep: S,
) -> Result<T, RetryError>
where
    A: FnMut(u32) -> Result<T, E>,
    E: Display,
    S: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    let max = policy.max_attempts.max(1);
    let mut reason = String::new();
    for n in 1..=max {
        match attempt(n) {
            Ok(value) => {
                if n > 1 {
                    log::debug!("{what}: ready after {n} attempts");
                }
                return Ok(value);
            }
            Err(e) => {
                reason = e.to_string();
                log::debug!("{what}: attempt {n}/{max} not ready: {reason}");
            }
        }
        if n < max {
            sleep(policy.interval()).await;
        }
    }
    log::warn!("{what}: gave up after {max} attempts ({}ms): {reason}", policy.patience().as_millis());
    Err(RetryError::Exhausted { attempts: max, reason })
}

/// Race `work` against `timer`; whichever finishes first wins.
pub async fn with_timeout<T, W, S>(what: &'static str, after: Duration, work: W, timer: S) -> Result<T, RetryError>
where
    W: Future<Output = T>,
    S: Future<Output = ()>,
{
    let work = pin!(work);
    let timer = pin!(timer);
    match future::select(work, timer).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(((), _)) => {
            log::error!("{what} timed out after {}ms", after.as_millis());
            Err(RetryError::TimedOut { what, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    fn instant(_: Duration) -> future::Ready<()> {
        future::ready(())
    }

    #[test]
    fn succeeds_once_ready() {
        let sleeps = Cell::new(0);
        let result = block_on(retry(
            RetryPolicy::new(20, 10),
            "probe",
            |n| if n == 3 { Ok(n) } else { Err("not yet") },
            |_| {
                sleeps.set(sleeps.get() + 1);
                future::ready(())
            },
        ));
        assert_eq!(result, Ok(3));
        assert_eq!(sleeps.get(), 2);
    }

    #[test]
    fn stops_at_attempt_cap() {
        let calls = Cell::new(0);
        let result: Result<(), _> = block_on(retry(
            RetryPolicy::new(20, 50),
            "probe",
            |_| {
                calls.set(calls.get() + 1);
                Err("canvas not mounted")
            },
            instant,
        ));
        assert_eq!(calls.get(), 50);
        assert_eq!(
            result,
            Err(RetryError::Exhausted { attempts: 50, reason: "canvas not mounted".into() })
        );
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let result = block_on(retry(RetryPolicy::new(5, 0), "probe", |_| Ok::<_, &str>(7), instant));
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn patience_is_interval_times_gaps() {
        assert_eq!(RetryPolicy::new(20, 50).patience(), Duration::from_millis(980));
    }

    #[test]
    fn timeout_fires_when_work_hangs() {
        let after = Duration::from_secs(10);
        let result = block_on(with_timeout("page render", after, future::pending::<u8>(), future::ready(())));
        assert_eq!(result, Err(RetryError::TimedOut { what: "page render", after }));
    }

    #[test]
    fn finished_work_beats_timer() {
        let result = block_on(with_timeout("load", Duration::from_secs(30), future::ready(5), future::pending::<()>()));
        assert_eq!(result, Ok(5));
    }
}
