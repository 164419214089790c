use std::{future::Future, time::Duration};

use log::*;

use crate::MarketApiError;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(4);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Runs `call` up to three times, sleeping 4s then 8s (backoff doubles per
/// attempt, capped at 10s) between attempts. Only transient failures - network
/// errors and 5xx responses - are retried; any other error is returned to the
/// caller on first occurrence.
pub(crate) async fn with_retries<T, F, Fut>(op: &str, mut call: F) -> Result<T, MarketApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketApiError>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS && e.is_transient() => {
                warn!("⏳ {op} failed on attempt {attempt}/{MAX_ATTEMPTS}: {e}. Retrying in {}s", backoff.as_secs());
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            },
            Err(e) => {
                error!("⏳ {op} failed on attempt {attempt}/{MAX_ATTEMPTS}: {e}. Giving up.");
                return Err(e);
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::with_retries;
    use crate::MarketApiError;

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_one_error_after_three_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries("flaky op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(MarketApiError::Upstream { status: 502, message: "bad gateway".into() })
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(MarketApiError::Upstream { status: 502, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success_recovers() {
        let calls = AtomicU32::new(0);
        let result = with_retries("recovering op", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MarketApiError::Transport("connection reset".into()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn application_level_rejections_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries("rejected op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(MarketApiError::Upstream { status: 400, message: "invalid transition".into() })
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }
}
