use std::future::Future;
use std::time::Duration;

use tracing::debug;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Runs `op` until it succeeds, fails with a non-retriable error, or the
/// attempt budget is spent. The last error is returned as-is.
pub(crate) async fn with_retry<T, E, F, Fut>(
    label: &str,
    is_retriable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < MAX_ATTEMPTS && is_retriable(&e) => {
                let delay_ms = jittered_backoff(attempt);
                debug!(
                    call = label,
                    attempt = attempt + 1,
                    delay_ms,
                    error = %e,
                    "retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}
