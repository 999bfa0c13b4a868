//! Bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use crate::Result;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 1_000;

/// Run `op` up to three times, doubling the delay from 1s between
/// attempts. Used by embedding providers around transient transport
/// failures; the last error is surfaced unchanged.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;

    for attempt in 0..MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_err = Some(e);
                if attempt + 1 < MAX_ATTEMPTS {
                    let delay = BASE_DELAY_MS * 2u64.pow(attempt);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    // Loop always stores an error before falling through
    Err(last_err.unwrap_or_else(|| crate::Error::Network("retry exhausted".to_string())))
}
