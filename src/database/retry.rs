use std::future::Future;
use std::time::Duration;

const MAX_TRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 50;

/// Transient storage hiccups (connection drops, pool timeouts) are worth a
/// bounded retry on the lifecycle paths; permanent errors (constraint
/// violations, missing rows) surface immediately.
fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}

/// Runs `op` up to three times with exponential backoff, retrying only
/// transient errors.
pub async fn with_retry<T, F, Fut>(label: &str, mut op: F) -> std::result::Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt + 1 < MAX_TRIES => {
                let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
                tracing::warn!(
                    op = label,
                    attempt = attempt + 1,
                    error = ?err,
                    "transient storage error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
