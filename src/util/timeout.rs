//! Per-request deadline for the chat and save endpoints.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Bound one chat or save round trip by the configured `request_timeout`.
///
/// Expiry becomes [`TransportError::Timeout`] carrying the deadline in
/// milliseconds. On the chat path the session answers it with the fallback
/// reply; on the save path it counts as a failed save and arms the retry.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
