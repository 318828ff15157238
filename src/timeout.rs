//! Optional deadlines for hook chains and dialogs.
//!
//! With the `timeout` feature the deadline is enforced with
//! `tokio::time::timeout` when the caller runs inside a tokio runtime. Under
//! any other executor, or without the feature, a configured deadline is
//! logged and ignored.

use std::future::Future;
use std::time::Duration;

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Elapsed(pub Duration);

impl Elapsed {
    /// Configured limit in milliseconds, for error reporting.
    pub fn millis(self) -> u128 {
        self.0.as_millis()
    }
}

/// Await `fut`, giving up after `limit` when one is set.
pub(crate) async fn with_deadline<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, Elapsed> {
    match limit {
        None => Ok(fut.await),
        #[cfg(feature = "timeout")]
        Some(limit) if tokio::runtime::Handle::try_current().is_ok() => {
            tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Elapsed(limit))
        }
        #[cfg(feature = "timeout")]
        Some(limit) => {
            crate::warn_log!(
                "Deadline of {:?} ignored: not running inside a tokio runtime",
                limit
            );
            Ok(fut.await)
        }
        #[cfg(not(feature = "timeout"))]
        Some(limit) => {
            crate::warn_log!(
                "Deadline of {:?} ignored: built without the `timeout` feature",
                limit
            );
            Ok(fut.await)
        }
    }
}
