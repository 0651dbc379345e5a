//! Fleet tracker errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the tracker crates.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type.
///
/// None of these are fatal: poll and push failures are recovered by the next
/// tick or sample, a denied location ends the current arm cycle only, and a
/// validation failure drops a single entity from a poll.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// Fetching the fleet listing failed (network, status, or body).
    #[error("code: poll_failure, description: {0}")]
    PollFailure(String),

    /// Pushing the local position upstream failed.
    #[error("code: push_failure, description: {0}")]
    PushFailure(String),

    /// The location capability refused or is unavailable.
    #[error("code: location_denied, description: {0}")]
    LocationDenied(String),

    /// An entity in a poll response is malformed.
    #[error("code: validation_failure, description: {0}")]
    ValidationFailure(String),

    /// The session event loop is no longer running.
    #[error("code: session_closed")]
    SessionClosed,

    /// A non recoverable internal error occurred.
    #[error("code: internal, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the stable error code associated with the variant.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PollFailure(_) => "poll_failure",
            Self::PushFailure(_) => "push_failure",
            Self::LocationDenied(_) => "location_denied",
            Self::ValidationFailure(_) => "validation_failure",
            Self::SessionClosed => "session_closed",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the error description without the code prefix.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::PollFailure(d)
            | Self::PushFailure(d)
            | Self::LocationDenied(d)
            | Self::ValidationFailure(d)
            | Self::Internal(d) => d,
            Self::SessionClosed => "session is no longer running",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // if type is Error, return it with the newly added context
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::PollFailure(e) => Self::PollFailure(format!("{err}: {e}")),
                Self::PushFailure(e) => Self::PushFailure(format!("{err}: {e}")),
                Self::LocationDenied(e) => Self::LocationDenied(format!("{err}: {e}")),
                Self::ValidationFailure(e) => Self::ValidationFailure(format!("{err}: {e}")),
                Self::SessionClosed => Self::SessionClosed,
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        // otherwise, return an Internal error
        Self::Internal(chain)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationFailure(err.to_string())
    }
}

#[macro_export]
macro_rules! poll_failure {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::PollFailure(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::PollFailure(format!($err))
    };
}

#[macro_export]
macro_rules! push_failure {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::PushFailure(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::PushFailure(format!($err))
    };
}

#[macro_export]
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::ValidationFailure(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::ValidationFailure(format!($err))
    };
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result, anyhow};
    use serde_json::Value;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Registry, fmt};

    use super::Error;

    #[test]
    fn error_display() {
        let err = Error::PollFailure("status 503".to_string());
        assert_eq!(format!("{err}",), "code: poll_failure, description: status 503");
        assert_eq!(err.code(), "poll_failure");
        assert_eq!(err.description(), "status 503");

        assert_eq!(Error::SessionClosed.code(), "session_closed");
        assert_eq!(Error::SessionClosed.description(), "session is no longer running");
    }

    #[test]
    fn with_context() {
        let _ = Registry::default().with(EnvFilter::new("debug")).with(fmt::layer()).try_init();

        let context_error = || -> Result<(), Error> {
            Err(Error::PushFailure("connection refused".to_string()))
                .context("pushing position")?;
            Ok(())
        };

        let result = context_error();
        assert_eq!(
            result.unwrap_err(),
            Error::PushFailure("pushing position: connection refused".to_string())
        );
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("one-off error")).context("error context");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "code: internal, description: error context -> one-off error");
    }

    #[test]
    fn serde_context() {
        let result: Result<Value, serde_json::Error> = serde_json::from_str(r#"{"id": "v1""#);
        let err: Error = result.unwrap_err().into();

        assert_eq!(
            err.to_string(),
            "code: validation_failure, description: EOF while parsing an object at line 1 column 11"
        );
    }

    #[test]
    fn macros_format() {
        let id = "v1";
        assert_eq!(
            crate::invalid!("missing lat for {id}"),
            Error::ValidationFailure("missing lat for v1".to_string())
        );
        assert_eq!(crate::poll_failure!("status {}", 500), Error::PollFailure("status 500".to_string()));
        assert_eq!(crate::push_failure!("timed out"), Error::PushFailure("timed out".to_string()));
    }
}
