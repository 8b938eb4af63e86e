//! Boundary error type and operation names

use std::fmt;
use thiserror::Error;

/// Boxed underlying fault kept as an error's source
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used at the adaptor boundary
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Remote Secrets Manager operations exposed by the adaptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DescribeSecret,
    GetSecretValue,
    BatchGetSecretValue,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DescribeSecret => "describe-secret",
            Self::GetSecretValue => "get-secret-value",
            Self::BatchGetSecretValue => "batch-get-secret-value",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error kind surfaced to callers of a client handle.
///
/// Every variant that wraps an underlying fault keeps it as the error
/// source, so callers can walk the chain with [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error occurred while initializing the AWS secret manager client: {message}")]
    Init {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Error occurred while executing {operation} request: {message}")]
    Operation {
        operation: Operation,
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Error occurred while closing the AWS secret manager client: {message}")]
    Close {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("AWS secret manager client is not initialized")]
    NotInitialized,
}

impl Error {
    pub fn init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Init {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    pub fn operation(
        operation: Operation,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Operation {
            operation,
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn close(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Close {
            message: message.into(),
            source: source.into(),
        }
    }

    /// The failing remote operation, if this error came from one
    pub fn operation_name(&self) -> Option<Operation> {
        match self {
            Self::Operation { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn test_operation_error_format() {
        let error = Error::operation(Operation::GetSecretValue, "throttled", "throttled");

        assert_eq!(
            error.to_string(),
            "Error occurred while executing get-secret-value request: throttled"
        );
        assert_eq!(error.operation_name(), Some(Operation::GetSecretValue));
    }

    #[test]
    fn test_init_error_keeps_source() {
        let error = Error::init(Reset);

        assert!(error.to_string().ends_with("client: connection reset"));
        let source = error.source().unwrap();
        assert!(source.downcast_ref::<Reset>().is_some());
    }

    #[test]
    fn test_not_initialized() {
        let error = Error::NotInitialized;
        assert!(error.is_not_initialized());
        assert!(error.source().is_none());
        assert_eq!(error.operation_name(), None);
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::DescribeSecret.to_string(), "describe-secret");
        assert_eq!(Operation::GetSecretValue.as_str(), "get-secret-value");
        assert_eq!(
            Operation::BatchGetSecretValue.to_string(),
            "batch-get-secret-value"
        );
    }
}
