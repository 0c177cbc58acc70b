//! Shared error type across Agon crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed body.
    BadRequest,
    /// The service itself is misconfigured.
    Misconfigured,
    /// Upstream provider failed (any flavour).
    Upstream,
    /// Internal server error.
    Internal,
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AgonError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum AgonError {
    #[error("{0}")]
    Configuration(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("provider did not answer within {0} ms")]
    Timeout(u64),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AgonError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AgonError::Configuration(_) => ClientCode::Misconfigured,
            AgonError::Provider(_)
            | AgonError::Transport(_)
            | AgonError::MalformedResponse(_)
            | AgonError::Timeout(_) => ClientCode::Upstream,
            AgonError::BadRequest(_) => ClientCode::BadRequest,
            AgonError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Failure kind used as the `error_type` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            AgonError::Configuration(_) => "ConfigurationError",
            AgonError::Provider(_) => "ProviderError",
            AgonError::Transport(_) => "NetworkError",
            AgonError::MalformedResponse(_) => "MalformedResponseError",
            AgonError::Timeout(_) => "TimeoutError",
            AgonError::BadRequest(_) => "RequestValidationError",
            AgonError::Internal(_) => "InternalError",
        }
    }

    /// Configuration failures make the whole service unusable and are never
    /// folded into a chat envelope.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AgonError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_is_bare() {
        let e = AgonError::Configuration("GOOGLE_API_KEY environment variable not set".into());
        assert_eq!(e.to_string(), "GOOGLE_API_KEY environment variable not set");
        assert_eq!(e.kind(), "ConfigurationError");
        assert!(e.is_configuration());
    }

    #[test]
    fn upstream_kinds_share_a_code() {
        for e in [
            AgonError::Provider("quota".into()),
            AgonError::Transport("reset".into()),
            AgonError::MalformedResponse("no candidates".into()),
            AgonError::Timeout(10),
        ] {
            assert_eq!(e.client_code(), ClientCode::Upstream);
            assert!(!e.is_configuration());
        }
    }
}
