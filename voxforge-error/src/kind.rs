//! Error kinds for voxforge operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide what to do, most notably the HTTP
/// layer, which turns kinds into status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// A configuration value is present but unusable
    ConfigInvalid,

    /// A required configuration value (e.g. the provider credential) is absent
    ConfigMissing,

    // =========================================================================
    // Client request errors
    // =========================================================================
    /// The client request failed validation
    InvalidRequest,

    /// The HTTP method is not accepted by the endpoint
    MethodNotAllowed,

    // =========================================================================
    // Upstream provider errors
    // =========================================================================
    /// The generative model provider failed or returned non-success
    UpstreamFailed,

    /// The provider did not answer within the bounded wait
    UpstreamTimeout,

    /// The provider refused the request because of rate limits
    RateLimited,

    /// The provider rejected the credential
    AuthenticationFailed,

    /// The provider could not be reached
    NetworkFailed,

    // =========================================================================
    // Response errors
    // =========================================================================
    /// The provider output did not decode into the expected structure
    ResponseMalformed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // Configuration
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::ConfigMissing => "ConfigMissing",

            // Client request
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",

            // Upstream
            ErrorKind::UpstreamFailed => "UpstreamFailed",
            ErrorKind::UpstreamTimeout => "UpstreamTimeout",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Response
            ErrorKind::ResponseMalformed => "ResponseMalformed",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::UpstreamFailed
                | ErrorKind::UpstreamTimeout
                | ErrorKind::RateLimited
                | ErrorKind::NetworkFailed
        )
    }

    /// True when the error was caused by what the client sent
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorKind::InvalidRequest | ErrorKind::MethodNotAllowed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
