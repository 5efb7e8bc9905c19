//! Forge error types
//!
//! Re-exports voxforge-error and provides forge-specific constructors. The
//! messages here are the ones clients see in `{ "error": ... }` bodies.

pub use voxforge_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

pub const PROMPT_REQUIRED: &str = "Prompt is required";
pub const MISSING_API_KEY: &str = "Server configuration error: Missing API Key";
pub const INVALID_BODY: &str = "Invalid request body";
pub const INVALID_RESPONSE: &str = "Invalid response from AI";
pub const INTELLIGENCE_FAILURE: &str = "Intelligence failure";

/// Create the error for a request without a usable prompt
pub fn prompt_required() -> Error {
    Error::invalid_request(PROMPT_REQUIRED).with_operation("forge::validate")
}

/// Create the error for a request body that does not decode
pub fn invalid_body(reason: impl Into<String>) -> Error {
    Error::invalid_request(INVALID_BODY)
        .with_operation("forge::decode_request")
        .with_context("reason", reason)
}

/// Create the error for a missing provider credential
pub fn missing_api_key(env_key: impl Into<String>) -> Error {
    Error::config_missing(MISSING_API_KEY, env_key).with_operation("forge::credential")
}

/// Create the error for provider output that is not JSON
pub fn invalid_response(raw: &str) -> Error {
    Error::response_malformed(INVALID_RESPONSE, raw).with_operation("forge::decode_reply")
}

/// Create the error for a reply that carried no text at all
pub fn empty_response(provider: &str) -> Error {
    Error::upstream_failed("Provider returned an empty response")
        .with_operation("forge::complete")
        .with_context("provider", provider)
}

/// Convert a provider failure into a forge error.
///
/// The provider's own message is kept as the client-facing message; an empty
/// one falls back to a generic failure text.
pub fn upstream(err: ProviderError, provider: &str) -> Error {
    let kind = match &err {
        ProviderError::Timeout(_) => ErrorKind::UpstreamTimeout,
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
        ProviderError::Api { .. }
        | ProviderError::Parse(_)
        | ProviderError::Blocked(_)
        | ProviderError::Other(_) => ErrorKind::UpstreamFailed,
    };

    let message = err.message();
    let message = if message.is_empty() {
        INTELLIGENCE_FAILURE.to_string()
    } else {
        message
    };

    let mut error = Error::new(kind, message)
        .with_operation("forge::complete")
        .with_context("provider", provider);
    if let ProviderError::Api { status, .. } = &err {
        error = error.with_context("status", status.to_string());
    }
    error.set_source(err)
}
