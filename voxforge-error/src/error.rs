//! The main Error type for voxforge

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// Longest raw provider text kept in an error's context.
const RAW_CONTEXT_LIMIT: usize = 2048;

/// The unified error type for all voxforge operations.
///
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description, safe to show to a client
/// - `status`: Whether the error is retryable
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging (never sent to clients)
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use voxforge_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::UpstreamFailed, "model returned empty response")
///     .with_operation("forge::complete")
///     .with_context("provider", "gemini")
///     .with_context("model", "gemini-2.0-flash");
///
/// assert_eq!(err.kind(), ErrorKind::UpstreamFailed);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Look up a single context value by key
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    // =========================================================================
    // Status mutations
    // =========================================================================

    /// Mark as persistent after failed retries
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// =============================================================================
// Convenient From implementations (be careful not to leak raw errors!)
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an InvalidRequest (validation) error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Create a MethodNotAllowed error
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, "Method not allowed")
            .with_context("method", method)
    }

    /// Create a ConfigMissing error for an absent setting
    pub fn config_missing(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigMissing, message).with_context("key", key)
    }

    /// Create a ConfigInvalid error for a setting that could not be used
    pub fn config_invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::new(
            ErrorKind::ConfigInvalid,
            format!("invalid value '{}' for '{}'", value, key),
        )
        .with_context("key", key)
        .with_context("value", value)
    }

    /// Create an UpstreamFailed error
    pub fn upstream_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamFailed, message)
    }

    /// Create an UpstreamTimeout error
    pub fn upstream_timeout(after_secs: f64) -> Self {
        Self::new(
            ErrorKind::UpstreamTimeout,
            format!("Upstream request timed out after {}s", after_secs),
        )
        .with_context("timeout_secs", after_secs.to_string())
    }

    /// Create a ResponseMalformed error carrying the raw provider text.
    ///
    /// The raw text lands in the context (clipped), so it shows up in logs
    /// but never in the client-facing message.
    pub fn response_malformed(message: impl Into<String>, raw: &str) -> Self {
        Self::new(ErrorKind::ResponseMalformed, message).with_context("raw", clip(raw))
    }
}

fn clip(raw: &str) -> String {
    if raw.len() <= RAW_CONTEXT_LIMIT {
        return raw.to_string();
    }
    let mut end = RAW_CONTEXT_LIMIT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &raw[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::InvalidRequest, "Prompt is required");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.message(), "Prompt is required");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::UpstreamFailed, "quota exhausted")
            .with_operation("forge::complete")
            .with_context("provider", "gemini")
            .with_context("model", "gemini-2.0-flash");

        assert_eq!(err.operation(), "forge::complete");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("provider", "gemini".to_string()));
        assert_eq!(err.context_value("model"), Some("gemini-2.0-flash"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::IoFailed, "write failed")
            .with_operation("cli::write_model")
            .with_operation("cli::forge");

        assert_eq!(err.operation(), "cli::forge");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "cli::write_model".to_string()));
    }

    #[test]
    fn test_temporary_status() {
        let err = Error::new(ErrorKind::UpstreamTimeout, "slow");
        assert!(err.is_retryable());

        let err = Error::new(ErrorKind::ResponseMalformed, "not json");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_persist() {
        let err = Error::new(ErrorKind::NetworkFailed, "connection refused");
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::UpstreamFailed, "model unavailable")
            .with_operation("provider::complete")
            .with_context("model", "gemini-2.0-flash");

        let display = format!("{}", err);
        assert!(display.contains("UpstreamFailed"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::complete"));
        assert!(display.contains("model: gemini-2.0-flash"));
        assert!(display.ends_with("=> model unavailable"));
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::invalid_request("Prompt is required");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = Error::method_not_allowed("GET");
        assert_eq!(err.message(), "Method not allowed");
        assert_eq!(err.context_value("method"), Some("GET"));

        let err = Error::config_invalid("VOXFORGE_TIMEOUT_SECS", "soon");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("soon"));

        let err = Error::upstream_timeout(30.0);
        assert_eq!(err.kind(), ErrorKind::UpstreamTimeout);
        assert!(err.message().contains("30s"));
    }

    #[test]
    fn test_response_malformed_keeps_raw_out_of_message() {
        let err = Error::response_malformed("Invalid response from AI", "Sure! Here is a cube");
        assert_eq!(err.message(), "Invalid response from AI");
        assert_eq!(err.context_value("raw"), Some("Sure! Here is a cube"));
        assert!(err.to_string().contains("Sure! Here is a cube"));
    }

    #[test]
    fn test_raw_context_is_clipped() {
        let raw = "é".repeat(RAW_CONTEXT_LIMIT);
        let err = Error::response_malformed("Invalid response from AI", &raw);
        let kept = err.context_value("raw").unwrap();
        assert!(kept.len() <= RAW_CONTEXT_LIMIT + '…'.len_utf8());
        assert!(kept.ends_with('…'));
    }

    #[test]
    fn test_set_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::new(ErrorKind::ResponseMalformed, "Invalid response from AI")
            .set_source(parse_err);

        assert!(err.source_ref().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "model.json");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "io");
    }
}
