//! # voxforge-error
//!
//! Unified error handling for the voxel forge.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g. InvalidRequest, UpstreamTimeout)
//! - **ErrorStatus**: Know whether trying again could help (Permanent, Temporary, Persistent)
//! - **Error Context**: Key-value pairs that point at the cause
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use voxforge_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::InvalidRequest, "Prompt is required")
//!         .with_operation("forge::validate")
//!         .with_context("mode", "create"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All library functions return `Result<T, voxforge_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - An error is handled once; callers further up only append context
//! - `From<OtherError>` is kept to the few cases that cannot leak raw errors

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the voxforge Error
pub type Result<T> = std::result::Result<T, Error>;
