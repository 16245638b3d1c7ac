//! Wire types shared by the harness command servers and their callers.
//!
//! Every server speaks the same newline-delimited JSON protocol over stdio:
//! one [`Request`] per input line, exactly one [`Response`] per request, in
//! arrival order. Which operations exist differs per server and is discovered
//! at runtime through the `list_operations` operation, whose payload is a
//! [`Catalog`].
//!
//! # Main Types
//!
//! - [`Request`] - one operation invocation read from the input stream
//! - [`Response`] - the uniform success/failure envelope
//! - [`ErrorCode`] - machine-readable failure classification
//! - [`OperationInfo`] - capability discovery entry

pub mod catalog;
pub mod request;
pub mod response;

pub use catalog::{Catalog, OperationInfo};
pub use request::Request;
pub use response::{ErrorBody, ErrorCode, Response};

/// Current schema version stamped on every response.
///
/// Increment this when making breaking changes to the envelope structure.
pub const SCHEMA_VERSION: u32 = 1;
