//! Response envelope written to the output stream.
//!
//! ```json
//! {"schemaVersion":1,"id":"1","ok":true,"op":"navigate","data":{"url":"..."}}
//! {"schemaVersion":1,"id":"2","ok":false,"op":"click","error":{"code":"PRECONDITION_FAILED","message":"..."}}
//! ```
//!
//! A response carries either `data` or `error`, never both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SCHEMA_VERSION;

/// Uniform envelope for every operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
	/// Schema version for envelope compatibility.
	pub schema_version: u32,

	/// Request id echoed for correlation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,

	/// `true` if the operation succeeded.
	pub ok: bool,

	/// Operation name echoed from the request.
	pub op: String,

	/// Operation payload (success only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,

	/// Failure description (failure only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorBody>,
}

impl Response {
	/// Builds a success envelope.
	pub fn success(id: Option<Value>, op: impl Into<String>, data: Value) -> Self {
		Self {
			schema_version: SCHEMA_VERSION,
			id,
			ok: true,
			op: op.into(),
			data: Some(data),
			error: None,
		}
	}

	/// Builds a failure envelope.
	pub fn failure(id: Option<Value>, op: impl Into<String>, error: ErrorBody) -> Self {
		Self {
			schema_version: SCHEMA_VERSION,
			id,
			ok: false,
			op: op.into(),
			data: None,
			error: Some(error),
		}
	}

	/// Returns the error code for failed responses.
	pub fn error_code(&self) -> Option<ErrorCode> {
		self.error.as_ref().map(|e| e.code)
	}
}

/// Structured failure information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Machine-readable classification.
	pub code: ErrorCode,
	/// Human-readable description.
	pub message: String,
	/// Code-specific detail (violations, timeouts, engine error kind).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

impl ErrorBody {
	/// Creates an error body without details.
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			details: None,
		}
	}

	/// Attaches details.
	pub fn with_details(mut self, details: Value) -> Self {
		self.details = Some(details);
		self
	}
}

/// Failure classification shared by every server.
///
/// | Code | Description |
/// |------|-------------|
/// | `UNKNOWN_OPERATION` | No operation registered under the requested name |
/// | `INVALID_ARGUMENTS` | Arguments violate the operation schema |
/// | `PRECONDITION_FAILED` | Operation needs an active session and none exists |
/// | `TIMEOUT` | Operation deadline elapsed |
/// | `OPERATION_FAILED` | Handler or engine failure |
/// | `RESOURCE_ERROR` | Engine session could not be acquired or released |
/// | `PARSE_ERROR` | Input line is not a request envelope |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	UnknownOperation,
	InvalidArguments,
	PreconditionFailed,
	Timeout,
	OperationFailed,
	ResourceError,
	ParseError,
}

impl ErrorCode {
	/// Wire spelling of the code.
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::UnknownOperation => "UNKNOWN_OPERATION",
			ErrorCode::InvalidArguments => "INVALID_ARGUMENTS",
			ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::OperationFailed => "OPERATION_FAILED",
			ErrorCode::ResourceError => "RESOURCE_ERROR",
			ErrorCode::ParseError => "PARSE_ERROR",
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
