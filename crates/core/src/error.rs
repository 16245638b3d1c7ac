use harness_protocol::{ErrorBody, ErrorCode};
use serde_json::json;
use thiserror::Error;

use crate::schema::Violation;

/// Failure raised inside an operation handler.
#[derive(Debug, Error)]
pub enum OpError {
	/// The handler needed a session and none is active.
	#[error("no active engine session")]
	NoSession,

	/// The engine could not be started or torn down.
	#[error("{0}")]
	Resource(String),

	#[error(transparent)]
	Engine(#[from] harness_runtime::Error),

	/// Normalized arguments did not fit the handler's typed record.
	#[error("argument decoding failed: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("{0}")]
	Failed(String),
}

impl OpError {
	pub fn failed(message: impl Into<String>) -> Self {
		OpError::Failed(message.into())
	}
}

/// Classification carried in `details.kind` of an `OPERATION_FAILED` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	Engine,
	Timeout,
	NotFound,
	Panic,
	Internal,
}

impl FailureKind {
	pub fn as_str(self) -> &'static str {
		match self {
			FailureKind::Engine => "engine",
			FailureKind::Timeout => "timeout",
			FailureKind::NotFound => "not_found",
			FailureKind::Panic => "panic",
			FailureKind::Internal => "internal",
		}
	}
}

impl From<harness_runtime::ErrorKind> for FailureKind {
	fn from(kind: harness_runtime::ErrorKind) -> Self {
		match kind {
			harness_runtime::ErrorKind::Engine => FailureKind::Engine,
			harness_runtime::ErrorKind::Timeout => FailureKind::Timeout,
			harness_runtime::ErrorKind::NotFound => FailureKind::NotFound,
		}
	}
}

/// Every way a single dispatch can fail without taking the process down.
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error("unknown operation: {name}")]
	UnknownOperation { name: String },

	#[error("invalid arguments for '{op}': {}", summarize(violations))]
	InvalidArguments { op: String, violations: Vec<Violation> },

	#[error("'{op}' requires an active session{}", start_hint(hint.as_deref()))]
	PreconditionFailed { op: String, hint: Option<String> },

	#[error("'{op}' timed out after {ms}ms")]
	Timeout { op: String, ms: u64 },

	#[error("{message}")]
	OperationFailed {
		op: String,
		kind: FailureKind,
		message: String,
	},

	#[error("{message}")]
	ResourceError { op: String, message: String },
}

fn summarize(violations: &[Violation]) -> String {
	violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn start_hint(hint: Option<&str>) -> String {
	hint.map(|op| format!("; call {op} first")).unwrap_or_default()
}

impl DispatchError {
	/// Converts a handler failure for `op` into its dispatch category.
	pub fn from_op_error(op: &str, err: OpError) -> Self {
		let op = op.to_string();
		match err {
			OpError::NoSession => DispatchError::PreconditionFailed { op, hint: None },
			OpError::Resource(message) => DispatchError::ResourceError { op, message },
			OpError::Engine(e) => DispatchError::OperationFailed {
				op,
				kind: e.kind().into(),
				message: e.to_string(),
			},
			OpError::Decode(e) => DispatchError::OperationFailed {
				op,
				kind: FailureKind::Internal,
				message: format!("argument decoding failed: {e}"),
			},
			OpError::Failed(message) => DispatchError::OperationFailed {
				op,
				kind: FailureKind::Engine,
				message,
			},
		}
	}

	pub fn code(&self) -> ErrorCode {
		match self {
			DispatchError::UnknownOperation { .. } => ErrorCode::UnknownOperation,
			DispatchError::InvalidArguments { .. } => ErrorCode::InvalidArguments,
			DispatchError::PreconditionFailed { .. } => ErrorCode::PreconditionFailed,
			DispatchError::Timeout { .. } => ErrorCode::Timeout,
			DispatchError::OperationFailed { .. } => ErrorCode::OperationFailed,
			DispatchError::ResourceError { .. } => ErrorCode::ResourceError,
		}
	}

	/// Converts to the structured error carried by a failure response.
	pub fn to_error_body(&self) -> ErrorBody {
		let body = ErrorBody::new(self.code(), self.to_string());
		match self {
			DispatchError::InvalidArguments { violations, .. } => body.with_details(json!({ "violations": violations })),
			DispatchError::Timeout { ms, .. } => body.with_details(json!({ "timeoutMs": ms })),
			DispatchError::OperationFailed { kind, .. } => body.with_details(json!({ "kind": kind.as_str() })),
			_ => body,
		}
	}
}

/// Operation table misconfiguration. Fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("operation '{name}' registered twice")]
	Duplicate { name: String },
}

/// Transport-level failure that ends the serve loop.
#[derive(Debug, Error)]
pub enum ShellError {
	#[error("failed to read request: {0}")]
	Input(#[source] std::io::Error),

	#[error("failed to write response: {0}")]
	Output(#[source] std::io::Error),

	/// A failure escaped the dispatcher.
	#[error("fatal shell error: {0}")]
	Fatal(String),
}
