//! Error types for the engine runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to an automation engine.
#[derive(Debug, Error)]
pub enum Error {
	/// No driver executable could be located for the engine.
	#[error("driver for engine '{engine}' not found. Set {env_var} or install {binary} on PATH")]
	DriverNotFound {
		engine: String,
		env_var: String,
		binary: String,
	},

	/// Driver process could not be started.
	#[error("failed to launch driver: {0}")]
	LaunchFailed(String),

	/// Transport-level failure (driver stdio).
	#[error("transport error: {0}")]
	Transport(String),

	/// Driver sent something that is not a protocol message.
	#[error("protocol error: {0}")]
	Protocol(String),

	/// Engine reported a failure for an invocation.
	#[error("{name}: {message}")]
	Remote {
		/// Error type name reported by the engine (e.g. `"TimeoutError"`).
		name: String,
		/// Human-readable message.
		message: String,
	},

	/// Engine-side timeout.
	#[error("timeout: {0}")]
	Timeout(String),

	/// Element, frame or other target not found.
	#[error("not found: {0}")]
	NotFound(String),

	/// Driver closed its output stream.
	#[error("driver channel closed")]
	ChannelClosed,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Coarse classification of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Engine,
	Timeout,
	NotFound,
}

impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorKind::Engine => "engine",
			ErrorKind::Timeout => "timeout",
			ErrorKind::NotFound => "not_found",
		}
	}
}

impl Error {
	/// Classifies this error.
	///
	/// Remote errors are classified by the engine's error name first and fall
	/// back to message sniffing, since most drivers only report free text.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Timeout(_) => ErrorKind::Timeout,
			Error::NotFound(_) => ErrorKind::NotFound,
			Error::Remote { name, message } => {
				if name.contains("Timeout") || message.contains("Timeout") || message.contains("timed out") {
					ErrorKind::Timeout
				} else if name.contains("NoSuch") || message.contains("not found") || message.contains("no such element") {
					ErrorKind::NotFound
				} else {
					ErrorKind::Engine
				}
			}
			_ => ErrorKind::Engine,
		}
	}
}
