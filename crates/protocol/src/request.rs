//! Request envelope read from the input stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single operation request.
///
/// ```json
/// {"id": "1", "op": "navigate", "args": {"url": "https://example.com"}}
/// ```
///
/// `command` is accepted in place of `op` and `input` in place of `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Caller-chosen correlation id, echoed verbatim in the response.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,

	/// Operation name.
	#[serde(alias = "command")]
	pub op: String,

	/// Raw argument bag, validated against the operation's schema.
	#[serde(default, alias = "input")]
	pub args: Value,
}

impl Request {
	/// Creates a request without a correlation id.
	pub fn new(op: impl Into<String>, args: Value) -> Self {
		Self {
			id: None,
			op: op.into(),
			args,
		}
	}

	/// Sets the correlation id.
	pub fn with_id(mut self, id: impl Into<Value>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Parses a request from one input line.
	///
	/// Trailing whitespace (including the newline delimiter) is ignored.
	pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(line.trim_end())
	}
}
