//! Capability discovery payload returned by `list_operations`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every operation a server exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
	/// Server name (e.g. `"playwright"`).
	pub server: String,
	/// Operations in registration order.
	pub operations: Vec<OperationInfo>,
}

impl Catalog {
	/// Looks up an operation by name.
	pub fn get(&self, name: &str) -> Option<&OperationInfo> {
		self.operations.iter().find(|op| op.name == name)
	}
}

/// Self-description of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
	pub name: String,
	pub description: String,
	/// Whether the operation needs an active engine session.
	pub requires_session: bool,
	/// JSON-Schema shaped parameter description.
	pub input_schema: Value,
}
