//! Engine capability interface.
//!
//! The command servers never talk to a concrete automation backend directly.
//! They see an [`Engine`] that can start instances, and an [`EngineHandle`]
//! per running instance that can invoke named operations and be released.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Something the engine observed on its own (console output, network traffic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
	/// Buffer name the event belongs to (e.g. `"console"`, `"network"`).
	pub kind: String,
	/// Event payload.
	pub value: Value,
}

impl EngineEvent {
	pub fn new(kind: impl Into<String>, value: Value) -> Self {
		Self { kind: kind.into(), value }
	}
}

/// Provider of engine instances.
#[async_trait]
pub trait Engine: Send + Sync {
	/// Engine name, used in diagnostics.
	fn name(&self) -> &str;

	/// Starts a new engine instance configured by `config`.
	async fn acquire(&self, config: &Value) -> Result<Box<dyn EngineHandle>>;
}

/// A live engine instance.
#[async_trait]
pub trait EngineHandle: Send {
	/// Stable identifier of this instance, used in diagnostics.
	fn id(&self) -> &str;

	/// Invokes a named operation.
	async fn invoke(&mut self, op: &str, args: &Value) -> Result<Value>;

	/// Drains events observed since the previous call.
	fn take_events(&mut self) -> Vec<EngineEvent> {
		Vec::new()
	}

	/// Tears the instance down.
	async fn release(self: Box<Self>) -> Result<()>;
}

/// Engine whose driver could not be located.
///
/// Every `acquire` fails with the stored reason, so a server can still come
/// up, answer catalog queries and report the missing driver per request.
#[derive(Debug, Clone)]
pub struct UnavailableEngine {
	name: String,
	reason: String,
}

impl UnavailableEngine {
	pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			reason: reason.into(),
		}
	}

	pub fn reason(&self) -> &str {
		&self.reason
	}
}

#[async_trait]
impl Engine for UnavailableEngine {
	fn name(&self) -> &str {
		&self.name
	}

	async fn acquire(&self, _config: &Value) -> Result<Box<dyn EngineHandle>> {
		Err(crate::error::Error::LaunchFailed(self.reason.clone()))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::error::Error;

	#[tokio::test]
	async fn unavailable_engine_reports_reason_on_acquire() {
		let engine = UnavailableEngine::new("selenium", "driver for engine 'selenium' not found");
		assert_eq!(engine.name(), "selenium");

		let err = engine.acquire(&json!({})).await.err().unwrap();
		match err {
			Error::LaunchFailed(reason) => assert!(reason.contains("not found"), "{reason}"),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn events_round_trip_as_kind_and_value() {
		let event = EngineEvent::new("console", json!({"type": "log", "text": "hi"}));
		let wire = serde_json::to_value(&event).unwrap();
		assert_eq!(wire, json!({"kind": "console", "value": {"type": "log", "text": "hi"}}));
	}
}
