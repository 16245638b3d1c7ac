//! The single engine session a server owns.
//!
//! A [`Session`] is either absent or holds exactly one live
//! [`EngineHandle`] plus the named event buffers filled while it runs.
//! Starting while active replaces the handle: the old one is released
//! before the new one is acquired, so two sessions never coexist.

use std::collections::BTreeMap;
use std::sync::Arc;

use harness_runtime::{Engine, EngineEvent, EngineHandle};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::OpError;

struct Active {
	handle: Box<dyn EngineHandle>,
	buffers: BTreeMap<String, Vec<Value>>,
}

/// Owner of the at-most-one engine instance.
pub struct Session {
	engine: Arc<dyn Engine>,
	active: Option<Active>,
}

impl Session {
	pub fn new(engine: Arc<dyn Engine>) -> Self {
		Self { engine, active: None }
	}

	pub fn engine(&self) -> &Arc<dyn Engine> {
		&self.engine
	}

	pub fn is_active(&self) -> bool {
		self.active.is_some()
	}

	/// Identifier of the live handle, if any.
	pub fn id(&self) -> Option<&str> {
		self.active.as_ref().map(|a| a.handle.id())
	}

	/// Starts a session, replacing any active one.
	///
	/// A failed release of the previous handle is logged and does not block
	/// the replacement.
	///
	/// # Errors
	///
	/// Returns [`OpError::Resource`] when the engine cannot start. The session
	/// is absent afterwards.
	pub async fn acquire(&mut self, config: &Value) -> Result<String, OpError> {
		if let Some(previous) = self.active.take() {
			let id = previous.handle.id().to_string();
			info!(session = %id, "replacing active session");
			if let Err(e) = previous.handle.release().await {
				warn!(session = %id, error = %e, "failed to release replaced session; continuing");
			}
		}

		let handle = self
			.engine
			.acquire(config)
			.await
			.map_err(|e| OpError::Resource(format!("failed to start {} session: {e}", self.engine.name())))?;
		let id = handle.id().to_string();
		info!(engine = %self.engine.name(), session = %id, "session started");
		self.active = Some(Active {
			handle,
			buffers: BTreeMap::new(),
		});
		Ok(id)
	}

	/// Returns the live handle.
	///
	/// # Errors
	///
	/// Returns [`OpError::NoSession`] when no session is active.
	pub fn require(&mut self) -> Result<&mut dyn EngineHandle, OpError> {
		match self.active.as_mut() {
			Some(active) => Ok(active.handle.as_mut()),
			None => Err(OpError::NoSession),
		}
	}

	/// Tears the session down. Returns whether one was active.
	///
	/// The session is absent afterwards even when teardown fails; releasing an
	/// absent session is a no-op.
	///
	/// # Errors
	///
	/// Returns [`OpError::Resource`] when the engine reported a teardown failure.
	pub async fn release(&mut self) -> Result<bool, OpError> {
		let Some(active) = self.active.take() else {
			debug!("release requested with no active session");
			return Ok(false);
		};

		let id = active.handle.id().to_string();
		match active.handle.release().await {
			Ok(()) => {
				info!(session = %id, "session released");
				Ok(true)
			}
			Err(e) => {
				warn!(session = %id, error = %e, "session teardown failed");
				Err(OpError::Resource(format!("failed to release session {id}: {e}")))
			}
		}
	}

	/// Invokes `op` on the live handle and captures the events it produced.
	///
	/// Events are captured even when the invocation fails.
	///
	/// # Errors
	///
	/// Returns [`OpError::NoSession`] without a session, otherwise the
	/// engine's failure.
	pub async fn invoke(&mut self, op: &str, args: &Value) -> Result<Value, OpError> {
		let active = self.active.as_mut().ok_or(OpError::NoSession)?;
		let result = active.handle.invoke(op, args).await;
		for EngineEvent { kind, value } in active.handle.take_events() {
			active.buffers.entry(kind).or_default().push(value);
		}
		Ok(result?)
	}

	/// Appends `value` to the buffer named `kind`.
	///
	/// # Errors
	///
	/// Returns [`OpError::NoSession`] when no session is active.
	pub fn record_event(&mut self, kind: &str, value: Value) -> Result<(), OpError> {
		let active = self.active.as_mut().ok_or(OpError::NoSession)?;
		active.buffers.entry(kind.to_string()).or_default().push(value);
		Ok(())
	}

	/// Entries of one buffer. Empty when absent or never written.
	pub fn events(&self, kind: &str) -> &[Value] {
		self.active
			.as_ref()
			.and_then(|a| a.buffers.get(kind))
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Names of the buffers that hold at least one entry.
	pub fn buffer_names(&self) -> Vec<&str> {
		self.active
			.as_ref()
			.map(|a| a.buffers.iter().filter(|(_, v)| !v.is_empty()).map(|(k, _)| k.as_str()).collect())
			.unwrap_or_default()
	}

	/// Empties one buffer, or all of them. Returns the number of entries removed.
	pub fn clear_events(&mut self, kind: Option<&str>) -> usize {
		let Some(active) = self.active.as_mut() else {
			return 0;
		};
		match kind {
			Some(kind) => active.buffers.get_mut(kind).map(std::mem::take).map_or(0, |v| v.len()),
			None => std::mem::take(&mut active.buffers).into_values().map(|v| v.len()).sum(),
		}
	}
}
