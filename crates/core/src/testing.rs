//! In-memory engine for exercising sessions and dispatch without a driver.
//!
//! [`FakeEngine`] records every capability call in order (`acquire(fake#1)`,
//! `invoke(fake#1, navigate)`, `release(fake#1)`) and can be scripted to
//! reply, fail, stall, or emit events per operation.
//!
//! # Example
//!
//! ```ignore
//! let engine = FakeEngine::new();
//! engine.reply("get_page_title", json!("Example"));
//! let session = Session::new(Arc::new(engine.clone()));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use harness_runtime::{Engine, EngineEvent, EngineHandle, Error, Result};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
enum Script {
	Reply(Value),
	Fail { name: String, message: String },
	Stall(Duration),
}

#[derive(Debug, Default)]
struct FakeState {
	calls: Mutex<Vec<String>>,
	sequence: AtomicU64,
	live: AtomicU64,
	acquire_failure: Mutex<Option<String>>,
	release_failure: Mutex<Option<String>>,
	scripts: Mutex<HashMap<String, Script>>,
	emits: Mutex<HashMap<String, Vec<EngineEvent>>>,
}

impl FakeState {
	fn record(&self, call: String) {
		self.calls.lock().push(call);
	}
}

/// Scriptable [`Engine`] that records call order.
///
/// Clones share state, so a test can keep one clone while the session owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
	state: Arc<FakeState>,
}

impl FakeEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Capability calls so far, oldest first.
	pub fn calls(&self) -> Vec<String> {
		self.state.calls.lock().clone()
	}

	/// Handles acquired and not yet released.
	pub fn live(&self) -> u64 {
		self.state.live.load(Ordering::SeqCst)
	}

	/// Makes the next `acquire` fail with `message`.
	pub fn fail_next_acquire(&self, message: impl Into<String>) {
		*self.state.acquire_failure.lock() = Some(message.into());
	}

	/// Makes every `release` report `message` after tearing down.
	pub fn fail_releases(&self, message: impl Into<String>) {
		*self.state.release_failure.lock() = Some(message.into());
	}

	/// Answers `op` with `value`. Unscripted operations echo their arguments.
	pub fn reply(&self, op: &str, value: Value) {
		self.state.scripts.lock().insert(op.to_string(), Script::Reply(value));
	}

	/// Fails `op` with a remote engine error.
	pub fn fail(&self, op: &str, name: &str, message: &str) {
		self.state.scripts.lock().insert(
			op.to_string(),
			Script::Fail {
				name: name.to_string(),
				message: message.to_string(),
			},
		);
	}

	/// Delays `op` by `delay` before echoing.
	pub fn stall(&self, op: &str, delay: Duration) {
		self.state.scripts.lock().insert(op.to_string(), Script::Stall(delay));
	}

	/// Emits an event of `kind` every time `op` is invoked.
	pub fn emit(&self, op: &str, kind: &str, value: Value) {
		self.state
			.emits
			.lock()
			.entry(op.to_string())
			.or_default()
			.push(EngineEvent::new(kind, value));
	}
}

#[async_trait]
impl Engine for FakeEngine {
	fn name(&self) -> &str {
		"fake"
	}

	async fn acquire(&self, config: &Value) -> Result<Box<dyn EngineHandle>> {
		if let Some(message) = self.state.acquire_failure.lock().take() {
			self.state.record("acquire(failed)".to_string());
			return Err(Error::LaunchFailed(message));
		}

		let id = format!("fake#{}", self.state.sequence.fetch_add(1, Ordering::SeqCst) + 1);
		self.state.record(format!("acquire({id})"));
		self.state.live.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeHandle {
			id,
			config: config.clone(),
			state: Arc::clone(&self.state),
			events: Vec::new(),
		}))
	}
}

struct FakeHandle {
	id: String,
	config: Value,
	state: Arc<FakeState>,
	events: Vec<EngineEvent>,
}

#[async_trait]
impl EngineHandle for FakeHandle {
	fn id(&self) -> &str {
		&self.id
	}

	async fn invoke(&mut self, op: &str, args: &Value) -> Result<Value> {
		self.state.record(format!("invoke({}, {op})", self.id));
		if let Some(events) = self.state.emits.lock().get(op) {
			self.events.extend(events.iter().cloned());
		}

		let script = self.state.scripts.lock().get(op).cloned();
		match script {
			Some(Script::Reply(value)) => Ok(value),
			Some(Script::Fail { name, message }) => Err(Error::Remote { name, message }),
			Some(Script::Stall(delay)) => {
				tokio::time::sleep(delay).await;
				Ok(json!({"op": op, "args": args}))
			}
			None => Ok(json!({"op": op, "args": args, "config": self.config})),
		}
	}

	fn take_events(&mut self) -> Vec<EngineEvent> {
		std::mem::take(&mut self.events)
	}

	async fn release(self: Box<Self>) -> Result<()> {
		self.state.record(format!("release({})", self.id));
		self.state.live.fetch_sub(1, Ordering::SeqCst);
		match self.state.release_failure.lock().clone() {
			Some(message) => Err(Error::Transport(message)),
			None => Ok(()),
		}
	}
}
