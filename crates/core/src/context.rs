//! What a handler gets to work with.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::args::Args;
use crate::error::OpError;
use crate::registry::OperationRegistry;
use crate::session::Session;

/// Per-dispatch handler context.
///
/// Borrowed from the dispatcher for the duration of one operation, so
/// handlers can never run concurrently against the session.
pub struct OpCtx<'a> {
	op: &'a str,
	session: &'a mut Session,
	registry: &'a OperationRegistry,
	shutdown: &'a mut bool,
}

impl<'a> OpCtx<'a> {
	pub(crate) fn new(op: &'a str, session: &'a mut Session, registry: &'a OperationRegistry, shutdown: &'a mut bool) -> Self {
		Self {
			op,
			session,
			registry,
			shutdown,
		}
	}

	/// Name of the operation being dispatched.
	pub fn op(&self) -> &str {
		self.op
	}

	pub fn session(&mut self) -> &mut Session {
		self.session
	}

	pub fn registry(&self) -> &OperationRegistry {
		self.registry
	}

	/// Acquires the session (replacing any active one) with `args` as config.
	pub async fn start(&mut self, args: &Args) -> Result<String, OpError> {
		self.session.acquire(&args.to_value()).await
	}

	/// Releases the session. Returns whether one was active.
	pub async fn stop(&mut self) -> Result<bool, OpError> {
		self.session.release().await
	}

	/// Invokes the current operation on the live session.
	pub async fn forward(&mut self, args: &Args) -> Result<Value, OpError> {
		self.session.invoke(self.op, &args.to_value()).await
	}

	/// Runs the current operation on a transient engine instance.
	///
	/// The instance is never installed as the session and its events are
	/// discarded.
	pub async fn forward_oneshot(&mut self, args: &Args) -> Result<Value, OpError> {
		let engine = Arc::clone(self.session.engine());
		let config = args.to_value();
		let mut handle = engine
			.acquire(&config)
			.await
			.map_err(|e| OpError::Resource(format!("failed to start {} instance: {e}", engine.name())))?;

		let result = handle.invoke(self.op, &config).await;
		let dropped = handle.take_events().len();
		if dropped > 0 {
			debug!(op = self.op, dropped, "discarding events from one-shot instance");
		}
		if let Err(e) = handle.release().await {
			debug!(op = self.op, error = %e, "one-shot instance teardown failed");
		}
		Ok(result?)
	}

	/// Asks the shell to exit after this response is written.
	pub fn request_shutdown(&mut self) {
		*self.shutdown = true;
	}
}
