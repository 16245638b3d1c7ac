//! Request dispatch: resolve, validate, check precondition, execute, frame.
//!
//! The order is fixed so a caller always receives the earliest detectable
//! error. Nothing a handler does (failing, panicking, overrunning its
//! deadline) escapes [`Dispatcher::dispatch`] as anything but a
//! [`DispatchError`].


use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use harness_protocol::{Request, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::OpCtx;
use crate::error::{DispatchError, FailureKind};
use crate::registry::{OperationRegistry, Precondition};
use crate::session::Session;

/// Added to deadlines derived from an operation's own timeout argument.
pub const DEFAULT_DEADLINE_GRACE: Duration = Duration::from_secs(2);

/// Owns the operation table and the session for one server.
pub struct Dispatcher {
	registry: OperationRegistry,
	session: Session,
	deadline_grace: Duration,
	shutdown: bool,
}

impl Dispatcher {
	pub fn new(registry: OperationRegistry, session: Session) -> Self {
		Self {
			registry,
			session,
			deadline_grace: DEFAULT_DEADLINE_GRACE,
			shutdown: false,
		}
	}

	pub fn with_deadline_grace(mut self, grace: Duration) -> Self {
		self.deadline_grace = grace;
		self
	}

	pub fn registry(&self) -> &OperationRegistry {
		&self.registry
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	/// Whether a handler asked the shell to stop.
	pub fn shutdown_requested(&self) -> bool {
		self.shutdown
	}

	/// Runs one operation.
	///
	/// # Errors
	///
	/// Every failure is returned as a classified [`DispatchError`].
	pub async fn dispatch(&mut self, name: &str, raw: &Value) -> Result<Value, DispatchError> {
		let Some(operation) = self.registry.resolve(name) else {
			return Err(DispatchError::UnknownOperation { name: name.to_string() });
		};

		let args = operation
			.input_schema()
			.validate(raw)
			.map_err(|violations| DispatchError::InvalidArguments {
				op: name.to_string(),
				violations,
			})?;

		if operation.precondition() == Precondition::ActiveSession && !self.session.is_active() {
			return Err(DispatchError::PreconditionFailed {
				op: name.to_string(),
				hint: start_hint(&self.registry),
			});
		}

		let deadline = operation.deadline_policy().resolve(&args, self.deadline_grace);
		let handler = operation.handler();
		let ctx = OpCtx::new(operation.name(), &mut self.session, &self.registry, &mut self.shutdown);
		// Calling the handler inside the future catches panics raised before its first await too.
		let run = AssertUnwindSafe(async move { handler.call(args, ctx).await }).catch_unwind();

		let outcome = match deadline {
			Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| DispatchError::Timeout {
				op: name.to_string(),
				ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
			})?,
			None => run.await,
		};

		match outcome {
			Ok(Ok(data)) => Ok(data),
			Ok(Err(e)) => Err(match DispatchError::from_op_error(name, e) {
				DispatchError::PreconditionFailed { op, .. } => DispatchError::PreconditionFailed {
					op,
					hint: start_hint(&self.registry),
				},
				other => other,
			}),
			Err(payload) => Err(DispatchError::OperationFailed {
				op: name.to_string(),
				kind: FailureKind::Panic,
				message: format!("operation '{name}' panicked: {}", panic_message(&*payload)),
			}),
		}
	}

	/// Dispatches a request and frames the outcome.
	pub async fn handle(&mut self, request: Request) -> Response {
		let Request { id, op, args } = request;
		let started = Instant::now();
		debug!(op = %op, "dispatching");

		match self.dispatch(&op, &args).await {
			Ok(data) => {
				debug!(op = %op, elapsed_ms = started.elapsed().as_millis() as u64, "operation succeeded");
				Response::success(id, op, data)
			}
			Err(err) => {
				warn!(
					op = %op,
					code = %err.code(),
					elapsed_ms = started.elapsed().as_millis() as u64,
					error = %err,
					"operation failed"
				);
				Response::failure(id, op, err.to_error_body())
			}
		}
	}

	/// Releases the session on the way out. Failures are logged only.
	pub async fn release_session(&mut self) {
		if let Err(e) = self.session.release().await {
			warn!(error = %e, "failed to release session on exit");
		}
	}
}

fn start_hint(registry: &OperationRegistry) -> Option<String> {
	registry.start_operation().map(str::to_string)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}
