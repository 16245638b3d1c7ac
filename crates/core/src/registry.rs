//! Operation table: name → {schema, precondition, deadline, handler}.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use harness_protocol::{Catalog, OperationInfo};
use serde_json::Value;

use crate::args::Args;
use crate::context::OpCtx;
use crate::error::{OpError, RegistryError};
use crate::schema::Schema;

/// Boxing alias for handler futures.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type OpResult = Result<Value, OpError>;

type HandlerFn = dyn for<'a> Fn(Args, OpCtx<'a>) -> BoxFut<'a, OpResult> + Send + Sync;

/// Type-erased operation body.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
	pub fn new<F>(f: F) -> Self
	where
		F: for<'a> Fn(Args, OpCtx<'a>) -> BoxFut<'a, OpResult> + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	pub(crate) fn call<'a>(&self, args: Args, ctx: OpCtx<'a>) -> BoxFut<'a, OpResult> {
		(self.0)(args, ctx)
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Handler")
	}
}

/// What must hold before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
	None,
	ActiveSession,
}

/// Upper bound on a handler's run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
	None,
	Fixed(Duration),
	/// Milliseconds read from a [`Kind::Millis`](crate::Kind::Millis) argument, plus the dispatcher's grace.
	FromArg(&'static str),
}

impl Deadline {
	pub fn resolve(&self, args: &Args, grace: Duration) -> Option<Duration> {
		match self {
			Deadline::None => None,
			Deadline::Fixed(d) => Some(*d),
			Deadline::FromArg(field) => args.u64(field).map(|ms| Duration::from_millis(ms) + grace),
		}
	}
}

/// Role an operation plays in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	Regular,
	/// Acquires or replaces the session.
	Start,
	/// Releases the session.
	Stop,
}

/// Immutable description of one operation.
#[derive(Debug, Clone)]
pub struct Operation {
	name: String,
	description: String,
	schema: Schema,
	precondition: Precondition,
	deadline: Deadline,
	lifecycle: Lifecycle,
	handler: Handler,
}

impl Operation {
	/// A session-independent operation with no arguments and no deadline.
	pub fn new(name: impl Into<String>, description: impl Into<String>, handler: Handler) -> Self {
		Self {
			name: name.into(),
			description: description.into(),
			schema: Schema::new(),
			precondition: Precondition::None,
			deadline: Deadline::None,
			lifecycle: Lifecycle::Regular,
			handler,
		}
	}

	pub fn schema(mut self, schema: Schema) -> Self {
		self.schema = schema;
		self
	}

	pub fn requires_session(mut self) -> Self {
		self.precondition = Precondition::ActiveSession;
		self
	}

	pub fn deadline(mut self, deadline: Deadline) -> Self {
		self.deadline = deadline;
		self
	}

	pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
		self.lifecycle = lifecycle;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn input_schema(&self) -> &Schema {
		&self.schema
	}

	pub fn precondition(&self) -> Precondition {
		self.precondition
	}

	pub fn deadline_policy(&self) -> Deadline {
		self.deadline
	}

	pub fn role(&self) -> Lifecycle {
		self.lifecycle
	}

	pub(crate) fn handler(&self) -> &Handler {
		&self.handler
	}

	pub fn info(&self) -> OperationInfo {
		OperationInfo {
			name: self.name.clone(),
			description: self.description.clone(),
			requires_session: self.precondition == Precondition::ActiveSession,
			input_schema: self.schema.to_json_schema(),
		}
	}
}

/// Operations of one server, in registration order.
#[derive(Debug)]
pub struct OperationRegistry {
	server: String,
	operations: Vec<Operation>,
	index: HashMap<String, usize>,
}

impl OperationRegistry {
	pub fn new(server: impl Into<String>) -> Self {
		Self {
			server: server.into(),
			operations: Vec::new(),
			index: HashMap::new(),
		}
	}

	/// A registry pre-populated with the operations every server exposes.
	///
	/// # Errors
	///
	/// Only fails if the built-in table itself repeats a name.
	pub fn with_builtins(server: impl Into<String>) -> Result<Self, RegistryError> {
		let mut registry = Self::new(server);
		registry.register_all(crate::builtin::operations())?;
		Ok(registry)
	}

	/// # Errors
	///
	/// Returns [`RegistryError::Duplicate`] if the name is taken.
	pub fn register(&mut self, operation: Operation) -> Result<(), RegistryError> {
		if self.index.contains_key(operation.name()) {
			return Err(RegistryError::Duplicate {
				name: operation.name().to_string(),
			});
		}
		self.index.insert(operation.name().to_string(), self.operations.len());
		self.operations.push(operation);
		Ok(())
	}

	/// # Errors
	///
	/// Stops at the first duplicate name.
	pub fn register_all(&mut self, operations: impl IntoIterator<Item = Operation>) -> Result<(), RegistryError> {
		operations.into_iter().try_for_each(|op| self.register(op))
	}

	pub fn resolve(&self, name: &str) -> Option<&Operation> {
		self.index.get(name).map(|&i| &self.operations[i])
	}

	pub fn server(&self) -> &str {
		&self.server
	}

	pub fn len(&self) -> usize {
		self.operations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.operations.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Operation> {
		self.operations.iter()
	}

	pub fn list(&self) -> Vec<OperationInfo> {
		self.operations.iter().map(Operation::info).collect()
	}

	pub fn catalog(&self) -> Catalog {
		Catalog {
			server: self.server.clone(),
			operations: self.list(),
		}
	}

	/// Name of the first start-type operation, used in precondition hints.
	pub fn start_operation(&self) -> Option<&str> {
		self.operations
			.iter()
			.find(|op| op.lifecycle == Lifecycle::Start)
			.map(Operation::name)
	}
}
