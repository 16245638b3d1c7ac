//! [`Engine`] backed by an external driver process.
//!
//! Every acquired session owns one driver process. The session is started by
//! a `launch` call carrying the start configuration and torn down by a
//! best-effort `close` call followed by process termination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::BufReader;
use tokio::process::{ChildStdin, ChildStdout};
use tracing::{debug, info, warn};

use crate::connection::DriverConnection;
use crate::driver::DriverCommand;
use crate::engine::{Engine, EngineEvent, EngineHandle};
use crate::error::{Error, Result};
use crate::process::DriverProcess;

const LAUNCH_METHOD: &str = "launch";
const CLOSE_METHOD: &str = "close";

/// Timing knobs for driver sessions.
#[derive(Debug, Clone, Copy)]
pub struct DriverTimeouts {
	/// Upper bound for spawning the driver and answering `launch`.
	pub launch: Duration,
	/// Upper bound for `close` plus process exit before the driver is killed.
	pub release: Duration,
}

impl Default for DriverTimeouts {
	fn default() -> Self {
		Self {
			launch: Duration::from_secs(30),
			release: Duration::from_secs(5),
		}
	}
}

/// Engine that runs each session in its own driver process.
#[derive(Debug)]
pub struct DriverEngine {
	name: String,
	command: DriverCommand,
	timeouts: DriverTimeouts,
	sessions: AtomicU64,
}

impl DriverEngine {
	pub fn new(name: impl Into<String>, command: DriverCommand, timeouts: DriverTimeouts) -> Self {
		Self {
			name: name.into(),
			command,
			timeouts,
			sessions: AtomicU64::new(0),
		}
	}

	pub fn command(&self) -> &DriverCommand {
		&self.command
	}
}

#[async_trait]
impl Engine for DriverEngine {
	fn name(&self) -> &str {
		&self.name
	}

	async fn acquire(&self, config: &Value) -> Result<Box<dyn EngineHandle>> {
		let seq = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
		let id = format!("{}#{seq}", self.name);

		let (process, stdin, stdout) = DriverProcess::spawn(&self.command).await?;
		let mut connection = DriverConnection::new(stdin, stdout);

		let launched = tokio::time::timeout(self.timeouts.launch, connection.call(LAUNCH_METHOD, config)).await;
		let failure = match launched {
			Ok(Ok(info)) => {
				info!(engine = %self.name, session = %id, pid = ?process.pid(), "engine session launched");
				debug!(session = %id, launch = %info, "launch reply");
				return Ok(Box::new(DriverSession {
					id,
					process,
					connection,
					release_timeout: self.timeouts.release,
				}));
			}
			Ok(Err(e)) => e,
			Err(_) => Error::Timeout(format!("driver did not answer launch within {}ms", self.timeouts.launch.as_millis())),
		};

		drop(connection);
		if let Err(e) = process.shutdown(Duration::from_millis(500)).await {
			warn!(session = %id, error = %e, "failed to stop driver after launch failure");
		}
		Err(failure)
	}
}

type DriverStdio = DriverConnection<ChildStdin, BufReader<ChildStdout>>;

/// One live driver session.
struct DriverSession {
	id: String,
	process: DriverProcess,
	connection: DriverStdio,
	release_timeout: Duration,
}

#[async_trait]
impl EngineHandle for DriverSession {
	fn id(&self) -> &str {
		&self.id
	}

	async fn invoke(&mut self, op: &str, args: &Value) -> Result<Value> {
		self.connection.call(op, args).await
	}

	fn take_events(&mut self) -> Vec<EngineEvent> {
		self.connection.take_events()
	}

	async fn release(self: Box<Self>) -> Result<()> {
		let DriverSession {
			id,
			process,
			mut connection,
			release_timeout,
		} = *self;

		let closed = tokio::time::timeout(release_timeout, connection.call(CLOSE_METHOD, &Value::Null)).await;
		let close_result = match closed {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(e)) => Err(e),
			Err(_) => Err(Error::Timeout(format!("driver did not answer close within {}ms", release_timeout.as_millis()))),
		};

		// Closing stdin tells a well-behaved driver to exit.
		drop(connection.into_writer());
		let exit_result = process.shutdown(release_timeout).await;
		debug!(session = %id, "engine session released");

		close_result.and(exit_result)
	}
}
