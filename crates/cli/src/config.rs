//! Runtime configuration derived from the command line and environment.

use std::sync::Arc;
use std::time::Duration;

use harness_runtime::{DriverCommand, DriverEngine, DriverTimeouts, Engine, UnavailableEngine, locate_driver};
use tracing::{info, warn};

use crate::cli::{EngineArgs, ServerKind};

/// Everything `serve` needs besides the catalog.
#[derive(Debug, Clone)]
pub struct ServeConfig {
	pub server: ServerKind,
	pub driver: Option<String>,
	pub timeouts: DriverTimeouts,
	pub deadline_grace: Duration,
}

impl ServeConfig {
	pub fn new(server: ServerKind, args: &EngineArgs) -> Self {
		Self {
			server,
			driver: args.driver.clone(),
			timeouts: DriverTimeouts {
				launch: Duration::from_millis(args.launch_timeout_ms),
				release: Duration::from_millis(args.release_timeout_ms),
			},
			deadline_grace: Duration::from_millis(args.deadline_grace_ms),
		}
	}

	/// Locates the driver and builds the engine for this server.
	///
	/// A missing driver is not fatal: the server still starts and answers
	/// catalog queries, and every attempt to start an engine instance reports
	/// why the driver could not be found.
	pub fn engine(&self) -> Arc<dyn Engine> {
		self.engine_from(locate_driver(self.server.name(), self.driver.as_deref()))
	}

	pub(crate) fn engine_from(&self, located: harness_runtime::Result<DriverCommand>) -> Arc<dyn Engine> {
		let name = self.server.name();
		match located {
			Ok(command) => {
				info!(server = name, driver = %command.display(), "driver located");
				Arc::new(DriverEngine::new(name, command, self.timeouts))
			}
			Err(e) => {
				warn!(server = name, error = %e, "no driver available; engine operations will fail");
				Arc::new(UnavailableEngine::new(name, e.to_string()))
			}
		}
	}
}
