//! Driver executable discovery.
//!
//! Each engine is backed by an external driver program that speaks the
//! line-delimited JSON protocol in [`crate::connection`]. The driver is
//! located in the following order:
//! 1. An explicit command line (the `--driver` flag)
//! 2. The `HARNESS_<ENGINE>_DRIVER` environment variable (runtime override)
//! 3. A `harness-driver-<engine>` executable next to the running binary
//! 4. A `harness-driver-<engine>` executable on `PATH`

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Program and arguments used to start a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCommand {
	pub program: PathBuf,
	pub args: Vec<String>,
}

impl DriverCommand {
	/// Parses a whitespace-separated command line.
	///
	/// Returns `None` for a blank line.
	pub fn parse(line: &str) -> Option<Self> {
		let mut parts = line.split_whitespace();
		let program = PathBuf::from(parts.next()?);
		Some(Self {
			program,
			args: parts.map(String::from).collect(),
		})
	}

	/// Command line for display.
	pub fn display(&self) -> String {
		std::iter::once(self.program.display().to_string())
			.chain(self.args.iter().cloned())
			.collect::<Vec<_>>()
			.join(" ")
	}
}

/// Name of the environment variable overriding the driver for `engine`.
pub fn driver_env_var(engine: &str) -> String {
	format!("HARNESS_{}_DRIVER", engine.to_ascii_uppercase().replace('-', "_"))
}

/// Default executable name of the driver for `engine`.
pub fn driver_binary_name(engine: &str) -> String {
	let base = format!("harness-driver-{engine}");
	if cfg!(windows) { format!("{base}.exe") } else { base }
}

/// Locates the driver for `engine`.
///
/// # Errors
///
/// Returns [`Error::DriverNotFound`] if no candidate resolves.
pub fn locate_driver(engine: &str, explicit: Option<&str>) -> Result<DriverCommand> {
	let exe_dir = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf));
	locate_driver_with(engine, explicit, |key| std::env::var(key).ok(), exe_dir.as_deref())
}

/// [`locate_driver`] with injectable environment and binary directory.
pub fn locate_driver_with<F>(engine: &str, explicit: Option<&str>, env: F, exe_dir: Option<&Path>) -> Result<DriverCommand>
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(cmd) = explicit.and_then(DriverCommand::parse) {
		debug!(engine, driver = %cmd.display(), "using explicit driver command");
		return Ok(cmd);
	}

	let env_var = driver_env_var(engine);
	if let Some(cmd) = env(&env_var).as_deref().and_then(DriverCommand::parse) {
		debug!(engine, env_var, driver = %cmd.display(), "using driver from environment");
		return Ok(cmd);
	}

	let binary = driver_binary_name(engine);
	if let Some(dir) = exe_dir {
		let sibling = dir.join(&binary);
		if sibling.is_file() {
			debug!(engine, driver = %sibling.display(), "using driver next to executable");
			return Ok(DriverCommand {
				program: sibling,
				args: Vec::new(),
			});
		}
	}

	if let Ok(path) = which::which(&binary) {
		debug!(engine, driver = %path.display(), "using driver from PATH");
		return Ok(DriverCommand {
			program: path,
			args: Vec::new(),
		});
	}

	Err(Error::DriverNotFound {
		engine: engine.to_string(),
		env_var,
		binary,
	})
}
