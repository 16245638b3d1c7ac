//! Driver process lifecycle.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::driver::DriverCommand;
use crate::error::{Error, Result};

/// A spawned driver child process with its stdio pipes detached.
#[derive(Debug)]
pub struct DriverProcess {
	child: Child,
}

impl DriverProcess {
	/// Spawns the driver.
	///
	/// stdin/stdout are piped for the protocol; stderr is inherited so driver
	/// diagnostics land on the server's own diagnostic stream.
	///
	/// # Errors
	///
	/// Returns [`Error::LaunchFailed`] if the process cannot be spawned or
	/// exits immediately.
	pub async fn spawn(command: &DriverCommand) -> Result<(Self, ChildStdin, BufReader<ChildStdout>)> {
		let mut cmd = Command::new(&command.program);
		cmd.args(&command.args)
			.env("HARNESS_PROTOCOL", "jsonl")
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true);

		let mut child = cmd
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("failed to spawn '{}': {e}", command.display())))?;

		// Give an immediately failing driver a moment to exit so the error is attributable.
		tokio::time::sleep(Duration::from_millis(50)).await;
		match child.try_wait() {
			Ok(Some(status)) => {
				return Err(Error::LaunchFailed(format!(
					"driver '{}' exited immediately with status: {status}",
					command.display()
				)));
			}
			Ok(None) => {}
			Err(e) => {
				return Err(Error::LaunchFailed(format!("failed to check driver status: {e}")));
			}
		}

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdin not captured".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdout not captured".to_string()))?;

		debug!(driver = %command.display(), pid = ?child.id(), "driver process started");
		Ok((Self { child }, stdin, BufReader::new(stdout)))
	}

	pub fn pid(&self) -> Option<u32> {
		self.child.id()
	}

	/// Waits up to `grace` for the driver to exit on its own, then kills it.
	pub async fn shutdown(mut self, grace: Duration) -> Result<()> {
		match tokio::time::timeout(grace, self.child.wait()).await {
			Ok(Ok(status)) => {
				debug!(%status, "driver process exited");
				Ok(())
			}
			Ok(Err(e)) => Err(Error::Io(e)),
			Err(_) => {
				warn!(pid = ?self.child.id(), "driver did not exit in time; killing");
				self.child.kill().await?;
				Ok(())
			}
		}
	}
}
