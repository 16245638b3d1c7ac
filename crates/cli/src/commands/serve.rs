use anyhow::{Context, Result};
use harness::{Dispatcher, Session, Shell};
use tokio::io::BufReader;
use tracing::{debug, warn};

use crate::config::ServeConfig;
use crate::servers;

/// Serves stdin/stdout until end of input, `shutdown`, or Ctrl-C.
pub async fn run(config: ServeConfig) -> Result<()> {
	let registry = servers::registry(config.server).context("failed to build operation catalog")?;
	let dispatcher = Dispatcher::new(registry, Session::new(config.engine())).with_deadline_grace(config.deadline_grace);

	let input = BufReader::new(tokio::io::stdin());
	let output = tokio::io::stdout();
	let exit = Shell::new(dispatcher, input, output)
		.run_until(interrupted())
		.await
		.context("serve loop failed")?;

	debug!(server = config.server.name(), ?exit, "serve finished");
	Ok(())
}

async fn interrupted() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!(error = %e, "cannot listen for Ctrl-C; relying on end of input");
		std::future::pending::<()>().await;
	}
}
