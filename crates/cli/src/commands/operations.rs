use anyhow::{Context, Result};

use crate::cli::ServerKind;
use crate::servers;

/// Prints the `list_operations` payload for `server` without starting an engine.
pub fn run(server: ServerKind) -> Result<()> {
	let registry = servers::registry(server).context("failed to build operation catalog")?;
	let json = serde_json::to_string_pretty(&registry.catalog())?;
	println!("{json}");
	Ok(())
}
