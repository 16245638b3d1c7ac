//! Subcommand implementations.

pub mod operations;
pub mod serve;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::config::ServeConfig;

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Serve { server } => serve::run(ServeConfig::new(server, &cli.engine)).await,
		Commands::Operations { server } => operations::run(server),
	}
}
