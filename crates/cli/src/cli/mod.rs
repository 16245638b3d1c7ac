#[cfg(test)]
mod tests;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Root CLI.
#[derive(Parser, Debug)]
#[command(name = "harness")]
#[command(about = "Line-oriented command servers for browser and test automation engines")]
#[command(version)]
#[command(styles = styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug); logs go to stderr
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(flatten)]
	pub engine: EngineArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Driver and timing options shared by every server.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
	/// Driver command line; overrides HARNESS_<SERVER>_DRIVER and PATH lookup
	#[arg(long, global = true, value_name = "COMMAND")]
	pub driver: Option<String>,

	/// Upper bound for starting an engine instance
	#[arg(long, global = true, value_name = "MS", default_value_t = 30_000)]
	pub launch_timeout_ms: u64,

	/// Upper bound for tearing an engine instance down before it is killed
	#[arg(long, global = true, value_name = "MS", default_value_t = 5_000)]
	pub release_timeout_ms: u64,

	/// Slack added to deadlines derived from timeout arguments
	#[arg(long, global = true, value_name = "MS", default_value_t = 2_000)]
	pub deadline_grace_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Serve requests from stdin, one JSON request per line
	Serve {
		#[arg(value_enum)]
		server: ServerKind,
	},

	/// Print a server's operation catalog as JSON and exit
	#[command(alias = "ops")]
	Operations {
		#[arg(value_enum)]
		server: ServerKind,
	},
}

/// The command servers this binary can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ServerKind {
	/// Playwright browser automation
	Playwright,
	/// Selenium WebDriver, local or Grid
	Selenium,
	/// Chrome DevTools Protocol profiling and emulation
	Devtools,
	/// Cypress test runner
	Cypress,
	/// Katalon Studio projects
	Katalon,
}

impl ServerKind {
	pub const ALL: [ServerKind; 5] = [
		ServerKind::Playwright,
		ServerKind::Selenium,
		ServerKind::Devtools,
		ServerKind::Cypress,
		ServerKind::Katalon,
	];

	/// Name used on the wire, in driver discovery and in logs.
	pub fn name(self) -> &'static str {
		match self {
			ServerKind::Playwright => "playwright",
			ServerKind::Selenium => "selenium",
			ServerKind::Devtools => "devtools",
			ServerKind::Cypress => "cypress",
			ServerKind::Katalon => "katalon",
		}
	}
}

/// Help colors in cargo's style.
fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.error(AnsiColor::Red.on_default().bold())
}
