use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber. Stdout carries responses only.
pub fn init_logging(verbosity: u8) {
	// 0 = readiness and lifecycle transitions from our crates, warnings from the rest
	// 1 (-v) = info everywhere
	// 2+ (-vv) = debug, including per-request dispatch timings
	let filter = match verbosity {
		0 => "warn,harness=info",
		1 => "info",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.with_ansi(false)
		.compact()
		.init();
}
