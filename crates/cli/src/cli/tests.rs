use clap::Parser;

use super::*;

#[test]
fn parse_serve_with_defaults() {
	let cli = Cli::try_parse_from(vec!["harness", "serve", "playwright"]).unwrap();

	match cli.command {
		Commands::Serve { server } => assert_eq!(server, ServerKind::Playwright),
		_ => panic!("Expected Serve command"),
	}
	assert_eq!(cli.verbose, 0);
	assert_eq!(cli.engine.driver, None);
	assert_eq!(cli.engine.launch_timeout_ms, 30_000);
	assert_eq!(cli.engine.release_timeout_ms, 5_000);
	assert_eq!(cli.engine.deadline_grace_ms, 2_000);
}

#[test]
fn parse_global_options_after_subcommand() {
	let args = vec![
		"harness",
		"serve",
		"selenium",
		"-vv",
		"--driver",
		"node drivers/selenium.js",
		"--deadline-grace-ms",
		"500",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.engine.driver.as_deref(), Some("node drivers/selenium.js"));
	assert_eq!(cli.engine.deadline_grace_ms, 500);
	assert!(matches!(cli.command, Commands::Serve { server: ServerKind::Selenium }));
}

#[test]
fn parse_operations_alias() {
	let cli = Cli::try_parse_from(vec!["harness", "ops", "katalon"]).unwrap();
	assert!(matches!(cli.command, Commands::Operations { server: ServerKind::Katalon }));
}

#[test]
fn unknown_server_is_rejected() {
	let err = Cli::try_parse_from(vec!["harness", "serve", "puppeteer"]).unwrap_err();
	assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
}

#[test]
fn server_names_match_value_names() {
	for server in ServerKind::ALL {
		let value = server.to_possible_value().unwrap();
		assert_eq!(value.get_name(), server.name());
	}
}
