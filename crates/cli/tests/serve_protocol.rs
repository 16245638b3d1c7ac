use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn harness_binary() -> PathBuf {
	let mut path = std::env::current_exe().unwrap();
	path.pop();
	path.pop();
	path.push("harness");
	path
}

/// Feeds `lines` to `harness serve <args>` and waits for it to exit.
fn serve(args: &[&str], lines: &[&str]) -> Output {
	let mut child = Command::new(harness_binary())
		.arg("serve")
		.args(args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to start harness serve");

	{
		let stdin = child.stdin.as_mut().unwrap();
		for line in lines {
			writeln!(stdin, "{line}").unwrap();
		}
	}
	drop(child.stdin.take());

	child.wait_with_output().unwrap()
}

fn responses(output: &Output) -> Vec<Value> {
	String::from_utf8_lossy(&output.stdout)
		.lines()
		.map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("stdout line is not JSON ({e}): {line}")))
		.collect()
}

#[test]
fn operations_command_prints_catalog() {
	let output = Command::new(harness_binary()).args(["operations", "playwright"]).output().unwrap();
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

	let catalog: Value = serde_json::from_slice(&output.stdout).unwrap();
	assert_eq!(catalog["server"], "playwright");
	let ops = catalog["operations"].as_array().unwrap();
	let find = |name: &str| ops.iter().find(|op| op["name"] == name).unwrap().clone();

	assert_eq!(find("launch_browser")["requiresSession"], false);
	assert_eq!(find("click")["requiresSession"], true);
	assert_eq!(find("navigate")["inputSchema"]["required"], serde_json::json!(["url"]));
	assert!(ops.iter().any(|op| op["name"] == "list_operations"));
}

#[test]
fn missing_driver_is_reported_per_request() {
	let output = serve(
		&["selenium", "--driver", "/nonexistent/harness-driver-selenium"],
		&[
			r#"{"id":1,"op":"frobnicate"}"#,
			r#"{"id":2,"op":"list_operations"}"#,
			r#"{"id":3,"op":"start_driver","args":{"browser":"firefox"}}"#,
			r##"{"id":4,"op":"click_element","args":{"locator":"#go"}}"##,
		],
	);
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

	let responses = responses(&output);
	assert_eq!(responses.len(), 4);
	assert_eq!(responses[0]["error"]["code"], "UNKNOWN_OPERATION");
	assert_eq!(responses[1]["ok"], true);
	assert_eq!(responses[1]["data"]["server"], "selenium");
	assert_eq!(responses[2]["id"], 3);
	assert_eq!(responses[2]["error"]["code"], "RESOURCE_ERROR");
	assert_eq!(responses[3]["error"]["code"], "PRECONDITION_FAILED");
	for response in &responses {
		assert_eq!(response["schemaVersion"], 1);
	}
}

#[test]
fn malformed_lines_do_not_stop_the_server() {
	let output = serve(
		&["katalon", "--driver", "/nonexistent/harness-driver-katalon"],
		&["{not json", "", r#"{"id":"a","op":"create_project","args":{"projectName":"demo"}}"#],
	);
	assert!(output.status.success());

	let responses = responses(&output);
	assert_eq!(responses.len(), 2);
	assert_eq!(responses[0]["error"]["code"], "PARSE_ERROR");
	assert_eq!(responses[0]["op"], "unknown");
	assert_eq!(responses[1]["id"], "a");
	assert_eq!(responses[1]["error"]["code"], "INVALID_ARGUMENTS");
	assert_eq!(
		responses[1]["error"]["details"]["violations"][0]["field"],
		"projectPath"
	);
}

#[test]
fn shutdown_ends_the_stream() {
	let output = serve(
		&["cypress", "--driver", "/nonexistent/harness-driver-cypress"],
		&[
			r#"{"id":1,"op":"shutdown"}"#,
			r#"{"id":2,"op":"list_operations"}"#,
		],
	);
	assert!(output.status.success());

	let responses = responses(&output);
	assert_eq!(responses.len(), 1);
	assert_eq!(responses[0]["data"], serde_json::json!({"released": false}));
}

#[test]
fn diagnostics_stay_on_stderr() {
	let output = serve(
		&["devtools", "--driver", "/nonexistent/harness-driver-devtools"],
		&[r#"{"op":"get_console_logs"}"#],
	);
	assert!(output.status.success());

	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("ready"), "missing readiness line: {stderr}");
	assert_eq!(responses(&output).len(), 1);
}

/// `cat` echoes every driver request back, which reads as a reply with a
/// matching id and a null result.
#[cfg(unix)]
#[test]
fn session_lifecycle_with_echo_driver() {
	let output = serve(
		&["playwright", "--driver", "cat"],
		&[
			r#"{"id":1,"op":"launch_browser","args":{"headless":true}}"#,
			r#"{"id":2,"op":"click","args":{"selector":"button"}}"#,
			r#"{"id":3,"op":"get_events","args":{"kind":"network"}}"#,
			r#"{"id":4,"op":"close_browser"}"#,
			r#"{"id":5,"op":"click","args":{"selector":"button"}}"#,
		],
	);
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

	let responses = responses(&output);
	assert_eq!(responses.len(), 5);
	assert_eq!(responses[0]["data"]["session"], "playwright#1");
	assert_eq!(responses[1]["ok"], true);
	assert_eq!(responses[1]["data"], Value::Null);
	assert_eq!(responses[2]["data"]["count"], 0);
	assert_eq!(responses[3]["data"]["released"], true);
	assert_eq!(responses[4]["error"]["code"], "PRECONDITION_FAILED");
}
