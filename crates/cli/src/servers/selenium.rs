//! Selenium WebDriver: one driver per session, locally or against a Grid.

use harness::{Deadline, Field, Handler, Kind, Lifecycle, Operation, Problem, Schema, Violation};
use serde_json::{Map, Value};

use super::{forward, start, stop};

const BROWSERS: &[&str] = &["chrome", "firefox", "edge", "safari"];
const LOCATORS: &[&str] = &["id", "css", "xpath", "name", "className", "tagName", "linkText", "partialLinkText"];
const INPUT_LOCATORS: &[&str] = &["id", "css", "xpath", "name", "className", "tagName"];
const DRAG_LOCATORS: &[&str] = &["css", "xpath", "id"];
const ALERT_ACTIONS: &[&str] = &["accept", "dismiss", "getText", "sendKeys"];
const CONDITIONS: &[&str] = &[
	"elementVisible",
	"elementPresent",
	"elementClickable",
	"titleContains",
	"urlContains",
];

const DEFAULT_WAIT_MS: u64 = 10_000;

pub fn operations() -> Vec<Operation> {
	vec![
		Operation::new(
			"start_driver",
			"Start a Selenium WebDriver instance with optional Grid support",
			Handler::new(start),
		)
		.schema(
			Schema::new()
				.field(Field::optional("browser", Kind::Enum(BROWSERS)).with_default("chrome"))
				.field(Field::optional("headless", Kind::Boolean).with_default(true))
				.field(Field::optional("gridUrl", Kind::Url).describe("Remote Selenium Grid endpoint"))
				.field(Field::optional("capabilities", Kind::map(Kind::Any))),
		)
		.lifecycle(Lifecycle::Start),
		Operation::new(
			"navigate_to",
			"Navigate to a URL and optionally wait for an element",
			Handler::new(forward),
		)
		.schema(
			Schema::new()
				.field(Field::required("url", Kind::Url))
				.field(Field::optional("waitForElement", Kind::String).describe("CSS selector to wait for after loading"))
				.field(Field::optional("timeout", Kind::Millis).with_default(DEFAULT_WAIT_MS)),
		)
		.requires_session(),
		Operation::new(
			"find_element",
			"Find an element using various locator strategies",
			Handler::new(forward),
		)
		.schema(locator_schema(LOCATORS).field(Field::optional("timeout", Kind::Millis).with_default(DEFAULT_WAIT_MS)))
		.requires_session()
		.deadline(Deadline::FromArg("timeout")),
		// Waits for presence and then visibility, each bounded by `timeout`.
		Operation::new("click_element", "Click an element", Handler::new(forward))
			.schema(locator_schema(LOCATORS).field(Field::optional("timeout", Kind::Millis).with_default(DEFAULT_WAIT_MS)))
			.requires_session(),
		Operation::new("send_keys", "Type text into an input element", Handler::new(forward))
			.schema(
				locator_schema(INPUT_LOCATORS)
					.field(Field::required("text", Kind::String))
					.field(Field::optional("clearFirst", Kind::Boolean).with_default(false)),
			)
			.requires_session(),
		Operation::new("execute_script", "Execute JavaScript in the browser context", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("script", Kind::String))
					.field(Field::optional("args", Kind::array(Kind::Any))),
			)
			.requires_session(),
		Operation::new("take_screenshot", "Capture a screenshot", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("filePath", Kind::String))
					.field(Field::optional("fullPage", Kind::Boolean).with_default(false)),
			)
			.requires_session(),
		Operation::new("switch_to_frame", "Switch to an iframe or frame", Handler::new(forward))
			.schema(
				Schema::new().field(
					Field::required("frameIdentifier", Kind::OneOf(vec![Kind::String, Kind::Integer]))
						.describe("Frame name, id or index"),
				),
			)
			.requires_session(),
		Operation::new(
			"handle_alert",
			"Handle JavaScript alerts, confirms, and prompts",
			Handler::new(forward),
		)
		.schema(
			Schema::new()
				.field(Field::required("action", Kind::Enum(ALERT_ACTIONS)))
				.field(Field::optional("text", Kind::String).describe("Text for sendKeys"))
				.rule("text required for sendKeys", send_keys_needs_text),
		)
		.requires_session(),
		Operation::new(
			"wait_for_condition",
			"Wait for a specific condition to be met",
			Handler::new(forward),
		)
		.schema(
			Schema::new()
				.field(Field::required("condition", Kind::Enum(CONDITIONS)))
				.field(Field::required("value", Kind::String))
				.field(Field::optional("timeout", Kind::Millis).with_default(DEFAULT_WAIT_MS)),
		)
		.requires_session()
		.deadline(Deadline::FromArg("timeout")),
		Operation::new("drag_and_drop", "Perform drag and drop operation", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("sourceLocator", Kind::String))
					.field(Field::required("targetLocator", Kind::String))
					.field(Field::optional("strategy", Kind::Enum(DRAG_LOCATORS)).with_default("css")),
			)
			.requires_session(),
		Operation::new("get_cookies", "Get browser cookies", Handler::new(forward))
			.schema(Schema::new().field(Field::optional("cookieName", Kind::String)))
			.requires_session(),
		Operation::new("add_cookie", "Add a cookie to the browser", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("name", Kind::String))
					.field(Field::required("value", Kind::String))
					.field(Field::optional("domain", Kind::String))
					.field(Field::optional("path", Kind::String).with_default("/"))
					.field(Field::optional("expiry", Kind::Integer).describe("Expiry as seconds since the epoch")),
			)
			.requires_session(),
		Operation::new(
			"quit_driver",
			"Close the browser and end the WebDriver session",
			Handler::new(stop),
		)
		.requires_session()
		.lifecycle(Lifecycle::Stop),
	]
}

fn locator_schema(strategies: &'static [&'static str]) -> Schema {
	Schema::new()
		.field(Field::required("locator", Kind::String))
		.field(Field::optional("strategy", Kind::Enum(strategies)).with_default("css"))
}

fn send_keys_needs_text(args: &Map<String, Value>) -> Option<Violation> {
	let sends = args.get("action").and_then(Value::as_str) == Some("sendKeys");
	(sends && !args.contains_key("text"))
		.then(|| Violation::new("text", Problem::Malformed("required for sendKeys action".into())))
}

#[cfg(test)]
mod tests {
	use harness::testing::FakeEngine;
	use harness_protocol::ErrorCode;
	use serde_json::json;

	use crate::cli::ServerKind;
	use crate::servers::test_support::{dispatcher, err, ok};

	#[tokio::test]
	async fn start_driver_rejects_bad_grid_url() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Selenium, &engine);

		let e = err(&mut d, "start_driver", json!({"gridUrl": "grid-host/wd/hub"})).await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		assert!(engine.calls().is_empty());

		let started = ok(
			&mut d,
			"start_driver",
			json!({"gridUrl": "http://grid.local:4444/wd/hub", "capabilities": {"acceptInsecureCerts": true}}),
		)
		.await;
		assert_eq!(started["config"]["browser"], "chrome");
		assert_eq!(started["config"]["capabilities"]["acceptInsecureCerts"], true);
	}

	#[tokio::test]
	async fn locator_strategies_differ_per_operation() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Selenium, &engine);
		ok(&mut d, "start_driver", json!({})).await;

		let found = ok(&mut d, "find_element", json!({"locator": "Sign in", "strategy": "linkText"})).await;
		assert_eq!(found["args"]["timeout"], 10_000);

		let e = err(
			&mut d,
			"send_keys",
			json!({"locator": "Sign in", "strategy": "linkText", "text": "x"}),
		)
		.await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		assert!(e.to_string().contains("strategy:"), "{e}");
	}

	#[tokio::test]
	async fn send_keys_alert_needs_text() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Selenium, &engine);
		ok(&mut d, "start_driver", json!({})).await;

		let e = err(&mut d, "handle_alert", json!({"action": "sendKeys"})).await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		assert_eq!(
			e.to_error_body().details,
			Some(json!({"violations": [{"field": "text", "problem": "required for sendKeys action"}]}))
		);

		ok(&mut d, "handle_alert", json!({"action": "sendKeys", "text": "yes"})).await;
		ok(&mut d, "handle_alert", json!({"action": "accept"})).await;
	}

	#[tokio::test]
	async fn frames_accept_names_or_indexes() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Selenium, &engine);
		ok(&mut d, "start_driver", json!({})).await;

		ok(&mut d, "switch_to_frame", json!({"frameIdentifier": "checkout"})).await;
		ok(&mut d, "switch_to_frame", json!({"frameIdentifier": 2})).await;
		let e = err(&mut d, "switch_to_frame", json!({"frameIdentifier": true})).await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
	}

	#[tokio::test]
	async fn engine_errors_are_classified() {
		let engine = FakeEngine::new();
		engine.fail("find_element", "NoSuchElementError", "Unable to locate element: #missing");
		let mut d = dispatcher(ServerKind::Selenium, &engine);
		ok(&mut d, "start_driver", json!({})).await;

		let e = err(&mut d, "find_element", json!({"locator": "#missing"})).await;
		assert_eq!(e.code(), ErrorCode::OperationFailed);
		assert_eq!(e.to_error_body().details, Some(json!({"kind": "not_found"})));
		assert!(d.session().is_active(), "engine failures keep the session");
	}

	#[tokio::test]
	async fn quit_driver_requires_a_driver() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Selenium, &engine);

		let e = err(&mut d, "quit_driver", json!({})).await;
		assert_eq!(e.code(), ErrorCode::PreconditionFailed);

		ok(&mut d, "start_driver", json!({})).await;
		ok(&mut d, "add_cookie", json!({"name": "sid", "value": "abc"})).await;
		assert_eq!(ok(&mut d, "quit_driver", json!({})).await, json!({"released": true}));
		assert_eq!(engine.live(), 0);
	}
}
