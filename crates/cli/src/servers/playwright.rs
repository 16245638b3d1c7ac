//! Playwright browser automation: one browser/page per session, network
//! recording into the `network` buffer.

use harness::{Args, BoxFut, Deadline, Field, Handler, Kind, Lifecycle, OpCtx, OpResult, Operation, Schema};
use serde_json::json;

use super::{forward, start, stop};

pub const NETWORK: &str = "network";

const BROWSERS: &[&str] = &["chromium", "firefox", "webkit"];
const WAIT_UNTIL: &[&str] = &["load", "domcontentloaded", "networkidle"];
const SELECTOR_STATES: &[&str] = &["attached", "detached", "visible", "hidden"];
const IMAGE_TYPES: &[&str] = &["png", "jpeg"];
const PAPER_FORMATS: &[&str] = &["Letter", "A4"];

pub fn operations() -> Vec<Operation> {
	vec![
		Operation::new(
			"launch_browser",
			"Launch a browser instance (chromium, firefox, or webkit)",
			Handler::new(start),
		)
		.schema(
			Schema::new()
				.field(Field::optional("browserType", Kind::Enum(BROWSERS)).with_default("chromium"))
				.field(Field::optional("headless", Kind::Boolean).with_default(true))
				.field(Field::optional("slowMo", Kind::Number).describe("Delay between actions in milliseconds")),
		)
		.lifecycle(Lifecycle::Start),
		Operation::new("navigate", "Navigate to a URL", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("url", Kind::Url))
					.field(Field::optional("waitUntil", Kind::Enum(WAIT_UNTIL)).with_default("load"))
					.field(Field::optional("timeout", Kind::Millis).with_default(30_000)),
			)
			.requires_session()
			.deadline(Deadline::FromArg("timeout")),
		Operation::new("click", "Click an element", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("selector", Kind::String))
					.field(Field::optional("timeout", Kind::Millis).with_default(30_000))
					.field(Field::optional("force", Kind::Boolean).with_default(false)),
			)
			.requires_session()
			.deadline(Deadline::FromArg("timeout")),
		Operation::new("type_text", "Type text into an input field", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("selector", Kind::String))
					.field(Field::required("text", Kind::String))
					.field(
						Field::optional("delay", Kind::Integer)
							.with_default(0)
							.describe("Delay between key presses in milliseconds"),
					),
			)
			.requires_session(),
		Operation::new("screenshot", "Take a screenshot of the current page", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("path", Kind::String))
					.field(Field::optional("fullPage", Kind::Boolean).with_default(false))
					.field(Field::optional("type", Kind::Enum(IMAGE_TYPES)).with_default("png")),
			)
			.requires_session(),
		Operation::new("evaluate", "Execute JavaScript in the page context", Handler::new(forward))
			.schema(Schema::new().field(Field::required("script", Kind::String)))
			.requires_session(),
		Operation::new("wait_for_selector", "Wait for a selector to appear", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("selector", Kind::String))
					.field(Field::optional("state", Kind::Enum(SELECTOR_STATES)).with_default("visible"))
					.field(Field::optional("timeout", Kind::Millis).with_default(30_000)),
			)
			.requires_session()
			.deadline(Deadline::FromArg("timeout")),
		Operation::new("get_page_content", "Get the HTML content of the current page", Handler::new(forward))
			.requires_session(),
		Operation::new("get_page_title", "Get the title of the current page", Handler::new(forward))
			.requires_session(),
		Operation::new("generate_pdf", "Generate a PDF of the current page", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("path", Kind::String))
					.field(Field::optional("format", Kind::Enum(PAPER_FORMATS)).with_default("A4"))
					.field(Field::optional("printBackground", Kind::Boolean).with_default(true)),
			)
			.requires_session(),
		Operation::new(
			"record_network",
			"Enable or disable network request recording",
			Handler::new(record_network),
		)
		.schema(Schema::new().field(Field::required("enable", Kind::Boolean)))
		.requires_session(),
		Operation::new("get_network_logs", "Get recorded network requests", Handler::new(get_network_logs)),
		Operation::new("close_browser", "Close the browser instance", Handler::new(stop)).lifecycle(Lifecycle::Stop),
	]
}

/// Enabling starts a fresh recording once the engine accepts the toggle.
fn record_network(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let enable = args.bool("enable").unwrap_or_default();
		ctx.forward(&args).await?;
		if enable {
			ctx.session().clear_events(Some(NETWORK));
		}
		Ok(json!({ "recording": enable }))
	})
}

fn get_network_logs(_args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let requests = ctx.session().events(NETWORK);
		Ok(json!({ "count": requests.len(), "requests": requests }))
	})
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use harness::testing::FakeEngine;
	use harness_protocol::ErrorCode;
	use serde_json::json;

	use super::*;
	use crate::cli::ServerKind;
	use crate::servers::test_support::{dispatcher, err, ok};

	#[tokio::test]
	async fn launch_applies_defaults_to_engine_config() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Playwright, &engine);

		let launched = ok(&mut d, "launch_browser", json!({"headless": false})).await;
		assert_eq!(launched["session"], "fake#1");
		assert_eq!(
			launched["config"],
			json!({"browserType": "chromium", "headless": false})
		);

		let echoed = ok(&mut d, "navigate", json!({"url": "https://example.com"})).await;
		assert_eq!(
			echoed["args"],
			json!({"url": "https://example.com", "waitUntil": "load", "timeout": 30000})
		);
		assert_eq!(echoed["config"]["browserType"], "chromium");
	}

	#[tokio::test]
	async fn page_operations_need_a_browser() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Playwright, &engine);

		let e = err(&mut d, "click", json!({"selector": "#go"})).await;
		assert_eq!(e.code(), ErrorCode::PreconditionFailed);
		assert_eq!(e.to_string(), "'click' requires an active session; call launch_browser first");
		assert!(engine.calls().is_empty());
	}

	#[tokio::test]
	async fn rejects_relative_urls_and_unknown_wait_states() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Playwright, &engine);
		ok(&mut d, "launch_browser", json!({})).await;

		let e = err(&mut d, "navigate", json!({"url": "/login", "waitUntil": "idle"})).await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		let message = e.to_string();
		assert!(message.contains("url:"), "{message}");
		assert!(message.contains("waitUntil:"), "{message}");
		assert_eq!(engine.calls(), ["acquire(fake#1)"]);
	}

	#[tokio::test]
	async fn navigate_deadline_follows_timeout_argument() {
		let engine = FakeEngine::new();
		engine.stall("navigate", Duration::from_secs(60));
		let mut d = dispatcher(ServerKind::Playwright, &engine);
		ok(&mut d, "launch_browser", json!({})).await;

		let e = err(&mut d, "navigate", json!({"url": "https://slow.test", "timeout": 50})).await;
		assert_eq!(e.code(), ErrorCode::Timeout);
		assert_eq!(e.to_error_body().details, Some(json!({"timeoutMs": 70})));

		let e = err(&mut d, "navigate", json!({"url": "https://slow.test", "timeout": -1})).await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		assert!(e.to_string().contains("timeout: must not be negative"), "{e}");
	}

	#[tokio::test]
	async fn network_recording_collects_and_resets_buffer() {
		let engine = FakeEngine::new();
		engine.emit("navigate", NETWORK, json!({"url": "https://a.test/", "method": "GET", "status": 200}));
		let mut d = dispatcher(ServerKind::Playwright, &engine);

		let logs = ok(&mut d, "get_network_logs", json!({})).await;
		assert_eq!(logs, json!({"count": 0, "requests": []}));

		ok(&mut d, "launch_browser", json!({})).await;
		ok(&mut d, "record_network", json!({"enable": true})).await;
		ok(&mut d, "navigate", json!({"url": "https://a.test/"})).await;
		ok(&mut d, "navigate", json!({"url": "https://a.test/"})).await;
		assert_eq!(ok(&mut d, "get_network_logs", json!({})).await["count"], 2);

		let toggled = ok(&mut d, "record_network", json!({"enable": true})).await;
		assert_eq!(toggled, json!({"recording": true}));
		assert_eq!(ok(&mut d, "get_network_logs", json!({})).await["count"], 0);
	}

	#[tokio::test]
	async fn rejected_recording_toggle_keeps_captured_requests() {
		let engine = FakeEngine::new();
		engine.emit("navigate", NETWORK, json!({"url": "https://a.test/", "method": "GET", "status": 200}));
		engine.fail("record_network", "Error", "page crashed");
		let mut d = dispatcher(ServerKind::Playwright, &engine);
		ok(&mut d, "launch_browser", json!({})).await;
		ok(&mut d, "navigate", json!({"url": "https://a.test/"})).await;

		let e = err(&mut d, "record_network", json!({"enable": true})).await;
		assert_eq!(e.code(), ErrorCode::OperationFailed);

		let logs = ok(&mut d, "get_network_logs", json!({})).await;
		assert_eq!(logs["count"], 1);
		assert_eq!(logs["requests"][0]["url"], "https://a.test/");
	}

	#[tokio::test]
	async fn close_browser_is_idempotent() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Playwright, &engine);

		assert_eq!(ok(&mut d, "close_browser", json!({})).await, json!({"released": false}));
		ok(&mut d, "launch_browser", json!({})).await;
		assert_eq!(ok(&mut d, "close_browser", json!({})).await, json!({"released": true}));
		assert_eq!(engine.live(), 0);
	}

	#[tokio::test]
	async fn relaunch_replaces_browser() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Playwright, &engine);

		ok(&mut d, "launch_browser", json!({})).await;
		let second = ok(&mut d, "launch_browser", json!({"browserType": "webkit"})).await;
		assert_eq!(second["session"], "fake#2");
		assert_eq!(engine.calls(), ["acquire(fake#1)", "release(fake#1)", "acquire(fake#2)"]);
		assert_eq!(engine.live(), 1);
	}
}
