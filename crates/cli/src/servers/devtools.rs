//! Chrome DevTools Protocol: profiling, coverage and emulation on one
//! Chromium session.
//!
//! The engine reports traffic into the `network` buffer and page console
//! output into the `console` buffer; `analyze_network` and
//! `get_console_logs` summarize those locally without a round trip.

use std::collections::BTreeMap;

use harness::{Args, BoxFut, Deadline, Field, Handler, Kind, Lifecycle, OpCtx, OpError, OpResult, Operation, Problem, Schema, Violation};
use regex::Regex;
use serde_json::{Map, Value, json};
use url::Url;

use super::{forward, start, stop};

pub const NETWORK: &str = "network";
pub const CONSOLE: &str = "console";

const COVERAGE_TYPES: &[&str] = &["css", "js", "both"];
const CONSOLE_LEVELS: &[&str] = &["log", "info", "warn", "error", "all"];

const LIGHTHOUSE_NOTICE: &str =
	"Lighthouse audit requires additional configuration. Use get_performance_metrics for basic performance data.";

pub fn operations() -> Vec<Operation> {
	vec![
		Operation::new(
			"connect_chrome",
			"Connect to Chrome/Chromium with DevTools Protocol",
			Handler::new(start),
		)
		.schema(
			Schema::new()
				.field(
					Field::optional("executablePath", Kind::String)
						.describe("Path to a Chrome executable; the driver's bundled Chromium when omitted"),
				)
				.field(Field::optional("headless", Kind::Boolean).with_default(true))
				.field(Field::optional("devtools", Kind::Boolean).with_default(false)),
		)
		.lifecycle(Lifecycle::Start),
		Operation::new("navigate_to", "Navigate to a URL", Handler::new(forward))
			.schema(Schema::new().field(Field::required("url", Kind::Url)))
			.requires_session(),
		Operation::new(
			"start_performance_profile",
			"Start performance profiling (CPU, memory, rendering)",
			Handler::new(forward),
		)
		.schema(
			Schema::new()
				.field(
					Field::optional("duration", Kind::Millis)
						.with_default(5_000)
						.describe("Capture length in milliseconds"),
				)
				.field(Field::optional("categories", Kind::array(Kind::String)).describe("Tracing categories")),
		)
		.requires_session()
		.deadline(Deadline::FromArg("duration")),
		Operation::new("get_performance_metrics", "Get current performance metrics", Handler::new(forward))
			.requires_session(),
		Operation::new("start_coverage", "Start CSS/JS coverage tracking", Handler::new(forward))
			.schema(Schema::new().field(Field::optional("type", Kind::Enum(COVERAGE_TYPES)).with_default("both")))
			.requires_session(),
		Operation::new("stop_coverage", "Stop coverage and get report", Handler::new(forward)).requires_session(),
		Operation::new("analyze_network", "Get network request analysis", Handler::new(analyze_network)).schema(
			Schema::new()
				.field(Field::optional("filter", Kind::String).describe("Filter URLs (regex pattern)"))
				.rule("filter must compile", filter_compiles),
		),
		Operation::new("get_console_logs", "Get console logs from the page", Handler::new(get_console_logs))
			.schema(Schema::new().field(Field::optional("level", Kind::Enum(CONSOLE_LEVELS)).with_default("all"))),
		Operation::new("emulate_device", "Emulate a specific device or viewport", Handler::new(forward))
			.schema(
				Schema::new()
					.field(Field::required("device", Kind::String).describe("Device name, e.g. iPhone 13"))
					.field(Field::optional(
						"viewport",
						Kind::Object(
							Schema::new()
								.field(Field::required("width", Kind::Integer))
								.field(Field::required("height", Kind::Integer))
								.field(Field::optional("deviceScaleFactor", Kind::Number).with_default(1))
								.field(Field::optional("isMobile", Kind::Boolean).with_default(false)),
						),
					)),
			)
			.requires_session(),
		Operation::new(
			"throttle_network",
			"Throttle network to simulate slow connections",
			Handler::new(forward),
		)
		.schema(
			Schema::new()
				.field(Field::optional("offline", Kind::Boolean).with_default(false))
				.field(Field::optional("downloadThroughput", Kind::Number).with_default(-1))
				.field(Field::optional("uploadThroughput", Kind::Number).with_default(-1))
				.field(Field::optional("latency", Kind::Number).with_default(0)),
		)
		.requires_session(),
		Operation::new("get_accessibility_tree", "Get accessibility tree for the page", Handler::new(forward))
			.requires_session(),
		Operation::new("lighthouse_audit", "Run Lighthouse performance audit", Handler::new(lighthouse_audit)).schema(
			Schema::new()
				.field(Field::optional("url", Kind::Url))
				.field(
					Field::optional("categories", Kind::array(Kind::String))
						.describe("Categories: performance, accessibility, best-practices, seo, pwa"),
				),
		),
		Operation::new("disconnect", "Disconnect from Chrome", Handler::new(stop)).lifecycle(Lifecycle::Stop),
	]
}

fn filter_compiles(args: &Map<String, Value>) -> Option<Violation> {
	let pattern = args.get("filter").and_then(Value::as_str)?;
	Regex::new(pattern)
		.err()
		.map(|e| Violation::new("filter", Problem::Malformed(format!("invalid regex: {e}"))))
}

fn analyze_network(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let filter = args
			.str("filter")
			.map(Regex::new)
			.transpose()
			.map_err(|e| OpError::failed(format!("invalid filter: {e}")))?;
		Ok(summarize_requests(ctx.session().events(NETWORK), filter.as_ref()))
	})
}

/// Request count, per-method histogram and distinct hosts in first-seen order.
fn summarize_requests(requests: &[Value], filter: Option<&Regex>) -> Value {
	let mut total = 0usize;
	let mut methods: BTreeMap<&str, usize> = BTreeMap::new();
	let mut domains: Vec<String> = Vec::new();

	for request in requests {
		let url = request.get("url").and_then(Value::as_str).unwrap_or_default();
		if filter.is_some_and(|re| !re.is_match(url)) {
			continue;
		}
		total += 1;

		let method = request.get("method").and_then(Value::as_str).unwrap_or("UNKNOWN");
		*methods.entry(method).or_default() += 1;

		let host = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_owned));
		if let Some(host) = host.filter(|h| !domains.contains(h)) {
			domains.push(host);
		}
	}

	json!({ "totalRequests": total, "methods": methods, "domains": domains })
}

fn get_console_logs(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let level = args.str("level").unwrap_or("all").to_string();
		let logs: Vec<&Value> = ctx
			.session()
			.events(CONSOLE)
			.iter()
			.filter(|entry| level == "all" || entry.get("type").and_then(Value::as_str) == Some(level.as_str()))
			.collect();
		Ok(json!({ "level": level, "count": logs.len(), "logs": logs }))
	})
}

fn lighthouse_audit(_args: Args, _ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move { Ok(json!({ "supported": false, "message": LIGHTHOUSE_NOTICE })) })
}
