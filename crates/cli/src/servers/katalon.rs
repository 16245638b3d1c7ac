//! Katalon Studio project scaffolding and execution, one-shot per call.

use harness::{Field, Handler, Kind, Operation, Schema};

use super::oneshot;

const PROJECT_TYPES: &[&str] = &["Web", "API", "Mobile", "Desktop"];
const SUITE_BROWSERS: &[&str] = &["Chrome", "Firefox", "Edge", "Safari"];
const RUN_BROWSERS: &[&str] = &[
	"Chrome",
	"Firefox",
	"Edge",
	"Safari",
	"Chrome (headless)",
	"Firefox (headless)",
];
const LOCATOR_TYPES: &[&str] = &["XPATH", "CSS", "ID", "NAME", "CLASS_NAME", "TAG_NAME", "LINK_TEXT"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];
const VERIFICATION_TYPES: &[&str] = &["status", "body", "header", "json"];
const REPORT_TYPES: &[&str] = &["HTML", "PDF", "CSV", "JSON"];

fn project_path() -> Field {
	Field::required("projectPath", Kind::String).describe("Project path")
}

pub fn operations() -> Vec<Operation> {
	let test_step = Schema::new()
		.field(
			Field::required("keyword", Kind::String)
				.describe("Katalon keyword (e.g., openBrowser, click, verifyElementPresent)"),
		)
		.field(Field::optional("objectId", Kind::String).describe("Test object ID"))
		.field(Field::optional("value", Kind::String))
		.field(Field::optional("comment", Kind::String));

	let run_configuration = Schema::new()
		.field(Field::optional("browser", Kind::Enum(SUITE_BROWSERS)))
		.field(Field::optional("retryCount", Kind::Integer))
		.field(Field::optional("parallel", Kind::Boolean));

	let keyword_parameter = Schema::new()
		.field(Field::required("name", Kind::String))
		.field(Field::required("type", Kind::String))
		.field(Field::optional("description", Kind::String));

	let verification = Schema::new()
		.field(Field::required("type", Kind::Enum(VERIFICATION_TYPES)))
		.field(Field::optional("path", Kind::String).describe("JSON path or header name"))
		.field(Field::required("expected", Kind::Any));

	vec![
		Operation::new("create_project", "Create a new Katalon Studio project", Handler::new(oneshot)).schema(
			Schema::new()
				.field(Field::required("projectPath", Kind::String).describe("Path where project will be created"))
				.field(Field::required("projectName", Kind::String))
				.field(Field::optional("projectType", Kind::Enum(PROJECT_TYPES)).with_default("Web")),
		),
		Operation::new(
			"create_test_case",
			"Create a test case with Katalon keywords",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(project_path())
				.field(Field::required("testCaseName", Kind::String))
				.field(Field::optional("description", Kind::String))
				.field(Field::required("testSteps", Kind::array(Kind::Object(test_step)))),
		),
		Operation::new(
			"create_test_suite",
			"Create a test suite with multiple test cases",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(project_path())
				.field(Field::required("suiteName", Kind::String))
				.field(Field::required("testCases", Kind::array(Kind::String)).describe("Array of test case paths"))
				.field(Field::optional("runConfiguration", Kind::Object(run_configuration))),
		),
		Operation::new(
			"create_test_object",
			"Create a test object (web element locator)",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(project_path())
				.field(Field::required("objectName", Kind::String))
				.field(Field::required("locatorType", Kind::Enum(LOCATOR_TYPES)))
				.field(Field::required("locatorValue", Kind::String))
				.field(Field::optional("description", Kind::String)),
		),
		Operation::new("run_test", "Execute a test case or test suite", Handler::new(oneshot)).schema(
			Schema::new()
				.field(project_path())
				.field(Field::required("testPath", Kind::String).describe("Path to test case or suite"))
				.field(Field::optional("browser", Kind::Enum(RUN_BROWSERS)).with_default("Chrome"))
				.field(Field::optional("reportFolder", Kind::String)),
		),
		Operation::new(
			"generate_custom_keyword",
			"Generate a custom keyword for reuse",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(Field::required("keywordName", Kind::String))
				.field(Field::required("description", Kind::String))
				.field(Field::required("parameters", Kind::array(Kind::Object(keyword_parameter))))
				.field(Field::required("implementation", Kind::String).describe("Groovy code implementation")),
		),
		Operation::new("create_api_test", "Create an API test request", Handler::new(oneshot)).schema(
			Schema::new()
				.field(project_path())
				.field(Field::required("requestName", Kind::String))
				.field(Field::required("method", Kind::Enum(HTTP_METHODS)))
				.field(Field::required("endpoint", Kind::String))
				.field(Field::optional("headers", Kind::map(Kind::String)))
				.field(Field::optional("body", Kind::String).describe("Request body (JSON string)"))
				.field(Field::optional("verification", Kind::array(Kind::Object(verification)))),
		),
		Operation::new("generate_report", "Generate test execution report", Handler::new(oneshot)).schema(
			Schema::new()
				.field(project_path())
				.field(Field::optional("reportType", Kind::Enum(REPORT_TYPES)).with_default("HTML"))
				.field(Field::optional("includeScreenshots", Kind::Boolean).with_default(true)),
		),
	]
}

#[cfg(test)]
mod tests {
	use harness::testing::FakeEngine;
	use harness_protocol::ErrorCode;
	use serde_json::json;

	use crate::cli::ServerKind;
	use crate::servers::registry;
	use crate::servers::test_support::{dispatcher, err, ok};

	#[tokio::test]
	async fn test_steps_are_validated_and_forwarded() {
		let engine = FakeEngine::new();
		engine.reply("create_test_case", json!({"path": "/p/Test Cases/Login.tc"}));
		let mut d = dispatcher(ServerKind::Katalon, &engine);

		let created = ok(
			&mut d,
			"create_test_case",
			json!({
				"projectPath": "/p",
				"testCaseName": "Login",
				"testSteps": [{"keyword": "openBrowser"}, {"keyword": "click", "objectId": "btn_login"}],
			}),
		)
		.await;
		assert_eq!(created, json!({"path": "/p/Test Cases/Login.tc"}));

		let e = err(
			&mut d,
			"create_test_case",
			json!({"projectPath": "/p", "testCaseName": "Login", "testSteps": [{"objectId": "x"}]}),
		)
		.await;
		assert!(e.to_string().contains("testSteps[0].keyword: is required"), "{e}");
	}

	#[tokio::test]
	async fn headers_must_be_strings() {
		let engine = FakeEngine::new();
		let mut d = dispatcher(ServerKind::Katalon, &engine);

		let e = err(
			&mut d,
			"create_api_test",
			json!({
				"projectPath": "/p",
				"requestName": "ping",
				"method": "GET",
				"endpoint": "https://api.test/ping",
				"headers": {"X-Retry": 3},
			}),
		)
		.await;
		assert_eq!(e.code(), ErrorCode::InvalidArguments);
		assert!(e.to_string().contains("headers.X-Retry"), "{e}");
	}

	#[test]
	fn catalog_marks_nothing_as_session_bound() {
		let registry = registry(ServerKind::Katalon).unwrap();
		let catalog = registry.catalog();
		let report = catalog.get("generate_report").unwrap();
		assert!(!report.requires_session);
		assert_eq!(report.input_schema["required"], json!(["projectPath"]));
		assert_eq!(report.input_schema["properties"]["reportType"]["default"], "HTML");
	}
}
