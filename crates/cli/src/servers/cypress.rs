//! Cypress test runner. Every operation is a self-contained job on a
//! transient engine instance; there is no long-lived session.

use harness::{Field, Handler, Kind, Operation, Schema};

use super::oneshot;

const RUN_BROWSERS: &[&str] = &["chrome", "firefox", "edge", "electron"];
const COMPONENT_BROWSERS: &[&str] = &["chrome", "firefox", "edge"];
const TEST_TYPES: &[&str] = &["e2e", "component", "api"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

pub fn operations() -> Vec<Operation> {
	vec![
		Operation::new(
			"init_cypress",
			"Initialize Cypress configuration and project structure",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(Field::required("projectPath", Kind::String).describe("Path to the project directory"))
				.field(Field::optional("baseUrl", Kind::Url).describe("Base URL for E2E tests"))
				.field(Field::optional("viewportWidth", Kind::Integer).with_default(1280))
				.field(Field::optional("viewportHeight", Kind::Integer).with_default(720)),
		),
		Operation::new("run_test", "Run a Cypress test spec file", Handler::new(oneshot)).schema(
			Schema::new()
				.field(Field::required("specPath", Kind::String).describe("Path to the spec file"))
				.field(Field::optional("browser", Kind::Enum(RUN_BROWSERS)).with_default("chrome"))
				.field(Field::optional("headless", Kind::Boolean).with_default(true))
				.field(Field::optional("config", Kind::map(Kind::Any)).describe("Additional Cypress configuration")),
		),
		Operation::new(
			"create_test",
			"Create a new Cypress test file with template",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(Field::required("testName", Kind::String))
				.field(Field::required("testPath", Kind::String).describe("Path where test file should be created"))
				.field(Field::optional("testType", Kind::Enum(TEST_TYPES)).with_default("e2e"))
				.field(Field::optional("baseUrl", Kind::Url)),
		),
		Operation::new("run_component_test", "Run Cypress component tests", Handler::new(oneshot)).schema(
			Schema::new()
				.field(Field::required("componentPath", Kind::String))
				.field(Field::optional("browser", Kind::Enum(COMPONENT_BROWSERS)).with_default("chrome"))
				.field(Field::optional("headless", Kind::Boolean).with_default(true)),
		),
		Operation::new(
			"create_api_test",
			"Create and run an API test using cy.request()",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(Field::required("name", Kind::String))
				.field(Field::required("endpoint", Kind::String).describe("API endpoint URL"))
				.field(Field::optional("method", Kind::Enum(HTTP_METHODS)).with_default("GET"))
				.field(
					Field::optional(
						"assertions",
						Kind::array(Kind::Object(
							Schema::new()
								.field(Field::required("type", Kind::String))
								.field(Field::required("value", Kind::Any)),
						)),
					)
					.describe("Assertions to validate response"),
				),
		),
		Operation::new(
			"visual_regression_test",
			"Capture screenshot and compare with baseline",
			Handler::new(oneshot),
		)
		.schema(
			Schema::new()
				.field(Field::required("testName", Kind::String))
				.field(Field::required("screenshotName", Kind::String))
				.field(Field::optional("compareToBaseline", Kind::Boolean).with_default(true)),
		),
	]
}
