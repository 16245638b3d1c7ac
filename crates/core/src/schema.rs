//! Declarative argument contracts.
//!
//! A [`Schema`] lists the fields an operation accepts. [`Schema::validate`]
//! turns a raw argument bag into normalized [`Args`]:
//!
//! - absent optional fields receive their declared default
//! - fields the schema does not name are dropped
//! - every violation is collected, not just the first
//!
//! There is no implicit coercion: `"5"` is not a number and `null` is a value
//! of its own, never an absent field.


use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;

use crate::args::Args;

/// Accepted shape of one value.
#[derive(Debug, Clone)]
pub enum Kind {
	String,
	/// Absolute URL string.
	Url,
	Number,
	/// Number without a fractional part.
	Integer,
	/// Non-negative integer count of milliseconds.
	Millis,
	Boolean,
	/// String restricted to a fixed set.
	Enum(&'static [&'static str]),
	Array(Box<Kind>),
	/// Nested object validated by its own schema.
	Object(Schema),
	/// Object with arbitrary keys whose values share one kind.
	Map(Box<Kind>),
	/// First alternative that validates wins.
	OneOf(Vec<Kind>),
	Any,
}

impl Kind {
	pub fn array(items: Kind) -> Self {
		Kind::Array(Box::new(items))
	}

	pub fn map(values: Kind) -> Self {
		Kind::Map(Box::new(values))
	}

	fn describe(&self) -> String {
		match self {
			Kind::String => "string".into(),
			Kind::Url => "url".into(),
			Kind::Number => "number".into(),
			Kind::Integer => "integer".into(),
			Kind::Millis => "non-negative integer".into(),
			Kind::Boolean => "boolean".into(),
			Kind::Enum(values) => format!("one of [{}]", values.join(", ")),
			Kind::Array(items) => format!("array of {}", items.describe()),
			Kind::Object(_) => "object".into(),
			Kind::Map(values) => format!("map of {}", values.describe()),
			Kind::OneOf(kinds) => kinds.iter().map(Kind::describe).collect::<Vec<_>>().join(" | "),
			Kind::Any => "any".into(),
		}
	}

	fn to_json_schema(&self) -> Value {
		match self {
			Kind::String => json!({"type": "string"}),
			Kind::Url => json!({"type": "string", "format": "uri"}),
			Kind::Number => json!({"type": "number"}),
			Kind::Integer => json!({"type": "integer"}),
			Kind::Millis => json!({"type": "integer", "minimum": 0}),
			Kind::Boolean => json!({"type": "boolean"}),
			Kind::Enum(values) => json!({"type": "string", "enum": values}),
			Kind::Array(items) => json!({"type": "array", "items": items.to_json_schema()}),
			Kind::Object(schema) => schema.to_json_schema(),
			Kind::Map(values) => json!({"type": "object", "additionalProperties": values.to_json_schema()}),
			Kind::OneOf(kinds) => json!({"anyOf": kinds.iter().map(Kind::to_json_schema).collect::<Vec<_>>()}),
			Kind::Any => json!({}),
		}
	}
}

/// One named parameter.
#[derive(Debug, Clone)]
pub struct Field {
	name: &'static str,
	kind: Kind,
	required: bool,
	default: Option<Value>,
	description: Option<&'static str>,
}

impl Field {
	pub fn required(name: &'static str, kind: Kind) -> Self {
		Self {
			name,
			kind,
			required: true,
			default: None,
			description: None,
		}
	}

	pub fn optional(name: &'static str, kind: Kind) -> Self {
		Self {
			required: false,
			..Self::required(name, kind)
		}
	}

	/// Value used when the field is absent. Makes the field optional.
	pub fn with_default(mut self, value: impl Into<Value>) -> Self {
		self.default = Some(value.into());
		self.required = false;
		self
	}

	pub fn describe(mut self, text: &'static str) -> Self {
		self.description = Some(text);
		self
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn default_value(&self) -> Option<&Value> {
		self.default.as_ref()
	}
}

/// Cross-field check run after every field validated cleanly.
#[derive(Clone, Copy)]
pub struct Rule {
	name: &'static str,
	check: fn(&Map<String, Value>) -> Option<Violation>,
}

impl fmt::Debug for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Rule").field(&self.name).finish()
	}
}

/// Parameter contract of one operation (or one nested object).
#[derive(Debug, Clone, Default)]
pub struct Schema {
	fields: Vec<Field>,
	rules: Vec<Rule>,
}

impl Schema {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	/// Adds a cross-field rule. `check` sees the normalized fields and returns
	/// a violation whose `field` is relative to this schema.
	pub fn rule(mut self, name: &'static str, check: fn(&Map<String, Value>) -> Option<Violation>) -> Self {
		self.rules.push(Rule { name, check });
		self
	}

	pub fn fields(&self) -> &[Field] {
		&self.fields
	}

	pub fn get(&self, name: &str) -> Option<&Field> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Validates a raw argument bag.
	///
	/// `null` (an omitted `args` member) is treated as an empty object.
	///
	/// # Errors
	///
	/// Returns every [`Violation`] found, in field declaration order.
	pub fn validate(&self, raw: &Value) -> Result<Args, Vec<Violation>> {
		let empty = Map::new();
		let map = match raw {
			Value::Null => &empty,
			Value::Object(map) => map,
			other => {
				return Err(vec![Violation::new(
					"args",
					Problem::WrongKind {
						expected: "object".into(),
						found: json_type(other),
					},
				)]);
			}
		};

		let mut violations = Vec::new();
		match self.normalize("", map, &mut violations) {
			Some(normalized) if violations.is_empty() => Ok(Args::new(normalized)),
			_ => Err(violations),
		}
	}

	fn normalize(&self, path: &str, map: &Map<String, Value>, out: &mut Vec<Violation>) -> Option<Map<String, Value>> {
		let before = out.len();
		let mut normalized = Map::new();

		for field in &self.fields {
			let field_path = join(path, field.name);
			match map.get(field.name) {
				Some(value) => {
					if let Some(value) = check(&field.kind, &field_path, value, out) {
						normalized.insert(field.name.to_string(), value);
					}
				}
				None => match &field.default {
					Some(default) => {
						normalized.insert(field.name.to_string(), default.clone());
					}
					None if field.required => out.push(Violation::new(field_path, Problem::Missing)),
					None => {}
				},
			}
		}

		for key in map.keys().filter(|key| self.get(key).is_none()) {
			debug!(field = %join(path, key), "dropping unknown argument");
		}

		if out.len() == before {
			for rule in &self.rules {
				if let Some(violation) = (rule.check)(&normalized) {
					out.push(Violation {
						field: join(path, &violation.field),
						problem: violation.problem,
					});
				}
			}
		}

		(out.len() == before).then_some(normalized)
	}

	/// JSON-Schema shaped description used for capability discovery.
	pub fn to_json_schema(&self) -> Value {
		let mut properties = Map::new();
		let mut required = Vec::new();
		for field in &self.fields {
			let mut property = field.kind.to_json_schema();
			if let Some(object) = property.as_object_mut() {
				if let Some(description) = field.description {
					object.insert("description".into(), json!(description));
				}
				if let Some(default) = &field.default {
					object.insert("default".into(), default.clone());
				}
			}
			if field.required {
				required.push(field.name);
			}
			properties.insert(field.name.to_string(), property);
		}

		let mut schema = json!({"type": "object", "properties": properties});
		if !required.is_empty() {
			schema["required"] = json!(required);
		}
		schema
	}
}

fn check(kind: &Kind, path: &str, value: &Value, out: &mut Vec<Violation>) -> Option<Value> {
	match (kind, value) {
		(Kind::Any, _) | (Kind::String, Value::String(_)) | (Kind::Number, Value::Number(_)) | (Kind::Boolean, Value::Bool(_)) => {
			Some(value.clone())
		}
		(Kind::Integer, Value::Number(n)) => {
			if n.is_i64() || n.is_u64() {
				Some(value.clone())
			} else {
				out.push(Violation::new(path, Problem::Malformed("expected integer, found fractional number".into())));
				None
			}
		}
		(Kind::Millis, Value::Number(n)) => {
			if n.is_u64() {
				Some(value.clone())
			} else if n.is_i64() {
				out.push(Violation::new(path, Problem::Malformed("must not be negative".into())));
				None
			} else {
				out.push(Violation::new(path, Problem::Malformed("expected integer, found fractional number".into())));
				None
			}
		}
				(Kind::Url, Value::String(s)) => match Url::parse(s) {
			Ok(_) => Some(value.clone()),
			Err(e) => {
				out.push(Violation::new(path, Problem::Malformed(format!("is not a valid URL ({e})"))));
				None
			}
		},
		(Kind::Enum(allowed), Value::String(s)) => {
			if allowed.contains(&s.as_str()) {
				Some(value.clone())
			} else {
				out.push(Violation::new(
					path,
					Problem::NotAllowed {
						value: s.clone(),
						allowed,
					},
				));
				None
			}
		}
		(Kind::Array(items), Value::Array(values)) => {
			let before = out.len();
			let normalized: Vec<Value> = values
				.iter()
				.enumerate()
				.filter_map(|(i, item)| check(items, &format!("{path}[{i}]"), item, out))
				.collect();
			(out.len() == before).then_some(Value::Array(normalized))
		}
		(Kind::Object(schema), Value::Object(map)) => schema.normalize(path, map, out).map(Value::Object),
		(Kind::Map(values), Value::Object(map)) => {
			let before = out.len();
			let normalized: Map<String, Value> = map
				.iter()
				.filter_map(|(key, item)| check(values, &join(path, key), item, out).map(|v| (key.clone(), v)))
				.collect();
			(out.len() == before).then_some(Value::Object(normalized))
		}
		(Kind::OneOf(kinds), _) => {
			for candidate in kinds {
				let mut scratch = Vec::new();
				if let Some(normalized) = check(candidate, path, value, &mut scratch) {
					return Some(normalized);
				}
			}
			out.push(mismatch(kind, path, value));
			None
		}
		_ => {
			out.push(mismatch(kind, path, value));
			None
		}
	}
}

fn mismatch(kind: &Kind, path: &str, value: &Value) -> Violation {
	Violation::new(
		path,
		Problem::WrongKind {
			expected: kind.describe(),
			found: json_type(value),
		},
	)
}

fn join(parent: &str, name: &str) -> String {
	if parent.is_empty() {
		name.to_string()
	} else {
		format!("{parent}.{name}")
	}
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
	Missing,
	WrongKind { expected: String, found: &'static str },
	NotAllowed { value: String, allowed: &'static [&'static str] },
	Malformed(String),
}

impl fmt::Display for Problem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Problem::Missing => f.write_str("is required"),
			Problem::WrongKind { expected, found } => write!(f, "expected {expected}, found {found}"),
			Problem::NotAllowed { value, allowed } => {
				write!(f, "'{value}' is not one of [{}]", allowed.join(", "))
			}
			Problem::Malformed(message) => f.write_str(message),
		}
	}
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
	/// Dotted path to the field, with `[i]` for array elements.
	pub field: String,
	#[serde(serialize_with = "problem_text")]
	pub problem: Problem,
}

impl Violation {
	pub fn new(field: impl Into<String>, problem: Problem) -> Self {
		Self {
			field: field.into(),
			problem,
		}
	}
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.field, self.problem)
	}
}

fn problem_text<S: Serializer>(problem: &Problem, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.collect_str(problem)
}
