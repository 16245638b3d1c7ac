//! Normalized operation arguments.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::OpError;

/// Arguments that passed schema validation, defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Map<String, Value>);

impl Args {
	pub fn new(map: Map<String, Value>) -> Self {
		Self(map)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	pub fn bool(&self, key: &str) -> Option<bool> {
		self.0.get(key).and_then(Value::as_bool)
	}

	pub fn u64(&self, key: &str) -> Option<u64> {
		self.0.get(key).and_then(Value::as_u64)
	}

	/// Decodes into the operation's typed record.
	///
	/// # Errors
	///
	/// Returns [`OpError::Decode`] when the record and the schema disagree.
	pub fn parse<T: DeserializeOwned>(&self) -> Result<T, OpError> {
		Ok(T::deserialize(Value::Object(self.0.clone()))?)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn to_value(&self) -> Value {
		Value::Object(self.0.clone())
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}
}
