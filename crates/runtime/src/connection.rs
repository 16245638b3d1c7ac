//! Line-delimited JSON-RPC connection to a driver process.
//!
//! This module implements request/response correlation on top of a pair of
//! byte streams (normally the driver's stdin/stdout). It handles:
//! - Generating sequential request IDs
//! - Skipping responses that belong to abandoned requests
//! - Separating events from responses
//!
//! # Message Flow
//!
//! 1. Caller invokes [`DriverConnection::call`] with a method and params
//! 2. Request `{"id":n,"method":..,"params":..}` is written as one line
//! 3. Lines are read until a response with id `n` arrives
//! 4. Event lines read along the way are buffered for [`DriverConnection::take_events`]
//!
//! A call abandoned mid-flight (its future dropped by a deadline) leaves its
//! response in the stream; the next call discards it by id.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::engine::EngineEvent;
use crate::error::{Error, Result};

/// Protocol request sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub id: u32,
	pub method: String,
	pub params: Value,
}

/// Protocol response from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Request ID this response correlates to.
	pub id: u32,
	/// Success result (mutually exclusive with error).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Driver error details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	/// Error type name (e.g. `"TimeoutError"`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Unsolicited event from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	/// Event kind, used as the buffer name.
	pub event: String,
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of driver messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Event message (has `event` field)
	Event(Event),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}

impl Response {
	fn into_result(self) -> Result<Value> {
		match self.error {
			Some(err) => Err(Error::Remote {
				name: err.name.unwrap_or_else(|| "Error".to_string()),
				message: err.message,
			}),
			None => Ok(self.result.unwrap_or(Value::Null)),
		}
	}
}

/// JSON-RPC connection over a writer/reader pair.
pub struct DriverConnection<W, R> {
	writer: W,
	reader: R,
	last_id: u32,
	/// Bytes of the line currently being read; survives cancelled reads.
	pending: Vec<u8>,
	events: Vec<EngineEvent>,
}

impl<W, R> DriverConnection<W, R>
where
	W: AsyncWrite + Unpin + Send,
	R: AsyncBufRead + Unpin + Send,
{
	pub fn new(writer: W, reader: R) -> Self {
		Self {
			writer,
			reader,
			last_id: 0,
			pending: Vec::new(),
			events: Vec::new(),
		}
	}

	/// Sends `method` and awaits its response.
	///
	/// # Errors
	///
	/// Returns [`Error::Remote`] when the driver answers with an error,
	/// [`Error::ChannelClosed`] when the driver's output ends first, and
	/// [`Error::Transport`] / [`Error::Protocol`] on stream or framing faults.
	pub async fn call(&mut self, method: &str, params: &Value) -> Result<Value> {
		self.last_id = self.last_id.wrapping_add(1);
		let id = self.last_id;

		let request = Request {
			id,
			method: method.to_string(),
			params: params.clone(),
		};
		let mut line = serde_json::to_vec(&request)?;
		line.push(b'\n');

		debug!(id, method, "sending driver request");
		self.writer.write_all(&line).await.map_err(|e| Error::Transport(e.to_string()))?;
		self.writer.flush().await.map_err(|e| Error::Transport(e.to_string()))?;

		loop {
			match self.read_message().await? {
				Message::Response(response) if response.id == id => return response.into_result(),
				Message::Response(response) => {
					debug!(id = response.id, expected = id, "discarding stale driver response");
				}
				Message::Event(event) => self.events.push(EngineEvent::new(event.event, event.params)),
				Message::Unknown(value) => warn!(message = %value, "ignoring unrecognised driver message"),
			}
		}
	}

	/// Drains events buffered by previous calls.
	pub fn take_events(&mut self) -> Vec<EngineEvent> {
		std::mem::take(&mut self.events)
	}

	/// Returns the writer half, e.g. to close the driver's stdin.
	pub fn into_writer(self) -> W {
		self.writer
	}

	async fn read_message(&mut self) -> Result<Message> {
		loop {
			let n = self
				.reader
				.read_until(b'\n', &mut self.pending)
				.await
				.map_err(|e| Error::Transport(e.to_string()))?;
			if n == 0 && self.pending.is_empty() {
				return Err(Error::ChannelClosed);
			}
			if n > 0 && self.pending.last() != Some(&b'\n') {
				// Partial line at EOF; treat what we have as the final line.
				debug!(bytes = self.pending.len(), "driver output ended without newline");
			}

			let line = std::mem::take(&mut self.pending);
			let text = String::from_utf8_lossy(&line);
			let text = text.trim();
			if text.is_empty() {
				if n == 0 {
					return Err(Error::ChannelClosed);
				}
				continue;
			}

			return serde_json::from_str(text).map_err(|e| Error::Protocol(format!("{e}: {text}")));
		}
	}
}
