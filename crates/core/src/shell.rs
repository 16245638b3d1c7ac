//! Line-oriented serve loop.
//!
//! Reads one request per line from the input, dispatches it, and writes
//! exactly one response line per non-blank request line, strictly in order.
//! Requests are never overlapped: a slow operation holds the loop until it
//! completes or its deadline fires.
//!
//! ```text
//! → {"id":1,"op":"launch_browser","args":{"headless":true}}
//! ← {"schemaVersion":1,"id":1,"ok":true,"op":"launch_browser","data":{...}}
//! → {"id":2,"op":"frobnicate"}
//! ← {"schemaVersion":1,"id":2,"ok":false,"op":"frobnicate","error":{"code":"UNKNOWN_OPERATION",...}}
//! ```

#[cfg(test)]
mod tests;

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use harness_protocol::{ErrorBody, ErrorCode, Request, Response};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

use crate::dispatch::{Dispatcher, panic_message};
use crate::error::ShellError;

/// Why the serve loop ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
	/// Input reached end of file.
	EndOfInput,
	/// A `shutdown` request was served.
	Shutdown,
	/// The interrupt future resolved while waiting for input.
	Interrupted,
}

/// Serve loop over any buffered reader / writer pair.
pub struct Shell<R, W> {
	dispatcher: Dispatcher,
	input: R,
	output: W,
}

impl<R, W> Shell<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(dispatcher: Dispatcher, input: R, output: W) -> Self {
		Self {
			dispatcher,
			input,
			output,
		}
	}

	/// Serves until end of input or `shutdown`.
	pub async fn run(self) -> Result<ShellExit, ShellError> {
		self.run_until(std::future::pending()).await
	}

	/// Serves until end of input, `shutdown`, or `interrupt` resolves.
	///
	/// `interrupt` is only observed between requests; an operation in
	/// flight always gets its response written. The session is released on
	/// every exit path.
	///
	/// # Errors
	///
	/// Returns [`ShellError`] when the input or output stream fails or a
	/// failure escapes the dispatcher.
	pub async fn run_until<S>(mut self, interrupt: S) -> Result<ShellExit, ShellError>
	where
		S: Future<Output = ()>,
	{
		info!(
			server = %self.dispatcher.registry().server(),
			operations = self.dispatcher.registry().len(),
			"ready"
		);

		let result = self.serve(interrupt).await;
		self.dispatcher.release_session().await;

		match &result {
			Ok(exit) => info!(?exit, "server stopped"),
			Err(e) => error!(error = %e, "server terminated"),
		}
		result
	}

	async fn serve<S>(&mut self, interrupt: S) -> Result<ShellExit, ShellError>
	where
		S: Future<Output = ()>,
	{
		tokio::pin!(interrupt);
		let mut line = Vec::new();

		loop {
			line.clear();
			let read = tokio::select! {
				read = self.input.read_until(b'\n', &mut line) => read.map_err(ShellError::Input)?,
				() = &mut interrupt => return Ok(ShellExit::Interrupted),
			};
			if read == 0 {
				return Ok(ShellExit::EndOfInput);
			}

			let text = String::from_utf8_lossy(&line);
			let text = text.trim();
			if text.is_empty() {
				continue;
			}

			let response = match Request::parse(text) {
				Ok(request) => AssertUnwindSafe(self.dispatcher.handle(request))
					.catch_unwind()
					.await
					.map_err(|payload| ShellError::Fatal(panic_message(&*payload)))?,
				Err(e) => {
					debug!(error = %e, "rejecting malformed request line");
					parse_failure(text, &e)
				}
			};

			write_response(&mut self.output, &response)
				.await
				.map_err(ShellError::Output)?;

			if self.dispatcher.shutdown_requested() {
				return Ok(ShellExit::Shutdown);
			}
		}
	}
}

/// Frames a line that is not a request envelope, keeping its `id` when one
/// can be recovered.
fn parse_failure(text: &str, err: &serde_json::Error) -> Response {
	let id = serde_json::from_str::<Value>(text)
		.ok()
		.and_then(|value| value.get("id").cloned());
	Response::failure(
		id,
		"unknown",
		ErrorBody::new(ErrorCode::ParseError, format!("invalid request: {err}")),
	)
}

async fn write_response<W: AsyncWrite + Unpin>(output: &mut W, response: &Response) -> std::io::Result<()> {
	let mut line = serde_json::to_vec(response)?;
	line.push(b'\n');
	output.write_all(&line).await?;
	output.flush().await
}
