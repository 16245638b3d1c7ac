use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::json;
use tokio::io::{BufReader, duplex};

use super::*;
use crate::registry::{Handler, Lifecycle, Operation, OperationRegistry};
use crate::session::Session;
use crate::testing::FakeEngine;

fn dispatcher(engine: &FakeEngine) -> Dispatcher {
	let mut registry = OperationRegistry::with_builtins("test").unwrap();
	registry
		.register(
			Operation::new(
				"start",
				"start a session",
				Handler::new(|args, mut ctx| {
					Box::pin(async move {
						let id = ctx.start(&args).await?;
						Ok(json!({ "session": id }))
					})
				}),
			)
			.lifecycle(Lifecycle::Start),
		)
		.unwrap();
	Dispatcher::new(registry, Session::new(Arc::new(engine.clone())))
}

fn responses(out: &[u8]) -> Vec<Response> {
	String::from_utf8_lossy(out)
		.lines()
		.map(|line| serde_json::from_str(line).unwrap())
		.collect()
}

#[tokio::test]
async fn answers_every_line_in_order() {
	let engine = FakeEngine::new();
	let input = concat!(
		"{\"id\":1,\"op\":\"list_operations\"}\n",
		"\n",
		"   \n",
		"{\"id\":2,\"op\":\"frobnicate\",\"args\":{}}\n",
		"{\"id\":3,\"op\":\"start\",\"args\":{}}\n",
	);
	let mut out = Vec::new();

	let exit = Shell::new(dispatcher(&engine), input.as_bytes(), &mut out).run().await.unwrap();
	assert_eq!(exit, ShellExit::EndOfInput);

	let responses = responses(&out);
	assert_eq!(responses.len(), 3);
	assert_eq!(responses[0].id, Some(json!(1)));
	assert!(responses[0].ok);
	assert_eq!(responses[1].id, Some(json!(2)));
	assert_eq!(responses[1].error_code(), Some(ErrorCode::UnknownOperation));
	assert_eq!(responses[2].id, Some(json!(3)));
	assert!(responses[2].ok);
}

#[tokio::test]
async fn releases_session_at_end_of_input() {
	let engine = FakeEngine::new();
	let input = "{\"op\":\"start\"}\n";
	let mut out = Vec::new();

	Shell::new(dispatcher(&engine), input.as_bytes(), &mut out).run().await.unwrap();
	assert_eq!(engine.calls(), ["acquire(fake#1)", "release(fake#1)"]);
	assert_eq!(engine.live(), 0);
}

#[tokio::test]
async fn malformed_lines_get_parse_errors() {
	let engine = FakeEngine::new();
	let input = concat!(
		"not json at all\n",
		"{\"id\":\"x\",\"args\":{}}\n",
		"{\"id\":4,\"op\":\"list_operations\"}",
	);
	let mut out = Vec::new();

	Shell::new(dispatcher(&engine), input.as_bytes(), &mut out).run().await.unwrap();

	let responses = responses(&out);
	assert_eq!(responses.len(), 3);
	assert_eq!(responses[0].error_code(), Some(ErrorCode::ParseError));
	assert_eq!(responses[0].op, "unknown");
	assert_eq!(responses[0].id, None);
	assert_eq!(responses[1].error_code(), Some(ErrorCode::ParseError));
	assert_eq!(responses[1].id, Some(json!("x")));
	assert!(responses[2].ok, "final line without newline is still served");
}

#[tokio::test]
async fn shutdown_stops_before_next_request() {
	let engine = FakeEngine::new();
	let input = concat!(
		"{\"op\":\"start\"}\n",
		"{\"op\":\"shutdown\"}\n",
		"{\"op\":\"list_operations\"}\n",
	);
	let mut out = Vec::new();

	let exit = Shell::new(dispatcher(&engine), input.as_bytes(), &mut out).run().await.unwrap();
	assert_eq!(exit, ShellExit::Shutdown);

	let responses = responses(&out);
	assert_eq!(responses.len(), 2);
	assert_eq!(responses[1].op, "shutdown");
	assert_eq!(responses[1].data, Some(json!({"released": true})));
	assert_eq!(engine.live(), 0);
}

#[tokio::test]
async fn interrupt_while_idle_releases_session() {
	let engine = FakeEngine::new();
	let (mut client, server) = duplex(1024);
	tokio::io::AsyncWriteExt::write_all(&mut client, b"{\"op\":\"start\"}\n").await.unwrap();

	let (tx, rx) = tokio::sync::oneshot::channel::<()>();
	let mut out = Vec::new();
	let run = Shell::new(dispatcher(&engine), BufReader::new(server), &mut out).run_until(async move {
		let _ = rx.await;
	});
	// Interrupt once the first request has been served and the shell waits for more input.
	let watcher = engine.clone();
	let interrupt = async move {
		while watcher.live() == 0 {
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}
		let _ = tx.send(());
	};

	let (exit, ()) = tokio::join!(run, interrupt);
	assert_eq!(exit.unwrap(), ShellExit::Interrupted);
	assert_eq!(engine.calls(), ["acquire(fake#1)", "release(fake#1)"]);
	drop(client);
}

struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
	fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
		Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "orchestrator went away")))
	}

	fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}

	fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}
}

#[tokio::test]
async fn output_failure_is_fatal() {
	let engine = FakeEngine::new();
	let input = "{\"op\":\"start\"}\n{\"op\":\"list_operations\"}\n";

	let err = Shell::new(dispatcher(&engine), input.as_bytes(), BrokenPipe)
		.run()
		.await
		.unwrap_err();
	assert!(matches!(err, ShellError::Output(_)), "{err:?}");
	assert_eq!(engine.live(), 0, "session is released even on fatal exit");
}
