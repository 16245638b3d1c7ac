use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

use super::*;

type TestConnection = DriverConnection<DuplexStream, BufReader<DuplexStream>>;

/// Returns a connection plus the driver-side ends: (driver reads requests, driver writes output).
fn create_test_connection() -> (TestConnection, BufReader<DuplexStream>, DuplexStream) {
	let (stdin_write, stdin_read) = duplex(4096);
	let (stdout_write, stdout_read) = duplex(4096);
	let connection = DriverConnection::new(stdin_write, BufReader::new(stdout_read));
	(connection, BufReader::new(stdin_read), stdout_write)
}

async fn read_request(reader: &mut BufReader<DuplexStream>) -> Request {
	let mut line = String::new();
	reader.read_line(&mut line).await.unwrap();
	serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn test_call_returns_result() {
	let (mut conn, mut driver_in, mut driver_out) = create_test_connection();

	let driver = tokio::spawn(async move {
		let req = read_request(&mut driver_in).await;
		assert_eq!(req.method, "navigate");
		assert_eq!(req.params["url"], "https://example.com");
		let reply = format!("{}\n", json!({"id": req.id, "result": {"title": "Example"}}));
		driver_out.write_all(reply.as_bytes()).await.unwrap();
		(driver_in, driver_out)
	});

	let result = conn.call("navigate", &json!({"url": "https://example.com"})).await.unwrap();
	assert_eq!(result, json!({"title": "Example"}));
	driver.await.unwrap();
}

#[tokio::test]
async fn test_request_ids_increment() {
	let (mut conn, mut driver_in, mut driver_out) = create_test_connection();

	let driver = tokio::spawn(async move {
		let mut ids = Vec::new();
		for _ in 0..3 {
			let req = read_request(&mut driver_in).await;
			ids.push(req.id);
			let reply = format!("{}\n", json!({"id": req.id}));
			driver_out.write_all(reply.as_bytes()).await.unwrap();
		}
		ids
	});

	for _ in 0..3 {
		assert_eq!(conn.call("ping", &json!({})).await.unwrap(), Value::Null);
	}
	assert_eq!(driver.await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_remote_error_is_mapped() {
	let (mut conn, mut driver_in, mut driver_out) = create_test_connection();

	tokio::spawn(async move {
		let req = read_request(&mut driver_in).await;
		let reply = format!(
			"{}\n",
			json!({"id": req.id, "error": {"name": "TimeoutError", "message": "waiting for #missing"}})
		);
		driver_out.write_all(reply.as_bytes()).await.unwrap();
		driver_out
	});

	let err = conn.call("click", &json!({"selector": "#missing"})).await.unwrap_err();
	match err {
		Error::Remote { name, message } => {
			assert_eq!(name, "TimeoutError");
			assert_eq!(message, "waiting for #missing");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn test_events_are_buffered_and_stale_responses_skipped() {
	let (mut conn, mut driver_in, mut driver_out) = create_test_connection();

	tokio::spawn(async move {
		let req = read_request(&mut driver_in).await;
		let lines = [
			json!({"id": 99, "result": "late answer to an abandoned call"}),
			json!({"event": "console", "params": {"type": "log", "text": "hello"}}),
			json!({"event": "network", "params": {"url": "https://a.test/", "method": "GET"}}),
			json!({"id": req.id, "result": "done"}),
		];
		for line in lines {
			driver_out.write_all(format!("{line}\n").as_bytes()).await.unwrap();
		}
		driver_out
	});

	let result = conn.call("get_page_title", &json!({})).await.unwrap();
	assert_eq!(result, json!("done"));

	let events = conn.take_events();
	assert_eq!(events.len(), 2);
	assert_eq!(events[0].kind, "console");
	assert_eq!(events[0].value["text"], "hello");
	assert_eq!(events[1].kind, "network");
	assert!(conn.take_events().is_empty());
}

#[tokio::test]
async fn test_closed_output_reports_channel_closed() {
	let (mut conn, driver_in, driver_out) = create_test_connection();
	drop(driver_out);

	let err = conn.call("ping", &json!({})).await.unwrap_err();
	assert!(matches!(err, Error::ChannelClosed), "unexpected error: {err:?}");
	drop(driver_in);
}

#[tokio::test]
async fn test_garbage_line_is_protocol_error() {
	let (mut conn, _driver_in, mut driver_out) = create_test_connection();
	driver_out.write_all(b"this is not json\n").await.unwrap();

	let err = conn.call("ping", &json!({})).await.unwrap_err();
	assert!(matches!(err, Error::Protocol(_)), "unexpected error: {err:?}");
}
