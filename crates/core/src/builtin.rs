//! Operations every server exposes regardless of engine.

use serde_json::json;
use tracing::warn;

use crate::args::Args;
use crate::context::OpCtx;
use crate::registry::{BoxFut, Handler, OpResult, Operation};
use crate::schema::{Field, Kind, Schema};

pub const LIST_OPERATIONS: &str = "list_operations";
pub const SHUTDOWN: &str = "shutdown";
pub const CLEAR_EVENTS: &str = "clear_events";
pub const GET_EVENTS: &str = "get_events";

pub(crate) fn operations() -> Vec<Operation> {
	vec![
		Operation::new(
			LIST_OPERATIONS,
			"List every operation this server exposes with its parameter schema",
			Handler::new(list_operations),
		),
		Operation::new(
			SHUTDOWN,
			"Release the engine session and stop the server",
			Handler::new(shutdown),
		),
		Operation::new(
			CLEAR_EVENTS,
			"Clear one captured event buffer, or all of them",
			Handler::new(clear_events),
		)
		.schema(Schema::new().field(Field::optional("kind", Kind::String).describe("Buffer to clear; all when omitted")))
		.requires_session(),
		Operation::new(GET_EVENTS, "Return the raw entries of one captured event buffer", Handler::new(get_events))
			.schema(Schema::new().field(Field::required("kind", Kind::String).describe("Buffer name, e.g. console or network")))
			.requires_session(),
	]
}

fn list_operations(_args: Args, ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move { Ok(serde_json::to_value(ctx.registry().catalog())?) })
}

fn shutdown(_args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let released = match ctx.stop().await {
			Ok(released) => released,
			Err(e) => {
				warn!(error = %e, "session teardown failed during shutdown");
				true
			}
		};
		ctx.request_shutdown();
		Ok(json!({ "released": released }))
	})
}

fn clear_events(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let removed = ctx.session().clear_events(args.str("kind"));
		Ok(json!({ "cleared": removed }))
	})
}

fn get_events(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let kind = args.str("kind").unwrap_or_default();
		let events = ctx.session().events(kind);
		Ok(json!({ "kind": kind, "count": events.len(), "events": events }))
	})
}

