//! Operation catalogs of the five command servers.
//!
//! Each catalog is a plain list of [`Operation`]s registered on top of the
//! built-ins. Most handlers are one of the shared shapes below; only buffer
//! readers and a few compatibility quirks get bespoke handlers.

pub mod cypress;
pub mod devtools;
pub mod katalon;
pub mod playwright;
pub mod selenium;

use harness::{Args, BoxFut, OpCtx, OpResult, Operation, OperationRegistry, RegistryError};
use serde_json::json;

use crate::cli::ServerKind;

/// Builds the full registry for `server`.
///
/// # Errors
///
/// Returns [`RegistryError`] if a catalog reuses an operation name.
pub fn registry(server: ServerKind) -> Result<OperationRegistry, RegistryError> {
	let mut registry = OperationRegistry::with_builtins(server.name())?;
	registry.register_all(operations(server))?;
	Ok(registry)
}

fn operations(server: ServerKind) -> Vec<Operation> {
	match server {
		ServerKind::Playwright => playwright::operations(),
		ServerKind::Selenium => selenium::operations(),
		ServerKind::Devtools => devtools::operations(),
		ServerKind::Cypress => cypress::operations(),
		ServerKind::Katalon => katalon::operations(),
	}
}

/// Acquires (or replaces) the session with the normalized arguments as config.
pub(crate) fn start(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let session = ctx.start(&args).await?;
		Ok(json!({ "session": session, "config": args.into_value() }))
	})
}

/// Releases the session; succeeds when none is active.
pub(crate) fn stop(_args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move {
		let released = ctx.stop().await?;
		Ok(json!({ "released": released }))
	})
}

/// Invokes the operation on the live session under its own name.
pub(crate) fn forward(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move { ctx.forward(&args).await })
}

/// Invokes the operation on a transient engine instance.
pub(crate) fn oneshot(args: Args, mut ctx: OpCtx<'_>) -> BoxFut<'_, OpResult> {
	Box::pin(async move { ctx.forward_oneshot(&args).await })
}
