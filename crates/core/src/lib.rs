//! Dispatch-and-session core shared by every command server.
//!
//! A server is an [`OperationRegistry`] plus an injected [`Engine`]:
//!
//! ```text
//! Shell ──line──▶ Dispatcher ──▶ resolve ─▶ validate ─▶ precondition ─▶ handler
//!   ▲                 │                                                  │
//!   └──response line──┘◀─────────────── framed Response ◀────────────────┘
//!                                                   Session ◀── OpCtx ◀──┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut registry = OperationRegistry::with_builtins("playwright")?;
//! registry.register(
//!     Operation::new("navigate", "Open a URL", Handler::new(|args, mut ctx| {
//!         Box::pin(async move { ctx.forward(&args).await })
//!     }))
//!     .schema(Schema::new().field(Field::required("url", Kind::Url)))
//!     .requires_session(),
//! )?;
//!
//! let dispatcher = Dispatcher::new(registry, Session::new(engine));
//! Shell::new(dispatcher, stdin, stdout).run().await?;
//! ```
//!
//! [`Engine`]: harness_runtime::Engine

pub mod args;
pub mod builtin;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod schema;
pub mod session;
pub mod shell;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use args::Args;
pub use context::OpCtx;
pub use dispatch::{DEFAULT_DEADLINE_GRACE, Dispatcher};
pub use error::{DispatchError, FailureKind, OpError, RegistryError, ShellError};
pub use registry::{BoxFut, Deadline, Handler, Lifecycle, OpResult, Operation, OperationRegistry, Precondition};
pub use schema::{Field, Kind, Problem, Schema, Violation};
pub use session::Session;
pub use shell::{Shell, ShellExit};
