//! Engine runtime - capability interface and driver process lifecycle
//!
//! This crate provides the boundary between the command servers and the
//! automation engines they wrap:
//!
//! - **Engine interface**: [`Engine`] / [`EngineHandle`], the
//!   `{acquire, invoke, release}` capability set every server is built on
//! - **Driver discovery**: locating the driver executable for an engine
//! - **Process**: spawning and terminating driver processes
//! - **Connection**: line-delimited JSON-RPC correlation and event capture
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ harness-core │  Dispatcher + Session (holds Box<dyn EngineHandle>)
//! └──────┬───────┘
//!        │ Engine trait
//! ┌──────▼──────────┐
//! │ harness-runtime │  This crate
//! │  ┌────────────┐ │
//! │  │ Connection │ │  JSON-RPC correlation
//! │  └────────────┘ │
//! │  ┌────────────┐ │
//! │  │ Process    │ │  Driver child process
//! │  └────────────┘ │
//! └─────────────────┘
//! ```

pub mod connection;
pub mod driver;
pub mod driver_engine;
pub mod engine;
pub mod error;
pub mod process;

pub use connection::DriverConnection;
pub use driver::{DriverCommand, driver_binary_name, driver_env_var, locate_driver};
pub use driver_engine::{DriverEngine, DriverTimeouts};
pub use engine::{Engine, EngineEvent, EngineHandle, UnavailableEngine};
pub use error::{Error, ErrorKind, Result};
pub use process::DriverProcess;
