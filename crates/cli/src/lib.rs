//! Command-line front end: argument parsing, logging, configuration and the
//! concrete operation catalogs served by `harness serve <SERVER>`.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod servers;
