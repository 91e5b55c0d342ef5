//! Cadence command-line player
//!
//! A headless front end for `cadence-playback`: configuration, a device
//! that plays on a clock, and a line-oriented shell.

pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod shell;

pub use config::CliConfig;
pub use device::HeadlessDevice;
pub use error::{CliError, Result};
