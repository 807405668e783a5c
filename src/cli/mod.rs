//! CLI module for the focus timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic

pub mod client;
pub mod commands;
pub mod display;

pub use client::{ClientError, IpcClient};
pub use commands::{Cli, Commands, DaemonArgs, SettingsArgs, SettingsCommand, StartArgs};
pub use display::Display;
