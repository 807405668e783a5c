//! Focus Timer Library
//!
//! This library provides the core functionality for the focus timer CLI.
//! It includes:
//! - Timer engine, tick driver and daemon for managing focus sessions
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Append-only session history and summary statistics
//! - Completion notifications through pluggable backends
//! - Type definitions for settings, records and IPC messages

pub mod analytics;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod notification;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    IpcRequest, IpcResponse, PhaseType, ResponseData, SessionRecord, Settings, SettingsError,
    TimerSnapshot, TimerStatus,
};

pub use daemon::{Daemon, EngineError, TimerDriver, TimerEngine, TimerEvent};

pub use notification::{
    CommandNotifier, LogNotifier, MockNotifier, NotificationContent, NotificationError,
    NotificationPort,
};

pub use store::{JsonlSessionStore, MemorySessionStore, SessionStore, StoreError};
