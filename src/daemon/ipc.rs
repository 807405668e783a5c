//! IPC server for the focus timer daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with [`TimerDriver`] for command execution

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::config::save_settings;
use crate::types::{IpcRequest, IpcResponse, ResponseData, Settings, TimerSnapshot};

use super::driver::TimerDriver;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Client hung up before sending a request
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until a complete JSON document has arrived or the client shuts
    /// down its write half, under a single read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        match timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            Self::read_request(stream),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(IpcError::Timeout.into()),
        }
    }

    async fn read_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(512);
        let mut chunk = [0u8; 512];

        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| IpcError::ReadError(e.to_string()))?;

            if n == 0 {
                if buffer.is_empty() {
                    return Err(IpcError::ConnectionClosed.into());
                }
                return serde_json::from_slice(&buffer)
                    .context("Failed to deserialize IPC request");
            }

            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge.into());
            }

            match serde_json::from_slice::<IpcRequest>(&buffer) {
                Ok(request) => return Ok(request),
                Err(e) if e.is_eof() => continue,
                Err(e) => return Err(e).context("Failed to deserialize IPC request"),
            }
        }
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the [`TimerDriver`].
pub struct RequestHandler {
    driver: Arc<TimerDriver>,
    /// Where accepted settings are persisted
    settings_path: PathBuf,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(driver: Arc<TimerDriver>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            settings_path: settings_path.into(),
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        debug!(?request, "handling request");
        match request {
            IpcRequest::Start { intent } => self.handle_start(intent).await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Stop => self.handle_stop().await,
            IpcRequest::Skip => self.handle_skip().await,
            IpcRequest::Intent { text } => self.handle_intent(text).await,
            IpcRequest::Settings { settings } => self.handle_settings(settings).await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    /// Handles the start command.
    async fn handle_start(&self, intent: Option<String>) -> IpcResponse {
        if let Some(text) = intent {
            self.driver.set_intent(text).await;
        }

        match self.driver.start().await {
            Ok(snapshot) => success(
                format!("{} started", snapshot.phase.label()),
                &snapshot,
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        match self.driver.pause().await {
            Ok(snapshot) => success("Timer paused", &snapshot),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the stop command.
    async fn handle_stop(&self) -> IpcResponse {
        let snapshot = self.driver.stop().await;
        success("Timer stopped", &snapshot)
    }

    /// Handles the skip command.
    async fn handle_skip(&self) -> IpcResponse {
        match self.driver.skip().await {
            Ok((record, snapshot)) => success(
                format!(
                    "Skipped {}. Next: {}",
                    record.phase_type.label(),
                    snapshot.phase.label()
                ),
                &snapshot,
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the intent command.
    async fn handle_intent(&self, text: String) -> IpcResponse {
        let snapshot = self.driver.set_intent(text).await;
        success("Intent updated", &snapshot)
    }

    /// Handles the settings command.
    ///
    /// Invalid settings are rejected untouched. Accepted settings apply
    /// immediately and are then written to the settings file.
    async fn handle_settings(&self, settings: Settings) -> IpcResponse {
        if let Err(e) = settings.validate() {
            return IpcResponse::error(e.to_string());
        }

        let snapshot = self.driver.update_settings(settings).await;

        if let Err(e) = save_settings(&self.settings_path, &settings) {
            warn!("failed to persist settings: {:#}", e);
            return IpcResponse::error(format!("Settings applied but not saved: {:#}", e));
        }

        success("Settings updated", &snapshot)
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let snapshot = self.driver.snapshot().await;
        success("", &snapshot)
    }
}

fn success(message: impl Into<String>, snapshot: &TimerSnapshot) -> IpcResponse {
    IpcResponse::success(message, Some(ResponseData::from_snapshot(snapshot)))
}

// ============================================================================
// Tests
// ============================================================================
