//! IPC client for communicating with the focus timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::warn;

use crate::config::Paths;
use crate::types::{IpcRequest, IpcResponse, Settings};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// ClientError
// ============================================================================

/// Failures that retrying cannot fix.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No socket exists at the expected path
    #[error("Daemon is not running. Start it with 'focus-timer daemon'")]
    DaemonNotRunning,

    /// The daemon answered with an error response
    #[error("{0}")]
    Rejected(String),
}

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client for the socket in the resolved data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be resolved.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(Paths::from_env()?.socket_path()))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Starts or resumes the timer, optionally setting the intent first.
    pub async fn start(&self, intent: Option<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Start { intent })
            .await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause).await
    }

    /// Sends a stop command to the daemon.
    pub async fn stop(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Stop).await
    }

    /// Sends a skip command to the daemon.
    pub async fn skip(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Skip).await
    }

    /// Replaces the intent text.
    pub async fn set_intent(&self, text: impl Into<String>) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Intent { text: text.into() })
            .await
    }

    /// Sends new settings to the daemon.
    pub async fn update_settings(&self, settings: Settings) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Settings { settings })
            .await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Sends a request to the daemon, retrying only the connection.
    ///
    /// Once connected the request is sent exactly once: a failure after
    /// that point may follow a command the daemon already applied.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let stream = self.connect_with_retry().await?;
        Self::send_request(stream, request).await
    }

    /// Connects to the daemon socket with retry logic.
    ///
    /// A missing socket is returned immediately.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.downcast_ref::<ClientError>().is_some() => return Err(e),
                Err(e) if attempt >= MAX_RETRIES => return Err(e),
                Err(e) => {
                    warn!("Connection failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Opens a single connection to the daemon.
    async fn connect(&self) -> Result<UnixStream> {
        if !self.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning.into());
        }

        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .context("Cannot connect to daemon. Is 'focus-timer daemon' running?")
    }

    /// Sends a single request over an open connection.
    async fn send_request(mut stream: UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let request_json =
            serde_json::to_string(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("No response from daemon");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer).context("Failed to parse response")?;

        if response.is_error() {
            return Err(ClientError::Rejected(response.message).into());
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
