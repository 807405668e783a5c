//! Daemon module for the focus timer.
//!
//! This module contains the core daemon functionality:
//! - `clock`: Wall-clock abstraction used for deadlines
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `driver`: Tick scheduling around the engine
//! - `ipc`: Unix socket server and request handling
//!
//! [`Daemon`] wires these together with the session store and notifier.

pub mod clock;
pub mod driver;
pub mod ipc;
pub mod timer;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::net::UnixStream;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{load_settings, Paths};
use crate::notification::{create_session_complete_content, NotificationPort};
use crate::store::{JsonlSessionStore, SessionStore};
use crate::types::{IpcResponse, Settings};

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::TimerDriver;
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use timer::{EngineError, TimerEngine, TimerEvent};

/// How long shutdown waits for queued completion events to be stored.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// ============================================================================
// Event dispatch
// ============================================================================

/// Reacts to a single engine event.
///
/// A completed session is appended to the store, then announced. Either
/// step may fail without affecting the other.
pub fn handle_event<S, N>(event: &TimerEvent, store: &mut S, notifier: &N)
where
    S: SessionStore + ?Sized,
    N: NotificationPort + ?Sized,
{
    let TimerEvent::SessionCompleted { record, next_phase } = event else {
        debug!(?event, "timer event");
        return;
    };

    info!(
        phase = record.phase_type.as_str(),
        next = next_phase.as_str(),
        duration = record.duration_seconds,
        "session completed"
    );

    if let Err(e) = store.append(record) {
        warn!("failed to record session: {}", e);
    }

    if let Err(e) = notifier.notify(&create_session_complete_content(record)) {
        warn!("failed to send notification: {} ({})", e, e.suggestion());
    }
}

/// Consumes engine events until every sender is gone.
pub async fn dispatch_events<S, N>(
    mut rx: mpsc::UnboundedReceiver<TimerEvent>,
    store: &mut S,
    notifier: &N,
) where
    S: SessionStore + ?Sized,
    N: NotificationPort + ?Sized,
{
    while let Some(event) = rx.recv().await {
        handle_event(&event, store, notifier);
    }
    debug!("event channel closed");
}

// ============================================================================
// Daemon
// ============================================================================

/// Long-running process owning the timer.
pub struct Daemon {
    paths: Paths,
    notifier: Box<dyn NotificationPort>,
}

impl Daemon {
    pub fn new(paths: Paths, notifier: Box<dyn NotificationPort>) -> Self {
        Self { paths, notifier }
    }

    /// Serves IPC requests until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if another daemon owns the socket or the socket
    /// cannot be bound.
    pub async fn run(self) -> Result<()> {
        let mut terminate = signal(SignalKind::terminate())?;
        self.run_until(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("interrupt received, shutting down"),
                _ = terminate.recv() => info!("terminate received, shutting down"),
            }
        })
        .await
    }

    /// Serves IPC requests until `shutdown` resolves.
    ///
    /// Completion events already emitted by the engine are written to the
    /// store before this returns, bounded by [`SHUTDOWN_GRACE`].
    ///
    /// # Errors
    ///
    /// Returns an error if another daemon owns the socket or the socket
    /// cannot be bound.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let socket_path = self.paths.socket_path();
        if UnixStream::connect(&socket_path).await.is_ok() {
            bail!("Daemon is already running ({})", socket_path.display());
        }

        let settings_path = self.paths.settings_path();
        let settings = load_settings(&settings_path).unwrap_or_else(|e| {
            warn!("{:#}; using default settings", e);
            Settings::default()
        });

        let notifier = self.notifier;
        if !notifier.is_available() {
            warn!("notification backend is not available; completions will only be recorded");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::with_system_clock(settings, tx);
        let driver = Arc::new(TimerDriver::new(engine));
        let handler = Arc::new(RequestHandler::new(driver, settings_path));

        let mut store = JsonlSessionStore::new(self.paths.sessions_path());
        let dispatcher = tokio::spawn(async move {
            dispatch_events(rx, &mut store, notifier.as_ref()).await;
        });

        let server = IpcServer::new(&socket_path)?;
        info!(socket = %socket_path.display(), "daemon listening");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = server.accept() => match accepted {
                    Ok(stream) => {
                        let handler = handler.clone();
                        tokio::spawn(serve_connection(stream, handler));
                    }
                    Err(e) => warn!("{:#}", e),
                },
                () = &mut shutdown => break,
            }
        }

        drop(server);
        // The engine owns the event sender; releasing the handler closes the
        // channel once in-flight connections finish.
        drop(handler);
        match timeout(SHUTDOWN_GRACE, dispatcher).await {
            Ok(Ok(())) => debug!("pending events flushed"),
            Ok(Err(e)) => warn!("event dispatcher failed: {}", e),
            Err(_) => warn!("gave up flushing events after {:?}", SHUTDOWN_GRACE),
        }

        Ok(())
    }
}

/// Answers one request on an accepted connection.
async fn serve_connection(mut stream: UnixStream, handler: Arc<RequestHandler>) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            if let Some(IpcError::ConnectionClosed) = e.downcast_ref::<IpcError>() {
                debug!("client closed connection without a request");
                return;
            }
            warn!("bad request: {:#}", e);
            IpcResponse::error(format!("Invalid request: {:#}", e))
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        warn!("{:#}", e);
    }
}

// ============================================================================
// Tests
// ============================================================================
