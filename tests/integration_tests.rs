//! Integration tests for daemon-CLI IPC communication.
//!
//! These tests run a real IPC server against the CLI client:
//! - Timer control commands over the socket
//! - Settings updates persisted by the daemon
//! - Session completion reaching the history file
//! - Connection error handling

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

use focus_timer::cli::client::{ClientError, IpcClient};
use focus_timer::config::{load_settings, Paths};
use focus_timer::daemon::clock::ManualClock;
use focus_timer::daemon::driver::TimerDriver;
use focus_timer::daemon::ipc::{IpcServer, RequestHandler};
use focus_timer::daemon::timer::{TimerEngine, TimerEvent};
use focus_timer::daemon::{dispatch_events, Daemon};
use focus_timer::notification::{LogNotifier, MockNotifier};
use focus_timer::store::{JsonlSessionStore, SessionStore};
use focus_timer::types::{PhaseType, Settings};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestDaemon {
    dir: tempfile::TempDir,
    clock: ManualClock,
    events: Option<mpsc::UnboundedReceiver<TimerEvent>>,
    server: JoinHandle<()>,
}

impl TestDaemon {
    fn paths(&self) -> Paths {
        Paths::new(self.dir.path())
    }

    fn client(&self) -> IpcClient {
        IpcClient::with_socket_path(self.paths().socket_path())
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Starts a server on a temp socket, driven by a manual clock.
fn spawn_test_daemon(settings: Settings) -> TestDaemon {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let (tx, rx) = mpsc::unbounded_channel();
    let clock = ManualClock::new(1_714_554_000_000);
    let engine = TimerEngine::new(settings, Arc::new(clock.clone()), tx);
    let driver = Arc::new(TimerDriver::with_period(engine, Duration::from_millis(20)));
    let handler = RequestHandler::new(driver, paths.settings_path());
    let server = IpcServer::new(&paths.socket_path()).unwrap();

    let server = tokio::spawn(async move {
        loop {
            let Ok(mut stream) = server.accept().await else {
                continue;
            };
            if let Ok(request) = IpcServer::receive_request(&mut stream).await {
                let response = handler.handle(request).await;
                let _ = IpcServer::send_response(&mut stream, &response).await;
            }
        }
    });

    TestDaemon {
        dir,
        clock,
        events: Some(rx),
        server,
    }
}

async fn wait_for_socket(path: &Path) {
    for _ in 0..100 {
        if path.exists() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("socket {:?} never appeared", path);
}

async fn wait_for_records(store: &JsonlSessionStore, count: usize) -> Vec<focus_timer::SessionRecord> {
    for _ in 0..100 {
        let records = store.load_all().unwrap();
        if records.len() >= count {
            return records;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {} records in {:?}", count, store.path());
}

// ============================================================================
// Timer Control
// ============================================================================

#[tokio::test]
async fn test_start_via_ipc() {
    let daemon = spawn_test_daemon(Settings::default());

    let response = daemon
        .client()
        .start(Some("Integration Test Task".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.message, "Focus Session started");
    let data = response.data.expect("Response should contain data");
    assert_eq!(data.state.as_deref(), Some("running"));
    assert_eq!(data.phase, Some(PhaseType::Focus));
    assert_eq!(data.remaining_seconds, Some(25 * 60));
    assert_eq!(data.intent.as_deref(), Some("Integration Test Task"));
}

#[tokio::test]
async fn test_pause_when_not_running() {
    let daemon = spawn_test_daemon(Settings::default());

    let err = daemon.client().pause().await.unwrap_err();

    assert_eq!(err.to_string(), "Timer is not running");
}

#[tokio::test]
async fn test_status_when_idle() {
    let daemon = spawn_test_daemon(Settings::default().with_focus_minutes(50));

    let data = daemon.client().status().await.unwrap().data.unwrap();

    assert_eq!(data.state.as_deref(), Some("idle"));
    assert_eq!(data.remaining_seconds, Some(50 * 60));
    assert_eq!(data.completed_focus_count, Some(0));
}

#[tokio::test]
async fn test_pause_freezes_remaining_time() {
    let daemon = spawn_test_daemon(Settings::default());
    let client = daemon.client();

    client.start(None).await.unwrap();
    daemon.clock.advance_secs(90);
    let paused = client.pause().await.unwrap().data.unwrap();
    assert_eq!(paused.remaining_seconds, Some(1500 - 90));

    daemon.clock.advance_secs(600);
    let status = client.status().await.unwrap().data.unwrap();
    assert_eq!(status.state.as_deref(), Some("paused"));
    assert_eq!(status.remaining_seconds, Some(1500 - 90));

    let resumed = client.start(None).await.unwrap().data.unwrap();
    assert_eq!(resumed.state.as_deref(), Some("running"));
    assert_eq!(resumed.remaining_seconds, Some(1500 - 90));
}

#[tokio::test]
async fn test_full_cycle_reaches_long_break() {
    let daemon = spawn_test_daemon(Settings::default().with_sessions_until_long_break(2));
    let client = daemon.client();

    let expected = [
        PhaseType::ShortBreak,
        PhaseType::Focus,
        PhaseType::LongBreak,
        PhaseType::Focus,
    ];
    for next in expected {
        client.start(None).await.unwrap();
        let data = client.skip().await.unwrap().data.unwrap();
        assert_eq!(data.phase, Some(next));
        assert_eq!(data.state.as_deref(), Some("idle"));
    }

    let data = client.status().await.unwrap().data.unwrap();
    assert_eq!(data.completed_focus_count, Some(2));
}

#[tokio::test]
async fn test_stop_resets_without_advancing() {
    let daemon = spawn_test_daemon(Settings::default());
    let client = daemon.client();

    client.start(None).await.unwrap();
    daemon.clock.advance_secs(300);
    let data = client.stop().await.unwrap().data.unwrap();

    assert_eq!(data.state.as_deref(), Some("idle"));
    assert_eq!(data.phase, Some(PhaseType::Focus));
    assert_eq!(data.remaining_seconds, Some(1500));
    assert_eq!(data.completed_focus_count, Some(0));
}

#[tokio::test]
async fn test_unicode_intent() {
    let daemon = spawn_test_daemon(Settings::default());

    let data = daemon
        .client()
        .set_intent("資料作成 📝")
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(data.intent.as_deref(), Some("資料作成 📝"));
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_update_is_persisted() {
    let daemon = spawn_test_daemon(Settings::default());
    let settings = Settings::default()
        .with_focus_minutes(45)
        .with_short_break_minutes(10);

    let response = daemon.client().update_settings(settings).await.unwrap();

    assert_eq!(response.data.unwrap().remaining_seconds, Some(45 * 60));
    assert_eq!(
        load_settings(&daemon.paths().settings_path()).unwrap(),
        settings
    );
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let daemon = spawn_test_daemon(Settings::default());
    let settings = Settings::default().with_focus_minutes(121);

    let err = daemon.client().update_settings(settings).await.unwrap_err();

    assert!(err.to_string().contains("between 1 and 120"));
    assert!(!daemon.paths().settings_path().exists());
}

// ============================================================================
// Session Completion
// ============================================================================

#[tokio::test]
async fn test_expiry_is_recorded_in_history() {
    let mut daemon = spawn_test_daemon(Settings::default());
    let store_path = daemon.paths().sessions_path();
    let rx = daemon.events.take().unwrap();

    let dispatcher = tokio::spawn({
        let store_path = store_path.clone();
        async move {
            let mut store = JsonlSessionStore::new(store_path);
            let notifier = MockNotifier::new();
            dispatch_events(rx, &mut store, &notifier).await;
        }
    });

    let client = daemon.client();
    client.start(Some("Write report".to_string())).await.unwrap();
    daemon.clock.advance_secs(25 * 60);

    let records = wait_for_records(&JsonlSessionStore::new(&store_path), 1).await;
    assert_eq!(records[0].phase_type, PhaseType::Focus);
    assert_eq!(records[0].intent, "Write report");
    assert_eq!(records[0].duration_seconds, 1500);

    let data = client.status().await.unwrap().data.unwrap();
    assert_eq!(data.phase, Some(PhaseType::ShortBreak));
    assert_eq!(data.state.as_deref(), Some("idle"));

    dispatcher.abort();
}

#[tokio::test]
async fn test_daemon_serves_and_records_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let socket_path = paths.socket_path();

    let daemon = tokio::spawn(Daemon::new(paths.clone(), Box::new(LogNotifier)).run());
    wait_for_socket(&socket_path).await;

    let client = IpcClient::with_socket_path(socket_path.clone());
    client.start(None).await.unwrap();
    client.skip().await.unwrap();

    let records = wait_for_records(&JsonlSessionStore::new(paths.sessions_path()), 1).await;
    assert_eq!(records[0].intent, "Focused work");

    // A second daemon refuses to take over the socket
    let second = Daemon::new(paths.clone(), Box::new(LogNotifier)).run().await;
    assert!(second.is_err());

    daemon.abort();
    let _ = daemon.await;
}

#[tokio::test]
async fn test_shutdown_keeps_sessions_completed_just_before() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let socket_path = paths.socket_path();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let daemon = tokio::spawn(
        Daemon::new(paths.clone(), Box::new(LogNotifier)).run_until(async move {
            let _ = stop_rx.await;
        }),
    );
    wait_for_socket(&socket_path).await;

    let client = IpcClient::with_socket_path(socket_path.clone());
    client.start(Some("Last task".to_string())).await.unwrap();
    client.skip().await.unwrap();
    stop_tx.send(()).unwrap();

    timeout(Duration::from_secs(5), daemon)
        .await
        .expect("daemon should shut down")
        .unwrap()
        .unwrap();

    let records = JsonlSessionStore::new(paths.sessions_path())
        .load_all()
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].intent, "Last task");
    assert!(!socket_path.exists());
}

// ============================================================================
// Connection Errors
// ============================================================================

#[tokio::test]
async fn test_connection_error_when_daemon_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock"));

    let result = timeout(Duration::from_secs(2), client.status())
        .await
        .expect("missing socket should fail fast");

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ClientError>(),
        Some(ClientError::DaemonNotRunning)
    ));
}

#[tokio::test]
async fn test_stale_socket_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path: PathBuf = dir.path().join("stale.sock");
    std::fs::write(&socket_path, "").unwrap();

    let client = IpcClient::with_socket_path(socket_path);
    assert!(client.status().await.is_err());
}
