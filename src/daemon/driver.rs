//! Recurring tick scheduling for the timer engine.
//!
//! [`TimerDriver`] owns the engine behind an async mutex and runs a ticker
//! task only while the engine is running. The ticker is a scoped resource:
//! it is spawned when a command leaves the engine running and aborted on
//! every exit from running (pause, stop, completion) and when the driver is
//! dropped.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

use super::timer::{EngineError, TimerEngine};
use crate::types::{SessionRecord, Settings, TimerSnapshot};

/// Default period between ticks.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(200);

// ============================================================================
// Ticker
// ============================================================================

/// Handle to a running tick task; aborts the task when dropped.
struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(engine: Arc<Mutex<TimerEngine>>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let mut engine = engine.lock().await;
                if !engine.is_running() {
                    break;
                }
                engine.tick();
                if !engine.is_running() {
                    break;
                }
            }
            debug!("ticker finished");
        });

        Self { handle }
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// TimerDriver
// ============================================================================

/// Serializes engine commands and keeps the ticker in step with the engine.
pub struct TimerDriver {
    engine: Arc<Mutex<TimerEngine>>,
    ticker: Mutex<Option<Ticker>>,
    period: Duration,
}

impl TimerDriver {
    /// Creates a driver ticking every [`DEFAULT_TICK_PERIOD`].
    pub fn new(engine: TimerEngine) -> Self {
        Self::with_period(engine, DEFAULT_TICK_PERIOD)
    }

    /// Creates a driver with a custom tick period.
    pub fn with_period(engine: TimerEngine, period: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticker: Mutex::new(None),
            period,
        }
    }

    /// Starts or resumes the countdown.
    ///
    /// # Errors
    ///
    /// Propagates the engine's rejection when already running.
    pub async fn start(&self) -> Result<TimerSnapshot, EngineError> {
        let result = self.engine.lock().await.start();
        let snapshot = self.sync_ticker().await;
        result.map(|()| snapshot)
    }

    /// Pauses the countdown.
    ///
    /// # Errors
    ///
    /// Propagates the engine's rejection when not running.
    pub async fn pause(&self) -> Result<TimerSnapshot, EngineError> {
        let result = self.engine.lock().await.pause();
        let snapshot = self.sync_ticker().await;
        result.map(|()| snapshot)
    }

    /// Cancels the current phase.
    pub async fn stop(&self) -> TimerSnapshot {
        self.engine.lock().await.stop();
        self.sync_ticker().await
    }

    /// Completes the running phase immediately.
    ///
    /// # Errors
    ///
    /// Propagates the engine's rejection when not running.
    pub async fn skip(&self) -> Result<(SessionRecord, TimerSnapshot), EngineError> {
        let result = self.engine.lock().await.skip();
        let snapshot = self.sync_ticker().await;
        result.map(|record| (record, snapshot))
    }

    /// Replaces the intent text.
    pub async fn set_intent(&self, text: impl Into<String>) -> TimerSnapshot {
        let mut engine = self.engine.lock().await;
        engine.set_intent(text);
        engine.snapshot()
    }

    /// Replaces the settings.
    pub async fn update_settings(&self, settings: Settings) -> TimerSnapshot {
        let mut engine = self.engine.lock().await;
        engine.update_settings(settings);
        engine.snapshot()
    }

    /// Returns the current engine snapshot.
    pub async fn snapshot(&self) -> TimerSnapshot {
        self.engine.lock().await.snapshot()
    }

    /// Returns true while a tick task is alive.
    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Spawns or releases the ticker to match the engine's status.
    async fn sync_ticker(&self) -> TimerSnapshot {
        let (running, snapshot) = {
            let engine = self.engine.lock().await;
            (engine.is_running(), engine.snapshot())
        };

        let mut ticker = self.ticker.lock().await;
        match (running, ticker.as_ref()) {
            (true, Some(current)) if !current.is_finished() => {}
            (true, _) => {
                debug!("spawning ticker");
                *ticker = Some(Ticker::spawn(self.engine.clone(), self.period));
            }
            (false, _) => {
                if ticker.take().is_some() {
                    debug!("ticker released");
                }
            }
        }

        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::clock::ManualClock;
    use crate::daemon::timer::TimerEvent;
    use crate::types::{PhaseType, TimerStatus};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const PERIOD: Duration = Duration::from_millis(20);

    fn create_driver() -> (TimerDriver, mpsc::UnboundedReceiver<TimerEvent>, ManualClock) {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = ManualClock::new(1_000_000);
        let engine = TimerEngine::new(Settings::default(), Arc::new(clock.clone()), tx);
        (TimerDriver::with_period(engine, PERIOD), rx, clock)
    }

    async fn next_completion(
        rx: &mut mpsc::UnboundedReceiver<TimerEvent>,
    ) -> Option<(SessionRecord, PhaseType)> {
        timeout(Duration::from_secs(2), async {
            while let Some(event) = rx.recv().await {
                if let TimerEvent::SessionCompleted { record, next_phase } = event {
                    return Some((record, next_phase));
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    #[tokio::test]
    async fn test_start_spawns_ticker() {
        let (driver, _rx, _clock) = create_driver();

        let snapshot = driver.start().await.unwrap();

        assert_eq!(snapshot.status, TimerStatus::Running);
        assert!(driver.is_ticking().await);
    }

    #[tokio::test]
    async fn test_pause_releases_ticker() {
        let (driver, _rx, _clock) = create_driver();

        driver.start().await.unwrap();
        let snapshot = driver.pause().await.unwrap();

        assert_eq!(snapshot.status, TimerStatus::Paused);
        assert!(!driver.is_ticking().await);
    }

    #[tokio::test]
    async fn test_stop_releases_ticker() {
        let (driver, _rx, _clock) = create_driver();

        driver.start().await.unwrap();
        let snapshot = driver.stop().await;

        assert_eq!(snapshot.status, TimerStatus::Idle);
        assert_eq!(snapshot.remaining_seconds, 1500);
        assert!(!driver.is_ticking().await);
    }

    #[tokio::test]
    async fn test_rejected_start_keeps_single_ticker() {
        let (driver, _rx, _clock) = create_driver();

        driver.start().await.unwrap();
        assert_eq!(driver.start().await, Err(EngineError::AlreadyRunning));
        assert!(driver.is_ticking().await);
    }

    #[tokio::test]
    async fn test_ticker_fires_completion_after_deadline() {
        let (driver, mut rx, clock) = create_driver();

        driver.start().await.unwrap();
        clock.advance_secs(1500);

        let (record, next_phase) = next_completion(&mut rx)
            .await
            .expect("ticker should complete the phase");
        assert_eq!(record.phase_type, PhaseType::Focus);
        assert_eq!(next_phase, PhaseType::ShortBreak);

        // Ticker exits by itself once the engine goes idle
        tokio::time::sleep(PERIOD * 5).await;
        assert!(!driver.is_ticking().await);

        let snapshot = driver.snapshot().await;
        assert_eq!(snapshot.status, TimerStatus::Idle);
        assert_eq!(snapshot.completed_focus_count, 1);
    }

    #[tokio::test]
    async fn test_ticker_does_not_complete_before_deadline() {
        let (driver, mut rx, clock) = create_driver();

        driver.start().await.unwrap();
        clock.advance_secs(1499);
        tokio::time::sleep(PERIOD * 5).await;

        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, TimerEvent::SessionCompleted { .. }));
        }
        assert_eq!(driver.snapshot().await.remaining_seconds, 1);
    }

    #[tokio::test]
    async fn test_restart_after_completion_spawns_new_ticker() {
        let (driver, mut rx, clock) = create_driver();

        driver.start().await.unwrap();
        clock.advance_secs(1500);
        next_completion(&mut rx).await.unwrap();

        driver.start().await.unwrap();
        assert!(driver.is_ticking().await);

        clock.advance_secs(300);
        let (record, next_phase) = next_completion(&mut rx).await.unwrap();
        assert_eq!(record.phase_type, PhaseType::ShortBreak);
        assert_eq!(next_phase, PhaseType::Focus);
    }

    #[tokio::test]
    async fn test_skip_releases_ticker() {
        let (driver, _rx, _clock) = create_driver();

        driver.start().await.unwrap();
        let (record, snapshot) = driver.skip().await.unwrap();

        assert_eq!(record.phase_type, PhaseType::Focus);
        assert_eq!(snapshot.phase, PhaseType::ShortBreak);
        assert!(!driver.is_ticking().await);
    }

    #[tokio::test]
    async fn test_skip_when_idle_is_rejected() {
        let (driver, _rx, _clock) = create_driver();
        assert!(matches!(driver.skip().await, Err(EngineError::NotRunning)));
    }
}
