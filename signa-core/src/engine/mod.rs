//! `SignSession` — one input stream's detector + interpreter on its own thread.
//!
//! ## Lifecycle
//!
//! ```text
//! SignSession::new()         → configs validated, status = Idle
//!     └─► start()            → queue created, pipeline thread spawned, status = Running
//!         └─► push_frame()…  → frames flow through detector and interpreter
//!             └─► stop()     → queue closed, trailing segment flushed, thread joined,
//!                              status = Stopped
//! ```
//!
//! `start()`/`stop()` return an error rather than panicking when called in the
//! wrong state. A stopped session can be started again with fresh detector and
//! interpreter state.
//!
//! ## Threading
//!
//! Run one session per stream. Sessions share providers (and through them
//! classifiers) via `Arc`, but never share detector or interpreter state.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    buffering::frame::SignFrame,
    config::{PipelineConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_FRAME_QUEUE_CAPACITY},
    error::{Result, SignaError},
    interpreter::{InterpreterConfig, SignInterpreter},
    ipc::events::{SessionStatus, SessionStatusEvent, SignInterpretation, SignPresenceEvent},
    presence::{DetectionConfig, SignPresenceDetector},
    providers::LanguageProvider,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detection: DetectionConfig,
    pub interpreter: InterpreterConfig,
    /// Frames that may wait for the pipeline before `push_frame` reports
    /// back-pressure. Must be at least 1.
    pub frame_queue_capacity: usize,
    /// Events buffered per subscriber before the slowest one starts lagging
    /// and loses the oldest. Must be at least 1.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            interpreter: InterpreterConfig::default(),
            frame_queue_capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.interpreter.validate()?;
        if self.frame_queue_capacity == 0 {
            return Err(SignaError::InvalidConfig(
                "frame_queue_capacity must be at least 1".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(SignaError::InvalidConfig(
                "event_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl From<&PipelineConfig> for SessionConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            detection: config.detection.clone(),
            interpreter: config.interpreter.clone(),
            frame_queue_capacity: config.frame_queue_capacity,
            event_capacity: config.event_capacity,
        }
    }
}

pub struct SignSession {
    config: SessionConfig,
    provider: Arc<dyn LanguageProvider>,
    /// `true` between `start()` and `stop()`.
    running: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    frame_tx: Mutex<Option<Sender<SignFrame>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    presence_tx: broadcast::Sender<SignPresenceEvent>,
    interpretation_tx: broadcast::Sender<SignInterpretation>,
    status_tx: broadcast::Sender<SessionStatusEvent>,
    diagnostics: Arc<pipeline::PipelineDiagnostics>,
}

impl SignSession {
    /// Create an idle session. Does not spawn anything; call `start()`.
    ///
    /// # Errors
    /// `SignaError::InvalidConfig` if any part of `config` is invalid.
    pub fn new(config: SessionConfig, provider: Arc<dyn LanguageProvider>) -> Result<Self> {
        config.validate()?;
        if provider.language_code() != config.interpreter.language_code {
            warn!(
                provider = provider.language_code(),
                configured = %config.interpreter.language_code,
                "session provider does not match configured language"
            );
        }

        let (presence_tx, _) = broadcast::channel(config.event_capacity);
        let (interpretation_tx, _) = broadcast::channel(config.event_capacity);
        let (status_tx, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            config,
            provider,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(SessionStatus::Idle)),
            frame_tx: Mutex::new(None),
            worker: Mutex::new(None),
            presence_tx,
            interpretation_tx,
            status_tx,
            diagnostics: Arc::new(pipeline::PipelineDiagnostics::default()),
        })
    }

    /// Spawn the pipeline thread.
    ///
    /// # Errors
    /// - `SignaError::AlreadyRunning` if already started.
    /// - `SignaError::Io` if the thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SignaError::AlreadyRunning);
        }

        let detector = match SignPresenceDetector::new(self.config.detection.clone()) {
            Ok(d) => d,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        let interpreter =
            match SignInterpreter::new(Arc::clone(&self.provider), self.config.interpreter.clone())
            {
                Ok(i) => i,
                Err(e) => {
                    self.running.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            };

        self.diagnostics.reset();
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(self.config.frame_queue_capacity);

        let ctx = pipeline::PipelineContext {
            session_id: self.config.detection.session_id.clone(),
            detector: Box::new(detector),
            interpreter,
            frames: frame_rx,
            presence_tx: self.presence_tx.clone(),
            interpretation_tx: self.interpretation_tx.clone(),
            status_tx: self.status_tx.clone(),
            status: Arc::clone(&self.status),
            diagnostics: Arc::clone(&self.diagnostics),
        };

        self.set_status(SessionStatus::Running, None);
        let handle = std::thread::Builder::new()
            .name("signa-pipeline".into())
            .spawn(move || pipeline::run(ctx));
        let handle = match handle {
            Ok(h) => h,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.set_status(SessionStatus::Stopped, Some(e.to_string()));
                return Err(e.into());
            }
        };

        *self.frame_tx.lock() = Some(frame_tx);
        *self.worker.lock() = Some(handle);
        info!(language = self.provider.language_code(), "session started");
        Ok(())
    }

    /// Queue one frame without blocking.
    ///
    /// # Errors
    /// - `SignaError::NotRunning` if the session is not started.
    /// - `SignaError::FrameQueueFull` if the pipeline is behind; the frame is dropped.
    pub fn push_frame(&self, frame: SignFrame) -> Result<()> {
        let guard = self.frame_tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(SignaError::NotRunning);
        };
        match tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SignaError::FrameQueueFull),
            Err(TrySendError::Disconnected(_)) => Err(SignaError::NotRunning),
        }
    }

    /// Close the queue, wait for the pipeline to drain and flush, and join it.
    ///
    /// Every frame accepted by `push_frame` is processed before this returns.
    ///
    /// # Errors
    /// `SignaError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(SignaError::NotRunning);
        }

        // Dropping the only sender ends the pipeline's receive loop.
        drop(self.frame_tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if handle.join().is_err() {
                warn!("pipeline thread panicked");
                self.set_status(SessionStatus::Stopped, Some("pipeline panicked".into()));
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("session stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current session status (snapshot).
    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to presence transitions.
    pub fn subscribe_presence(&self) -> broadcast::Receiver<SignPresenceEvent> {
        self.presence_tx.subscribe()
    }

    /// Subscribe to segment interpretations.
    pub fn subscribe_interpretations(&self) -> broadcast::Receiver<SignInterpretation> {
        self.interpretation_tx.subscribe()
    }

    /// Subscribe to status changes.
    pub fn subscribe_status(&self) -> broadcast::Receiver<SessionStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> pipeline::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn set_status(&self, new_status: SessionStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(SessionStatusEvent {
            status: new_status,
            detail,
        });
    }
}

impl Drop for SignSession {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::AslProvider;

    fn session(config: SessionConfig) -> Result<SignSession> {
        SignSession::new(config, Arc::new(AslProvider::new()))
    }

    #[test]
    fn new_session_is_idle() {
        let s = session(SessionConfig::default()).expect("valid config");
        assert_eq!(s.status(), SessionStatus::Idle);
        assert!(!s.is_running());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = SessionConfig::default();
        config.frame_queue_capacity = 0;
        assert!(matches!(session(config), Err(SignaError::InvalidConfig(_))));

        let mut config = SessionConfig::default();
        config.event_capacity = 0;
        assert!(matches!(session(config), Err(SignaError::InvalidConfig(_))));

        let mut config = SessionConfig::default();
        config.interpreter.segment_size = 0;
        assert!(session(config).is_err());
    }

    #[test]
    fn push_before_start_is_not_running() {
        let s = session(SessionConfig::default()).expect("valid config");
        assert!(matches!(
            s.push_frame(SignFrame::new(0.5, 0)),
            Err(SignaError::NotRunning)
        ));
        assert!(matches!(s.stop(), Err(SignaError::NotRunning)));
    }

    #[test]
    fn double_start_is_rejected() {
        let s = session(SessionConfig::default()).expect("valid config");
        s.start().expect("first start");
        assert!(matches!(s.start(), Err(SignaError::AlreadyRunning)));
        s.stop().expect("stop");
        assert_eq!(s.status(), SessionStatus::Stopped);
    }

    #[test]
    fn session_config_from_pipeline_config() {
        let mut pipeline = PipelineConfig::default();
        pipeline.interpreter.segment_size = 5;
        pipeline.frame_queue_capacity = 16;
        pipeline.event_capacity = 1024;
        let config = SessionConfig::from(&pipeline);
        assert_eq!(config.interpreter.segment_size, 5);
        assert_eq!(config.frame_queue_capacity, 16);
        assert_eq!(config.event_capacity, 1024);
    }
}
