//! Blocking per-session pipeline loop.
//!
//! ## Pipeline stages (per frame)
//!
//! ```text
//! 1. Receive frame from the session's bounded queue
//! 2. Presence detector → optional SignPresenceEvent → broadcast
//! 3. Segmenting interpreter → zero or one SignInterpretation → broadcast
//! 4. On queue close: flush the trailing segment, publish, mark Stopped
//! ```
//!
//! The loop owns the detector and interpreter outright, so neither needs
//! locking. Provider calls are synchronous: a slow classifier delays frame
//! ingestion for this session only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, info_span};

use crate::{
    buffering::frame::SignFrame,
    interpreter::SignInterpreter,
    ipc::events::{SessionStatus, SessionStatusEvent, SignInterpretation, SignPresenceEvent},
    presence::PresenceDetector,
};

pub struct PipelineDiagnostics {
    pub frames_in: AtomicUsize,
    pub presence_events: AtomicUsize,
    pub segments_interpreted: AtomicUsize,
    pub interpretations_emitted: AtomicUsize,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            frames_in: AtomicUsize::new(0),
            presence_events: AtomicUsize::new(0),
            segments_interpreted: AtomicUsize::new(0),
            interpretations_emitted: AtomicUsize::new(0),
        }
    }
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.frames_in.store(0, Ordering::Relaxed);
        self.presence_events.store(0, Ordering::Relaxed);
        self.segments_interpreted.store(0, Ordering::Relaxed);
        self.interpretations_emitted.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            presence_events: self.presence_events.load(Ordering::Relaxed),
            segments_interpreted: self.segments_interpreted.load(Ordering::Relaxed),
            interpretations_emitted: self.interpretations_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub frames_in: usize,
    pub presence_events: usize,
    pub segments_interpreted: usize,
    /// Interpretations actually delivered to at least one subscriber.
    pub interpretations_emitted: usize,
}

/// All context the pipeline needs, passed as one struct so the closure stays tidy.
pub struct PipelineContext {
    pub session_id: Option<String>,
    pub detector: Box<dyn PresenceDetector>,
    pub interpreter: SignInterpreter,
    pub frames: Receiver<SignFrame>,
    pub presence_tx: broadcast::Sender<SignPresenceEvent>,
    pub interpretation_tx: broadcast::Sender<SignInterpretation>,
    pub status_tx: broadcast::Sender<SessionStatusEvent>,
    pub status: Arc<Mutex<SessionStatus>>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

/// Run until every sender of `ctx.frames` has been dropped.
pub fn run(mut ctx: PipelineContext) {
    let span = info_span!("sign_pipeline", session = ?ctx.session_id);
    let _guard = span.enter();
    info!("pipeline started");

    while let Ok(frame) = ctx.frames.recv() {
        ctx.diagnostics.frames_in.fetch_add(1, Ordering::Relaxed);

        if let Some(event) = ctx.detector.observe(frame.sign_likelihood) {
            ctx.diagnostics
                .presence_events
                .fetch_add(1, Ordering::Relaxed);
            debug!(event_type = ?event.event_type, confidence = event.confidence, "presence transition");
            let _ = ctx.presence_tx.send(event);
        }

        let interpretations = ctx.interpreter.ingest_frames(std::iter::once(frame));
        publish(&ctx, interpretations);
    }

    // Queue closed: the trailing partial segment is still owed to subscribers.
    let trailing = ctx.interpreter.flush();
    publish(&ctx, trailing);

    *ctx.status.lock() = SessionStatus::Stopped;
    let _ = ctx.status_tx.send(SessionStatusEvent {
        status: SessionStatus::Stopped,
        detail: None,
    });
    info!(
        frames = ctx.diagnostics.frames_in.load(Ordering::Relaxed),
        "pipeline stopped"
    );
}

fn publish(ctx: &PipelineContext, interpretations: Vec<SignInterpretation>) {
    for interp in interpretations {
        ctx.diagnostics
            .segments_interpreted
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            segment_id = %interp.segment_id,
            confidence = interp.confidence,
            "interpretation ready"
        );
        if ctx.interpretation_tx.send(interp).is_ok() {
            ctx.diagnostics
                .interpretations_emitted
                .fetch_add(1, Ordering::Relaxed);
        }
    }
}
