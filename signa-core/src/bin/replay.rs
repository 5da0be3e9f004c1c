//! Replay a recorded frame file through a `SignSession`.
//!
//! Prints one JSON document per presence event or interpretation on stdout and
//! a diagnostics summary on stderr. Logging goes to stderr, filtered by
//! `RUST_LOG` (default `signa_core=info`).

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use signa_core::{
    AslProvider, PipelineConfig, ProviderRegistry, SessionConfig, SignFrame, SignSession,
    SignaError, TEXT_HINT_KEY,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

const QUEUE_FULL_BACKOFF_MS: u64 = 2;

#[derive(Debug)]
struct Args {
    frames_path: PathBuf,
    config_path: Option<PathBuf>,
    hint: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("signa_core=info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("replay failed: {e}");
        std::process::exit(1);
    }
}

fn parse_args() -> Result<Args, String> {
    let mut frames_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut hint: Option<String> = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let Some(v) = it.next() else {
                    return Err("missing value for --config".into());
                };
                config_path = Some(PathBuf::from(v));
            }
            "--hint" => {
                let Some(v) = it.next() else {
                    return Err("missing value for --hint".into());
                };
                hint = Some(v);
            }
            "--help" | "-h" => {
                println!(
                    "Usage: signa-replay <frames.json> [--config <pipeline.json>] [--hint <text>]"
                );
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown argument: {other}"));
            }
            other => {
                if frames_path.is_some() {
                    return Err(format!("unexpected argument: {other}"));
                }
                frames_path = Some(PathBuf::from(other));
            }
        }
    }

    let frames_path = frames_path.ok_or_else(|| "missing <frames.json>".to_string())?;
    Ok(Args {
        frames_path,
        config_path,
        hint,
    })
}

fn run() -> Result<(), SignaError> {
    let args = parse_args().map_err(SignaError::InvalidConfig)?;

    let mut config = match &args.config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(hint) = &args.hint {
        config
            .interpreter
            .segment_metadata
            .insert(TEXT_HINT_KEY.into(), json!(hint));
    }

    let raw = std::fs::read_to_string(&args.frames_path)?;
    let frames: Vec<SignFrame> = serde_json::from_str(&raw)?;
    info!(path = ?args.frames_path, frames = frames.len(), "replaying frames");

    let registry = ProviderRegistry::new();
    registry.register(AslProvider::from_config(&config.provider_config("asl")));
    let language = config.interpreter.language_code.clone();
    let provider = registry.get(&language)?;

    let mut session_config = SessionConfig::from(&config);
    session_config.event_capacity =
        replay_event_capacity(session_config.event_capacity, frames.len());

    let session = SignSession::new(session_config, provider)?;
    let presence_printer = spawn_printer("presence", session.subscribe_presence());
    let interpretation_printer = spawn_printer("interpretation", session.subscribe_interpretations());

    session.start()?;
    for frame in frames {
        push_with_backoff(&session, frame)?;
    }
    session.stop()?;

    let diagnostics = session.diagnostics_snapshot();
    // Dropping the session closes the broadcast channels, ending the printers.
    drop(session);
    let mut skipped = 0;
    for printer in [presence_printer, interpretation_printer] {
        match printer.join() {
            Ok(n) => skipped += n,
            Err(_) => warn!("printer thread panicked"),
        }
    }

    eprintln!(
        "frames={} presence_events={} segments={} skipped={}",
        diagnostics.frames_in,
        diagnostics.presence_events,
        diagnostics.segments_interpreted,
        skipped
    );
    Ok(())
}

/// A replay yields at most one presence event and one interpretation per
/// frame, so a channel this deep never lags.
fn replay_event_capacity(configured: usize, frames: usize) -> usize {
    configured.max(frames + 1)
}

/// Replays are offline, so back-pressure waits instead of dropping frames.
fn push_with_backoff(session: &SignSession, frame: SignFrame) -> Result<(), SignaError> {
    loop {
        match session.push_frame(frame.clone()) {
            Err(SignaError::FrameQueueFull) => {
                thread::sleep(Duration::from_millis(QUEUE_FULL_BACKOFF_MS));
            }
            other => return other,
        }
    }
}

/// Print every received item as `{kind: item}`. Returns how many items were
/// lost to lag.
fn spawn_printer<T>(kind: &'static str, mut rx: broadcast::Receiver<T>) -> thread::JoinHandle<u64>
where
    T: Serialize + Clone + Send + 'static,
{
    thread::spawn(move || {
        let mut skipped = 0;
        loop {
            match rx.blocking_recv() {
                Ok(item) => match serde_json::to_value(&item) {
                    Ok(value) => {
                        let mut doc = serde_json::Map::new();
                        doc.insert(kind.to_string(), value);
                        println!("{}", serde_json::Value::Object(doc));
                    }
                    Err(e) => warn!("failed to serialize {kind}: {e}"),
                },
                Err(RecvError::Lagged(n)) => {
                    warn!(skipped = n, "{kind} printer lagged");
                    skipped += n;
                }
                Err(RecvError::Closed) => break skipped,
            }
        }
    })
}
