//! Token streaming events.
//!
//! A completion streams each generated token as a [`CompletionEvent::Token`]
//! and finishes with exactly one terminal event, `Done` or `Error`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::engine::TokenCallback;
use crate::SessionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CompletionEvent {
    Token { value: String },
    Done { result: CompletionOutput },
    Error { error: String },
}

impl CompletionEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Token { .. })
    }
}

pub type EventSender = mpsc::UnboundedSender<CompletionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<CompletionEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Timing measured around one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub time_to_first_token: Option<Duration>,
    pub elapsed: Duration,
    pub tokens: u64,
    pub tokens_per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutput {
    pub content: String,
    pub stats: CompletionStats,
}

#[derive(Default)]
struct Progress {
    first_token: Option<Duration>,
    tokens: u64,
}

/// Bridges engine token callbacks to an optional event channel and measures timing.
///
/// `finish` consumes the forwarder, so a completion emits at most one terminal event.
pub(crate) struct EventForwarder {
    sender: Option<EventSender>,
    started: Instant,
    progress: Arc<Mutex<Progress>>,
}

impl EventForwarder {
    pub fn new(sender: Option<EventSender>) -> Self {
        Self {
            sender,
            started: Instant::now(),
            progress: Arc::default(),
        }
    }

    pub fn token_callback(&self) -> TokenCallback {
        let sender = self.sender.clone();
        let progress = self.progress.clone();
        let started = self.started;
        Box::new(move |token: String| {
            if let Ok(mut p) = progress.lock() {
                p.tokens += 1;
                if p.first_token.is_none() {
                    p.first_token = Some(started.elapsed());
                }
            }
            if let Some(tx) = &sender {
                // A dropped receiver only means nobody is listening.
                let _ = tx.send(CompletionEvent::Token { value: token });
            }
        })
    }

    pub fn stats(&self) -> CompletionStats {
        let elapsed = self.started.elapsed();
        let (first_token, tokens) = self
            .progress
            .lock()
            .map(|p| (p.first_token, p.tokens))
            .unwrap_or_default();
        let secs = elapsed.as_secs_f64();
        CompletionStats {
            time_to_first_token: first_token,
            elapsed,
            tokens,
            tokens_per_second: if secs > 0.0 { tokens as f64 / secs } else { 0.0 },
        }
    }

    pub fn finish(self, outcome: &Result<CompletionOutput, SessionError>) {
        let Some(tx) = self.sender else {
            return;
        };
        let event = match outcome {
            Ok(output) => CompletionEvent::Done {
                result: output.clone(),
            },
            Err(e) => CompletionEvent::Error {
                error: e.to_string(),
            },
        };
        let _ = tx.send(event);
    }
}
