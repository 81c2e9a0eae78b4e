use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::Level;

use super::{ProgressEvent, ProgressLevel};

/// Envelope wrapping a progress event with metadata
#[derive(Debug, Clone)]
pub struct ProgressEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: ProgressEvent,
}

/// Handle for emitting progress events
///
/// This is cheaply cloneable and can be shared across tasks. Emission never
/// blocks the pipeline: a full or closed channel drops the event.
#[derive(Clone)]
pub struct ProgressHandle {
    tx: mpsc::Sender<ProgressEnvelope>,
}

/// Create a progress handle and the receiving end of its channel.
pub fn progress_channel(buffer: usize) -> (ProgressHandle, mpsc::Receiver<ProgressEnvelope>) {
    let (tx, rx) = mpsc::channel(buffer);
    (ProgressHandle::new(tx), rx)
}

impl ProgressHandle {
    /// Create a new progress handle from a channel sender
    pub fn new(tx: mpsc::Sender<ProgressEnvelope>) -> Self {
        Self { tx }
    }

    /// Try to emit a progress event without blocking
    ///
    /// Returns true if the event was sent successfully, false otherwise.
    pub fn emit(&self, event: ProgressEvent) -> bool {
        let level = dropped_log_level(&event);
        let message = event.message();
        let envelope = ProgressEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                if level == Level::WARN {
                    tracing::warn!("Dropped progress event ({}): {}", e, message);
                } else {
                    tracing::debug!("Dropped progress event ({}): {}", e, message);
                }
                false
            }
        }
    }
}

/// Log level for an event that could not be delivered.
///
/// Warnings and errors must stay visible in the log when the channel drops them.
fn dropped_log_level(event: &ProgressEvent) -> Level {
    match event.level() {
        ProgressLevel::Warning | ProgressLevel::Error => Level::WARN,
        ProgressLevel::Info | ProgressLevel::Success => Level::DEBUG,
    }
}
