//! # Notifier Boundary
//!
//! Outbound-only interface between the recorder core and whatever presents it
//! (a UI, a log, a message bus). The core pushes lifecycle events through this
//! boundary and assumes nothing about how the consumer marshals them to a
//! presentation thread.
//!
//! ## Contract:
//! Exactly six operations (see [`Notify`]). Implementations must:
//! - tolerate concurrent invocation from every connection task plus the
//!   listener's own task
//! - not block the caller for unbounded time (the caller is a protocol loop
//!   with a reply deadline)
//!
//! ## Provided sinks:
//! - [`LogNotifier`]: structured-logging sink used by the binary
//! - [`ChannelNotifier`]: queue sink for a real presentation layer - events are
//!   serialized data ([`RecorderEvent`]) pushed onto an unbounded channel with
//!   a single consumer on the other end

use crate::audio::segment::RecordingRecord;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lifecycle notifications emitted by the recorder core.
///
/// ## Concurrency:
/// Called from many tasks at once; `Send + Sync` and `&self` receivers are
/// therefore part of the contract, not an implementation detail.
pub trait Notify: Send + Sync {
    /// A sender connected; `source` is the remote address in string form.
    fn client_connected(&self, source: &str);

    /// A sender disconnected (EOF, fault, idle timeout, or shutdown).
    fn client_disconnected(&self, source: &str);

    /// A payload frame arrived and was decoded. Fires for every payload frame,
    /// whether or not a segment is currently open.
    fn data_received(&self, pcm: &[u8]);

    /// A segment was finalized and written to disk.
    fn recording_stopped(&self, record: RecordingRecord);

    /// The listener bound its socket and is accepting connections.
    fn listener_started(&self);

    /// The listener stopped. `cause` is "user action" for a deliberate stop,
    /// anything else describes a fault (e.g. "address already in use").
    fn listener_stopped(&self, cause: &str);
}

/// Event data form of the [`Notify`] operations, for consumers that want the
/// notifications as values on a queue rather than callbacks.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecorderEvent {
    ClientConnected { source: String },
    ClientDisconnected { source: String },
    DataReceived { pcm: Vec<u8> },
    RecordingStopped { record: RecordingRecord },
    ListenerStarted,
    ListenerStopped { cause: String },
}

/// Notifier that reports events through `tracing`.
///
/// Decoded audio chunks are logged at debug level by size only; dumping PCM
/// into the log would drown everything else.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notify for LogNotifier {
    fn client_connected(&self, source: &str) {
        info!(source, "client connected");
    }

    fn client_disconnected(&self, source: &str) {
        info!(source, "client disconnected");
    }

    fn data_received(&self, pcm: &[u8]) {
        debug!(bytes = pcm.len(), "audio chunk received");
    }

    fn recording_stopped(&self, record: RecordingRecord) {
        info!(
            id = record.id,
            source = %record.source,
            from = %record.from,
            to = %record.to,
            "recording saved"
        );
    }

    fn listener_started(&self) {
        info!("listener started");
    }

    fn listener_stopped(&self, cause: &str) {
        if cause == "user action" {
            info!("listener stopped (user action)");
        } else {
            warn!(cause, "listener stopped");
        }
    }
}

/// Notifier that forwards events onto an unbounded mpsc channel.
///
/// `send` on an unbounded channel never blocks, which keeps the protocol loops
/// responsive no matter how slow the consumer is. If the consumer went away,
/// events are dropped silently - the core must keep running without a
/// presentation layer attached.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<RecorderEvent>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving half for the consumer.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RecorderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, event: RecorderEvent) {
        let _ = self.tx.send(event);
    }
}

impl Notify for ChannelNotifier {
    fn client_connected(&self, source: &str) {
        self.push(RecorderEvent::ClientConnected {
            source: source.to_string(),
        });
    }

    fn client_disconnected(&self, source: &str) {
        self.push(RecorderEvent::ClientDisconnected {
            source: source.to_string(),
        });
    }

    fn data_received(&self, pcm: &[u8]) {
        self.push(RecorderEvent::DataReceived { pcm: pcm.to_vec() });
    }

    fn recording_stopped(&self, record: RecordingRecord) {
        self.push(RecorderEvent::RecordingStopped { record });
    }

    fn listener_started(&self) {
        self.push(RecorderEvent::ListenerStarted);
    }

    fn listener_stopped(&self, cause: &str) {
        self.push(RecorderEvent::ListenerStopped {
            cause: cause.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_forwards_events() {
        let (notifier, mut rx) = ChannelNotifier::new();

        notifier.listener_started();
        notifier.client_connected("10.0.0.7");
        notifier.data_received(&[1, 2, 3, 4]);
        notifier.listener_stopped("user action");

        assert_eq!(rx.recv().await, Some(RecorderEvent::ListenerStarted));
        assert_eq!(
            rx.recv().await,
            Some(RecorderEvent::ClientConnected {
                source: "10.0.0.7".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(RecorderEvent::DataReceived {
                pcm: vec![1, 2, 3, 4]
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(RecorderEvent::ListenerStopped {
                cause: "user action".to_string()
            })
        );
    }

    /// Pushing with no consumer attached must not error or block.
    #[tokio::test]
    async fn test_channel_notifier_survives_dropped_consumer() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.client_connected("10.0.0.8");
        notifier.listener_stopped("user action");
    }

    /// The serialized shape is what presentation-layer consumers parse.
    #[test]
    fn test_event_serialization() {
        let event = RecorderEvent::ListenerStopped {
            cause: "user action".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("listener_stopped"));
        assert!(json.contains("user action"));
    }
}
