//! # Session Handler
//!
//! Per-connection protocol state machine. Each accepted connection gets its
//! own task running one of these; the handler owns the stream, the open
//! segment (if any), and nothing shared except the ID counter, the registry,
//! and the notifier.
//!
//! ## State Machine:
//! `Idle` (no open segment) → `Recording` (segment open, on RECORD) → `Idle`
//! (on PAUSE) → `Closed` (terminal, on disconnect/error/shutdown). The open
//! segment is simply `Option<Segment>`, so the invariant of at most one open
//! segment per connection holds by construction.
//!
//! ## Ordering:
//! Frames are processed strictly in arrival order, and every control frame's
//! reply is written before the next frame is read. No ordering exists across
//! connections.

use crate::audio::codec;
use crate::audio::container::ContainerWriter;
use crate::audio::segment::Segment;
use crate::error::{RecorderError, RecorderResult};
use crate::notify::Notify;
use crate::server::protocol::{self, Command, Frame};
use crate::state::{ConnectionRegistry, SegmentCounter};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Upper bound on one read - comfortably larger than any frame the senders
/// emit.
const READ_BUFFER_LEN: usize = 10_000;

/// State machine for a single sender connection.
pub struct SessionHandler {
    stream: TcpStream,
    source: String,

    /// Random identifier echoed in every control reply, valid for the
    /// connection's lifetime
    session_id: Uuid,

    /// The currently open segment, if a RECORD interval is active
    segment: Option<Segment>,

    idle_timeout: Duration,
    counter: Arc<SegmentCounter>,
    registry: Arc<ConnectionRegistry>,
    registry_key: u64,
    writer: ContainerWriter,
    notifier: Arc<dyn Notify>,
    shutdown: broadcast::Receiver<()>,
}

impl SessionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stream: TcpStream,
        source: String,
        idle_timeout: Duration,
        counter: Arc<SegmentCounter>,
        registry: Arc<ConnectionRegistry>,
        registry_key: u64,
        writer: ContainerWriter,
        notifier: Arc<dyn Notify>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            stream,
            source,
            session_id: Uuid::new_v4(),
            segment: None,
            idle_timeout,
            counter,
            registry,
            registry_key,
            writer,
            notifier,
            shutdown,
        }
    }

    /// Serve the connection to completion.
    ///
    /// Whatever ends the loop - EOF, fault, idle timeout, or shutdown - the
    /// teardown is the same: flush a non-empty open segment, deregister, and
    /// announce the disconnect. Failures are contained here; nothing
    /// propagates to the listener or to sibling connections.
    pub async fn run(mut self) {
        match self.serve().await {
            Ok(()) => debug!(source = %self.source, "connection closed by peer"),
            Err(RecorderError::Stopped) => {
                debug!(source = %self.source, "connection closed: user action")
            }
            Err(e) => info!(source = %self.source, error = %e, "connection closed"),
        }

        // Disconnect before PAUSE still persists what was recorded
        if let Some(segment) = self.segment.take() {
            if !segment.is_empty() {
                self.finalize(segment);
            }
        }

        self.registry.remove(self.registry_key);
        self.notifier.client_disconnected(&self.source);
    }

    /// The read loop: one read, one frame, strictly in order.
    async fn serve(&mut self) -> RecorderResult<()> {
        let mut buf = vec![0u8; READ_BUFFER_LEN];

        loop {
            let read = tokio::select! {
                _ = self.shutdown.recv() => return Err(RecorderError::Stopped),
                read = timeout(self.idle_timeout, self.stream.read(&mut buf)) => read,
            };

            let len = match read {
                // nothing heard within the idle deadline: the peer is gone
                Err(_) => return Err(RecorderError::Connection("idle read timeout".to_string())),
                Ok(Err(e)) => return Err(RecorderError::Connection(e.to_string())),
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(len)) => len,
            };

            match protocol::classify(&buf[..len]) {
                Some(Frame::Control { command, cseq }) => {
                    self.handle_control(&command, &cseq).await?;
                }
                Some(Frame::Payload(data)) => self.handle_payload(&data),
                // malformed frame: drop and keep reading
                None => debug!(source = %self.source, len, "dropped malformed frame"),
            }
        }
    }

    /// Reply to a control frame, then apply its command.
    ///
    /// The reply goes out first (and for every command, recognized or not) so
    /// the sender sees exactly one reply per control frame before anything
    /// else happens on the connection.
    async fn handle_control(&mut self, command: &str, cseq: &str) -> RecorderResult<()> {
        let reply = protocol::reply(cseq, &self.session_id);
        self.stream
            .write_all(&reply)
            .await
            .map_err(|e| RecorderError::Connection(e.to_string()))?;

        match Command::parse(command) {
            Command::Record => {
                if self.segment.is_some() {
                    // repeated RECORD replaces the open interval; the
                    // unflushed audio is discarded, matching sender
                    // expectations
                    warn!(source = %self.source, "RECORD while recording, dropping open segment");
                }
                self.segment = Some(Segment::open(&self.source));
                debug!(source = %self.source, "recording started");
            }
            Command::Pause => {
                // PAUSE with nothing open is a reply-only no-op
                if let Some(segment) = self.segment.take() {
                    self.finalize(segment);
                }
            }
            Command::Other => {}
        }

        Ok(())
    }

    /// Decode a payload frame and buffer it into the open segment.
    ///
    /// The chunk notification fires for every payload frame whether or not a
    /// segment is open; only the buffering is gated on the RECORD interval.
    fn handle_payload(&mut self, data: &[u8]) {
        let pcm = codec::decode(data);

        if let Some(segment) = self.segment.as_mut() {
            segment.append(&pcm);
        }

        self.notifier.data_received(&pcm);
    }

    /// Close the interval: claim an ID, write the container, announce the
    /// record.
    ///
    /// A write failure loses this segment's audio but is contained here - the
    /// connection keeps running and can open further segments.
    fn finalize(&self, segment: Segment) {
        let id = self.counter.next();
        let (record, pcm) = segment.finalize(id);

        match self.writer.write(&record, &pcm) {
            Ok(path) => debug!(source = %self.source, path = %path.display(), "segment saved"),
            Err(e) => error!(source = %self.source, error = %e, "failed to persist segment"),
        }

        self.notifier.recording_stopped(record);
    }
}
