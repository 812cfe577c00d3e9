//! # Listener
//!
//! Owns the accept loop and the recorder's global start/stop lifecycle. Each
//! accepted connection is registered, announced, and handed to a freshly
//! spawned [`SessionHandler`] task; the listener itself never touches a
//! connection again after the hand-off.
//!
//! ## Cancellation:
//! `stop()` broadcasts a shutdown signal. The accept loop and every session's
//! pending read observe it through `tokio::select!` and wind down; the accept
//! loop reports the stop as `"user action"`, distinct from a genuine accept
//! fault. Stop is idempotent and never fails.

use crate::audio::container::ContainerWriter;
use crate::config::AppConfig;
use crate::error::{RecorderError, RecorderResult};
use crate::notify::Notify;
use crate::server::session::SessionHandler;
use crate::state::{ConnectionRegistry, SegmentCounter};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// The recorder core: listener lifecycle plus the shared pieces every
/// connection task needs.
pub struct Recorder {
    config: AppConfig,
    counter: Arc<SegmentCounter>,
    registry: Arc<ConnectionRegistry>,
    writer: ContainerWriter,
    notifier: Arc<dyn Notify>,
    shutdown: broadcast::Sender<()>,
    stopped: AtomicBool,
}

impl Recorder {
    /// Assemble a recorder from its collaborators.
    ///
    /// The counter comes in from outside so the process can seed it from
    /// whatever already exists on disk; the recorder itself never persists it.
    pub fn new(
        config: AppConfig,
        counter: Arc<SegmentCounter>,
        notifier: Arc<dyn Notify>,
    ) -> RecorderResult<Self> {
        let writer = ContainerWriter::new(&config.recording.directory, config.audio.clone())?;
        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            config,
            counter,
            registry: Arc::new(ConnectionRegistry::new()),
            writer,
            notifier,
            shutdown,
            stopped: AtomicBool::new(false),
        })
    }

    /// Bind the listening socket and start accepting connections.
    ///
    /// On success the "listener started" event fires and the bound address is
    /// returned (port 0 in the config yields an OS-assigned port). A bind
    /// failure is reported through `listener_stopped` with a descriptive
    /// cause and returned as a bind error - the listener never reaches its
    /// accepting state.
    pub async fn start(&self) -> RecorderResult<SocketAddr> {
        let bind_addr = format!("{}:{}", self.config.server.host, self.config.server.port);

        let listener = match TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let cause = if e.kind() == ErrorKind::AddrInUse {
                    format!("address already in use: {}", bind_addr)
                } else {
                    e.to_string()
                };
                self.notifier.listener_stopped(&cause);
                return Err(RecorderError::Bind(cause));
            }
        };

        let local_addr = listener
            .local_addr()
            .map_err(|e| RecorderError::Bind(e.to_string()))?;

        info!(%local_addr, "listener started");
        self.notifier.listener_started();

        let ctx = AcceptContext {
            idle_timeout: Duration::from_secs(self.config.recording.idle_timeout_secs),
            counter: Arc::clone(&self.counter),
            registry: Arc::clone(&self.registry),
            writer: self.writer.clone(),
            notifier: Arc::clone(&self.notifier),
            shutdown: self.shutdown.clone(),
        };
        tokio::spawn(accept_loop(listener, ctx));

        Ok(local_addr)
    }

    /// Stop the listener and every live connection.
    ///
    /// Broadcasting the shutdown signal unblocks the accept loop and each
    /// session's pending read; sessions flush their open segments on the way
    /// out. Safe to call any number of times, from any task, and never
    /// errors.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let open = self.registry.sources();
        if open.is_empty() {
            debug!("stop requested");
        } else {
            debug!(sources = ?open, "stop requested with connections still open");
        }
        // no receivers means nothing was running; that is fine
        let _ = self.shutdown.send(());
    }

    /// Number of currently connected senders.
    pub fn active_connections(&self) -> usize {
        self.registry.active_count()
    }
}

/// Everything the accept loop hands each new session.
struct AcceptContext {
    idle_timeout: Duration,
    counter: Arc<SegmentCounter>,
    registry: Arc<ConnectionRegistry>,
    writer: ContainerWriter,
    notifier: Arc<dyn Notify>,
    shutdown: broadcast::Sender<()>,
}

/// Accept connections until shutdown or an accept fault.
///
/// Dropping the `TcpListener` on exit closes the listening socket. The
/// explicit stop reports `"user action"`; any other way out of the loop is a
/// fault and reports its cause.
async fn accept_loop(listener: TcpListener, ctx: AcceptContext) {
    let mut shutdown_rx = ctx.shutdown.subscribe();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                ctx.notifier.listener_stopped("user action");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let source = peer.ip().to_string();
                    let key = ctx.registry.insert(&source);
                    ctx.notifier.client_connected(&source);

                    let handler = SessionHandler::new(
                        stream,
                        source,
                        ctx.idle_timeout,
                        Arc::clone(&ctx.counter),
                        Arc::clone(&ctx.registry),
                        key,
                        ctx.writer.clone(),
                        Arc::clone(&ctx.notifier),
                        ctx.shutdown.subscribe(),
                    );
                    tokio::spawn(handler.run());
                }
                Err(e) => {
                    ctx.notifier.listener_stopped(&e.to_string());
                    return;
                }
            }
        }
    }
}
