//! # Connection Handling and Protocol Engine
//!
//! The server side of the recorder: a TCP listener that accepts sender
//! connections, and a per-connection session handler that demultiplexes
//! RTSP-style control frames from raw payload frames on the same stream.
//!
//! ## Key Components:
//! - **protocol**: frame classification and reply construction (pure logic)
//! - **session**: per-connection protocol state machine and segment lifecycle
//! - **listener**: accept loop, connection fan-out, start/stop lifecycle
//!
//! ## Concurrency Model:
//! One task for the accept loop plus exactly one task per accepted
//! connection - unbounded fan-out, no worker pool. The only state shared
//! across tasks is the segment-ID counter and the connection registry (see
//! `crate::state`); everything else is owned by a single task.

pub mod listener;
pub mod protocol;
pub mod session;
