//! # Audio Processing Module
//!
//! Everything between the wire and the disk: codec expansion, per-segment
//! buffering, and container serialization.
//!
//! ## Key Components:
//! - **Codec**: stateless G.711 A-law byte → 16-bit linear PCM expansion
//! - **Segment**: append-only PCM accumulator for one recording interval,
//!   plus the `RecordingRecord` metadata that names the finished file
//! - **Container**: WAV serialization of a finished segment
//!
//! ## Audio Format:
//! - **Sample Rate**: 8 kHz (8,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers

pub mod codec;
pub mod container;
pub mod segment;
