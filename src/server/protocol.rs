//! # Wire Protocol
//!
//! Frame classification and reply construction for the RTSP-like control
//! protocol the senders speak. Both control and payload frames arrive on the
//! same TCP stream; one read yields one frame.
//!
//! ## Framing Rules:
//! - **Control frame**: the bytes split on CRLF into at least two lines.
//!   Line 0 is the command token, line 1 the opaque sequence token.
//! - **Payload frame**: anything longer than the fixed 16-byte header that is
//!   not a control frame. The header is discarded; the rest is companded
//!   audio.
//! - Everything else (short reads, single-line text) is dropped silently.
//!
//! The CRLF check runs first, so a payload whose bytes happen to contain a
//! CRLF pair classifies as a control frame. That is how the senders in the
//! field behave and the session layer depends on the classification being
//! stable, so the order is part of the protocol here.

use uuid::Uuid;

/// Fixed header length of a payload frame, discarded before decoding.
pub const HEADER_LEN: usize = 16;

/// Protocol line terminator.
pub const CRLF: &str = "\r\n";

/// One classified frame from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Text control frame: command token plus echoed sequence token
    Control { command: String, cseq: String },

    /// Binary payload frame with its header already stripped
    Payload(Vec<u8>),
}

/// Recognized control commands. Anything else gets a reply but no action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Record,
    Pause,
    Other,
}

impl Command {
    /// Classify a command token by prefix. `RECORD rtsp://...` and a bare
    /// `RECORD` both match.
    pub fn parse(token: &str) -> Self {
        if token.starts_with("RECORD") {
            Command::Record
        } else if token.starts_with("PAUSE") {
            Command::Pause
        } else {
            Command::Other
        }
    }
}

/// Classify one read's worth of bytes into a frame, or `None` when the bytes
/// form no valid frame and must be dropped.
pub fn classify(buf: &[u8]) -> Option<Frame> {
    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split(CRLF);

    if let (Some(command), Some(cseq)) = (lines.next(), lines.next()) {
        return Some(Frame::Control {
            command: command.to_string(),
            cseq: cseq.to_string(),
        });
    }

    if buf.len() > HEADER_LEN {
        return Some(Frame::Payload(buf[HEADER_LEN..].to_vec()));
    }

    None
}

/// Build the reply for a control frame: status line, echoed sequence token,
/// session identifier, and the fixed capability list, each CRLF-terminated.
///
/// Every control frame receives exactly one of these, regardless of command.
pub fn reply(cseq: &str, session_id: &Uuid) -> Vec<u8> {
    format!(
        "RTSP/1.0 200 OK{CRLF}{cseq}{CRLF}Session: {session_id}{CRLF}\
         Public: DESCRIBE, SETUP, TEARDOWN, PLAY, PAUSE, RECORD{CRLF}{CRLF}"
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_frame_classification() {
        let frame = classify(b"RECORD rtsp://10.0.0.1/stream\r\n3\r\n");
        assert_eq!(
            frame,
            Some(Frame::Control {
                command: "RECORD rtsp://10.0.0.1/stream".to_string(),
                cseq: "3".to_string(),
            })
        );
    }

    /// A bare command with its sequence token is still a control frame.
    #[test]
    fn test_bare_record_is_control() {
        let frame = classify(b"RECORD\r\nseq1\r\n");
        match frame {
            Some(Frame::Control { command, cseq }) => {
                assert_eq!(Command::parse(&command), Command::Record);
                assert_eq!(cseq, "seq1");
            }
            other => panic!("expected control frame, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_strips_header() {
        let mut buf = vec![0xffu8; HEADER_LEN];
        buf.extend_from_slice(&[0x55; 100]);
        assert_eq!(classify(&buf), Some(Frame::Payload(vec![0x55; 100])));
    }

    /// Frames at or under the header length that are not control frames are
    /// dropped.
    #[test]
    fn test_short_frames_are_dropped() {
        assert_eq!(classify(&[0x01; HEADER_LEN]), None);
        assert_eq!(classify(b"PAUSE"), None); // single line, no CRLF
        assert_eq!(classify(b""), None);
    }

    /// CRLF inside binary data wins over the payload rule - classification
    /// order is part of the protocol.
    #[test]
    fn test_crlf_in_binary_classifies_as_control() {
        let mut buf = vec![0x41u8; 20];
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&[0x42; 20]);
        assert!(matches!(classify(&buf), Some(Frame::Control { .. })));
    }

    #[test]
    fn test_command_prefix_matching() {
        assert_eq!(Command::parse("RECORD"), Command::Record);
        assert_eq!(Command::parse("RECORD rtsp://x"), Command::Record);
        assert_eq!(Command::parse("PAUSE"), Command::Pause);
        assert_eq!(Command::parse("PAUSE rtsp://x"), Command::Pause);
        assert_eq!(Command::parse("DESCRIBE rtsp://x"), Command::Other);
        assert_eq!(Command::parse(""), Command::Other);
    }

    #[test]
    fn test_reply_contents() {
        let session_id = Uuid::new_v4();
        let reply = String::from_utf8(reply("seq1", &session_id)).unwrap();

        assert!(reply.starts_with("RTSP/1.0 200 OK\r\n"));
        assert!(reply.contains("seq1\r\n"));
        assert!(reply.contains(&format!("Session: {}\r\n", session_id)));
        assert!(reply.contains("Public: DESCRIBE, SETUP, TEARDOWN, PLAY, PAUSE, RECORD"));
        assert!(reply.ends_with("\r\n\r\n"));
    }
}
