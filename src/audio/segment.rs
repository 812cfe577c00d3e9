//! # Segment Buffering
//!
//! A segment is one contiguous recording interval bounded by RECORD and PAUSE
//! (or by the connection going away). The decoded PCM for the open interval is
//! accumulated in memory and only touches disk at finalize time.
//!
//! ## Memory bound:
//! The buffer is bounded only by available memory. That is an explicit design
//! limit: sessions are short (camera operators record in bursts), and bounding
//! segment duration is a non-goal of the core.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// In-memory accumulator for one open recording interval.
///
/// Owned exclusively by a single connection task; at most one segment is open
/// per connection at any time, so no locking is involved.
#[derive(Debug)]
pub struct Segment {
    /// Remote source this interval belongs to
    source: String,

    /// When the RECORD command opened this interval
    started_at: DateTime<Utc>,

    /// Decoded PCM bytes, append-only
    pcm: Vec<u8>,
}

impl Segment {
    /// Open a new segment for `source`, starting now.
    pub fn open(source: &str) -> Self {
        Self {
            source: source.to_string(),
            started_at: Utc::now(),
            pcm: Vec::new(),
        }
    }

    /// Append decoded PCM bytes to the buffer.
    pub fn append(&mut self, pcm: &[u8]) {
        self.pcm.extend_from_slice(pcm);
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// Close the interval: stamp the end time, attach the assigned ID, and
    /// hand back the metadata plus the accumulated PCM.
    ///
    /// The ID comes from the shared counter and is claimed by the caller at
    /// finalize time - finalize order, not connect order, determines IDs.
    pub fn finalize(self, id: u64) -> (RecordingRecord, Vec<u8>) {
        let record = RecordingRecord::new(id, &self.source, self.started_at, Utc::now());
        (record, self.pcm)
    }
}

/// Externally visible metadata of a finalized segment.
///
/// This is what the notifier hands to the presentation layer and what the
/// history scanner later re-derives from filenames, so the fields here and
/// [`RecordingRecord::file_name`] are one contract.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordingRecord {
    /// Sequential ID, unique across all connections
    pub id: u64,

    /// Remote source address the audio came from
    pub source: String,

    /// Interval start, `HH-MM-SS` (colons replaced for filesystem safety)
    pub from: String,

    /// Interval end, same format
    pub to: String,
}

impl RecordingRecord {
    pub fn new(id: u64, source: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            id,
            source: source.to_string(),
            from: file_stamp(from),
            to: file_stamp(to),
        }
    }

    /// Deterministic file name: `{id}_{source}_{from}_{to}.wav`.
    pub fn file_name(&self) -> String {
        format!("{}_{}_{}_{}.wav", self.id, self.source, self.from, self.to)
    }
}

/// Human-readable clock time with `:` replaced by `-` so it can live in a
/// file name.
fn file_stamp(time: DateTime<Utc>) -> String {
    time.format("%H:%M:%S").to_string().replace(':', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_segment_accumulates_pcm() {
        let mut segment = Segment::open("10.0.0.5");
        assert!(segment.is_empty());

        segment.append(&[1, 2]);
        segment.append(&[3, 4, 5, 6]);
        assert_eq!(segment.len(), 6);

        let (record, pcm) = segment.finalize(7);
        assert_eq!(record.id, 7);
        assert_eq!(record.source, "10.0.0.5");
        assert_eq!(pcm, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_file_name_format() {
        let from = Utc.with_ymd_and_hms(2024, 5, 3, 9, 15, 4).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 5, 3, 9, 16, 30).unwrap();
        let record = RecordingRecord::new(12, "192.168.1.44", from, to);

        assert_eq!(record.from, "09-15-04");
        assert_eq!(record.to, "09-16-30");
        assert_eq!(record.file_name(), "12_192.168.1.44_09-15-04_09-16-30.wav");
        // no characters a filesystem would reject
        assert!(!record.file_name().contains(':'));
    }

    /// Consumers parse records as JSON off the event channel.
    #[test]
    fn test_record_serialization() {
        let from = Utc.with_ymd_and_hms(2024, 5, 3, 9, 15, 4).unwrap();
        let record = RecordingRecord::new(3, "10.1.1.1", from, from);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"id\":3"));
        assert!(json.contains("10.1.1.1"));
    }
}
