//! # WAV Container Writer
//!
//! Serializes a finished segment into a self-contained, playable WAV file:
//! the canonical 44-byte header followed by the raw PCM, sized exactly to the
//! buffer. Stripping the header back off a finished file recovers the segment
//! bytes unchanged.

use crate::audio::segment::RecordingRecord;
use crate::config::AudioConfig;
use crate::error::{RecorderError, RecorderResult};
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Length of the WAV header preceding the PCM data.
pub const HEADER_LEN: usize = 44;

/// Writes finished segments into the recordings directory.
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    directory: PathBuf,
    format: AudioConfig,
}

impl ContainerWriter {
    /// Create a writer rooted at `directory`, creating it if needed.
    pub fn new(directory: impl AsRef<Path>, format: AudioConfig) -> RecorderResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .map_err(|e| RecorderError::Persistence(format!("create {:?}: {}", directory, e)))?;
        Ok(Self { directory, format })
    }

    /// Serialize one finalized segment.
    ///
    /// ## Returns:
    /// The path of the written file, derived deterministically from the
    /// record (`{id}_{source}_{from}_{to}.wav`).
    pub fn write(&self, record: &RecordingRecord, pcm: &[u8]) -> RecorderResult<PathBuf> {
        let path = self.directory.join(record.file_name());
        let file = File::create(&path)
            .map_err(|e| RecorderError::Persistence(format!("create {:?}: {}", path, e)))?;
        let mut writer = BufWriter::new(file);

        self.write_header(&mut writer, pcm.len() as u32)
            .and_then(|_| writer.write_all(pcm))
            .and_then(|_| writer.flush())
            .map_err(|e| RecorderError::Persistence(format!("write {:?}: {}", path, e)))?;

        Ok(path)
    }

    /// Write the 44-byte PCM WAV header.
    ///
    /// Field layout: RIFF chunk (size = 36 + data length), "WAVE", "fmt "
    /// chunk of 16 bytes (PCM tag 1, channels, sample rate, byte rate,
    /// block align, bits per sample), then the "data" chunk sized to the
    /// PCM byte length.
    fn write_header(&self, writer: &mut impl Write, data_len: u32) -> std::io::Result<()> {
        let channels = self.format.channels;
        let bits = self.format.bits_per_sample;
        let block_align = channels * (bits / 8);
        let byte_rate = self.format.sample_rate * block_align as u32;

        writer.write_all(b"RIFF")?;
        writer.write_u32::<LittleEndian>(36 + data_len)?;
        writer.write_all(b"WAVE")?;

        writer.write_all(b"fmt ")?;
        writer.write_u32::<LittleEndian>(16)?; // fmt chunk length
        writer.write_u16::<LittleEndian>(1)?; // PCM format tag
        writer.write_u16::<LittleEndian>(channels)?;
        writer.write_u32::<LittleEndian>(self.format.sample_rate)?;
        writer.write_u32::<LittleEndian>(byte_rate)?;
        writer.write_u16::<LittleEndian>(block_align)?;
        writer.write_u16::<LittleEndian>(bits)?;

        writer.write_all(b"data")?;
        writer.write_u32::<LittleEndian>(data_len)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use byteorder::ReadBytesExt;
    use chrono::Utc;
    use std::io::Cursor;

    fn temp_writer() -> (ContainerWriter, PathBuf) {
        let dir = std::env::temp_dir().join(format!("rtsp-recorder-test-{}", uuid::Uuid::new_v4()));
        let format = AppConfig::default().audio;
        (ContainerWriter::new(&dir, format).unwrap(), dir)
    }

    /// Stripping the fixed header recovers the segment bytes exactly, and the
    /// data-chunk length field equals the PCM length.
    #[test]
    fn test_container_round_trip() {
        let (writer, dir) = temp_writer();
        let pcm: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();
        let record = RecordingRecord::new(1, "10.0.0.9", Utc::now(), Utc::now());

        let path = writer.write(&record, &pcm).unwrap();
        let bytes = fs::read(&path).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + pcm.len());
        assert_eq!(&bytes[HEADER_LEN..], &pcm[..]);

        // data chunk length field sits right before the PCM
        let mut cursor = Cursor::new(&bytes[40..44]);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 600);

        fs::remove_dir_all(dir).unwrap();
    }

    /// Header fields describe 8000 Hz mono 16-bit PCM.
    #[test]
    fn test_header_fields() {
        let (writer, dir) = temp_writer();
        let record = RecordingRecord::new(2, "10.0.0.9", Utc::now(), Utc::now());
        let path = writer.write(&record, &[0u8; 16]).unwrap();
        let bytes = fs::read(&path).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        let mut cursor = Cursor::new(&bytes[4..8]);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 36 + 16);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");

        let mut cursor = Cursor::new(&bytes[16..36]);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 16); // fmt length
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 1); // PCM
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 1); // mono
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 8000); // sample rate
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 16000); // byte rate
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 2); // block align
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 16); // bits

        assert_eq!(&bytes[36..40], b"data");

        fs::remove_dir_all(dir).unwrap();
    }

    /// Writing into an uncreatable directory reports a persistence error
    /// instead of panicking.
    #[test]
    fn test_write_failure_is_persistence_error() {
        let format = AppConfig::default().audio;
        let result = ContainerWriter::new("/dev/null/not-a-directory", format);
        assert!(matches!(result, Err(RecorderError::Persistence(_))));
    }
}
