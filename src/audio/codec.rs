//! # G.711 A-law Codec
//!
//! Stateless expansion of companded A-law bytes to 16-bit linear PCM.
//! The senders transmit one A-law byte per sample; decoding is a total
//! function over all 256 byte values, so a payload frame can never fail to
//! decode and there are no partial frames.

use byteorder::{LittleEndian, WriteBytesExt};

/// Expand one A-law byte to a signed 16-bit linear sample.
///
/// Standard ITU-T G.711 expansion: toggle the even bits, split into sign /
/// segment / quantization fields, then shift the mantissa out by the segment
/// number. Output range is -32256..=32256.
pub fn alaw_to_linear(alaw: u8) -> i16 {
    let value = alaw ^ 0x55;

    let mut magnitude = ((value & 0x0f) as i16) << 4;
    let segment = (value & 0x70) >> 4;

    match segment {
        0 => magnitude += 8,
        1 => magnitude += 0x108,
        _ => {
            magnitude += 0x108;
            magnitude <<= segment - 1;
        }
    }

    if value & 0x80 != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Decode a companded frame to little-endian PCM16 bytes.
///
/// ## Returns:
/// Exactly `2 * data.len()` bytes: each input byte becomes one sample packed
/// low byte first.
pub fn decode(data: &[u8]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(data.len() * 2);
    for &byte in data {
        // Vec<u8> writes are infallible
        let _ = pcm.write_i16::<LittleEndian>(alaw_to_linear(byte));
    }
    pcm
}
