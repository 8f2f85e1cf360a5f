use super::{le_u16, le_u32, le_u64, slice, Excerpt};
use crate::error::ProbeError;

const FORMAT: &str = "ogg";
const CAPTURE: &[u8; 4] = b"OggS";
const OPUS_RATE: u32 = 48_000;

struct Stream {
    sample_rate: u32,
    pre_skip: u64,
}

/// Codec parameters from the first page's identification packet.
fn identify(data: &[u8]) -> Result<Stream, ProbeError> {
    let segments = *data
        .get(26)
        .ok_or_else(|| ProbeError::corrupt(FORMAT, "truncated page header"))? as usize;
    let packet = 27 + segments;

    if slice(data, packet, 7) == Some(b"\x01vorbis") {
        let sample_rate = le_u32(data, packet + 12)
            .filter(|r| *r > 0)
            .ok_or_else(|| ProbeError::corrupt(FORMAT, "bad vorbis sample rate"))?;
        return Ok(Stream {
            sample_rate,
            pre_skip: 0,
        });
    }

    if slice(data, packet, 8) == Some(b"OpusHead") {
        let pre_skip = le_u16(data, packet + 10)
            .ok_or_else(|| ProbeError::corrupt(FORMAT, "truncated OpusHead"))?;
        // Opus granule positions always count 48 kHz samples.
        return Ok(Stream {
            sample_rate: OPUS_RATE,
            pre_skip: pre_skip as u64,
        });
    }

    Err(ProbeError::Unsupported)
}

/// Granule position of the last complete page header in `data`.
fn last_granule(data: &[u8]) -> Option<u64> {
    let mut end = data.len();
    while end >= CAPTURE.len() {
        let pos = data[..end].windows(CAPTURE.len()).rposition(|w| w == CAPTURE)?;
        if data.get(pos + 4) == Some(&0) {
            if let Some(granule) = le_u64(data, pos + 6) {
                // -1 marks a page on which no packet ends.
                if granule != u64::MAX {
                    return Some(granule);
                }
            }
        }
        end = pos;
    }
    None
}

/// Duration of an Ogg Vorbis or Opus stream.
///
/// The codec comes from the first page in the head, the length from the last
/// page in the tail.
pub(crate) fn duration(excerpt: &Excerpt) -> Result<f64, ProbeError> {
    if slice(&excerpt.head, 0, 4) != Some(CAPTURE) {
        return Err(ProbeError::corrupt(FORMAT, "missing capture pattern"));
    }
    let stream = identify(&excerpt.head)?;
    let granule = last_granule(&excerpt.tail)
        .filter(|g| *g > 0)
        .ok_or_else(|| ProbeError::corrupt(FORMAT, "no granule position"))?;

    Ok(granule.saturating_sub(stream.pre_skip) as f64 / stream.sample_rate as f64)
}
