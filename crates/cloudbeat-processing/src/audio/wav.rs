use super::{le_u32, slice, Excerpt};
use crate::error::ProbeError;

const FORMAT: &str = "wav";

/// Duration of a RIFF/WAVE file from its `fmt ` byte rate and `data` size.
///
/// Chunk headers must sit in the excerpt's head; the payload size is checked
/// against the real file length.
pub(crate) fn duration(excerpt: &Excerpt) -> Result<f64, ProbeError> {
    let data = excerpt.head.as_slice();
    if slice(data, 8, 4) != Some(b"WAVE") {
        return Err(ProbeError::corrupt(FORMAT, "missing WAVE tag"));
    }

    let mut offset = 12;
    let mut byte_rate = None;
    while let (Some(id), Some(size)) = (slice(data, offset, 4), le_u32(data, offset + 4)) {
        let body = offset + 8;
        match id {
            b"fmt " => {
                byte_rate = le_u32(data, body + 8);
            }
            b"data" => {
                let rate = byte_rate
                    .filter(|r| *r > 0)
                    .ok_or_else(|| ProbeError::corrupt(FORMAT, "no byte rate before data chunk"))?;
                // Streaming writers leave the size at 0 or 0xFFFFFFFF.
                let available = excerpt.stream_len().saturating_sub(body as u64);
                let size = match size as u64 {
                    0 | 0xFFFF_FFFF => available,
                    s => s.min(available),
                };
                return Ok(size as f64 / rate as f64);
            }
            _ => {}
        }
        // Chunks are word aligned.
        offset = body + size as usize + (size as usize & 1);
    }

    Err(ProbeError::corrupt(FORMAT, "no data chunk"))
}
