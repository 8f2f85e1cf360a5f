use super::{be_u64, slice, Excerpt};
use crate::error::ProbeError;

const FORMAT: &str = "flac";
const STREAMINFO: u8 = 0;

/// Duration from the STREAMINFO block's sample rate and total sample count.
pub(crate) fn duration(excerpt: &Excerpt) -> Result<f64, ProbeError> {
    let data = excerpt.head.as_slice();
    if slice(data, 0, 4) != Some(b"fLaC") {
        return Err(ProbeError::corrupt(FORMAT, "missing fLaC marker"));
    }

    let mut offset = 4;
    loop {
        let header = slice(data, offset, 4)
            .ok_or_else(|| ProbeError::corrupt(FORMAT, "truncated metadata block"))?;
        let is_last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        let length = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
        let body = offset + 4;

        if block_type == STREAMINFO {
            // 20 bits sample rate, 3 bits channels, 5 bits depth, 36 bits total samples.
            let packed = be_u64(data, body + 10)
                .ok_or_else(|| ProbeError::corrupt(FORMAT, "truncated STREAMINFO"))?;
            let sample_rate = packed >> 44;
            let total_samples = packed & 0xF_FFFF_FFFF;
            if sample_rate == 0 {
                return Err(ProbeError::corrupt(FORMAT, "zero sample rate"));
            }
            if total_samples == 0 {
                return Err(ProbeError::corrupt(FORMAT, "unknown total samples"));
            }
            return Ok(total_samples as f64 / sample_rate as f64);
        }

        if is_last {
            return Err(ProbeError::corrupt(FORMAT, "no STREAMINFO block"));
        }
        offset = body + length;
    }
}
