use super::{be_u32, slice, Excerpt};
use crate::error::ProbeError;

const FORMAT: &str = "mp3";
/// How far past the tag to look for the first frame.
const SYNC_SEARCH_LIMIT: usize = 64 * 1024;
const ID3V1_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    Mpeg1,
    Mpeg2,
    Mpeg25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    I,
    II,
    III,
}

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    version: Version,
    layer: Layer,
    bitrate_bps: u32,
    sample_rate: u32,
    padding: u32,
    mono: bool,
}

const BITRATES_V1_L1: [u32; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BITRATES_V1_L2: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BITRATES_V1_L3: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BITRATES_V2_L1: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BITRATES_V2_L23: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

impl FrameHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let (b1, b2, b3) = match bytes {
            [0xFF, b1, b2, b3, ..] if b1 & 0xE0 == 0xE0 => (*b1, *b2, *b3),
            _ => return None,
        };

        let version = match (b1 >> 3) & 0b11 {
            0b00 => Version::Mpeg25,
            0b10 => Version::Mpeg2,
            0b11 => Version::Mpeg1,
            _ => return None,
        };
        let layer = match (b1 >> 1) & 0b11 {
            0b01 => Layer::III,
            0b10 => Layer::II,
            0b11 => Layer::I,
            _ => return None,
        };

        let bitrate_index = (b2 >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 15 {
            // free-format and invalid
            return None;
        }
        let table = match (version, layer) {
            (Version::Mpeg1, Layer::I) => &BITRATES_V1_L1,
            (Version::Mpeg1, Layer::II) => &BITRATES_V1_L2,
            (Version::Mpeg1, Layer::III) => &BITRATES_V1_L3,
            (_, Layer::I) => &BITRATES_V2_L1,
            (_, _) => &BITRATES_V2_L23,
        };

        let rates = match version {
            Version::Mpeg1 => [44_100, 48_000, 32_000],
            Version::Mpeg2 => [22_050, 24_000, 16_000],
            Version::Mpeg25 => [11_025, 12_000, 8_000],
        };
        let sample_rate = *rates.get(((b2 >> 2) & 0b11) as usize)?;

        Some(FrameHeader {
            version,
            layer,
            bitrate_bps: table[bitrate_index] * 1000,
            sample_rate,
            padding: ((b2 >> 1) & 1) as u32,
            mono: b3 >> 6 == 0b11,
        })
    }

    fn samples_per_frame(&self) -> u32 {
        match (self.layer, self.version) {
            (Layer::I, _) => 384,
            (Layer::II, _) => 1152,
            (Layer::III, Version::Mpeg1) => 1152,
            (Layer::III, _) => 576,
        }
    }

    fn frame_len(&self) -> usize {
        let len = match self.layer {
            Layer::I => (12 * self.bitrate_bps / self.sample_rate + self.padding) * 4,
            _ => self.samples_per_frame() / 8 * self.bitrate_bps / self.sample_rate + self.padding,
        };
        len as usize
    }

    fn side_info_len(&self) -> usize {
        match (self.version, self.mono) {
            (Version::Mpeg1, true) => 17,
            (Version::Mpeg1, false) => 32,
            (_, true) => 9,
            (_, false) => 17,
        }
    }

    fn same_stream(&self, other: &FrameHeader) -> bool {
        self.version == other.version
            && self.layer == other.layer
            && self.sample_rate == other.sample_rate
    }
}

/// Byte length of a leading ID3v2 tag, or 0.
pub(crate) fn id3v2_len(data: &[u8]) -> usize {
    match slice(data, 0, 10) {
        Some(h) if &h[0..3] == b"ID3" => {
            let size = h[6..10]
                .iter()
                .fold(0usize, |acc, b| (acc << 7) | (*b & 0x7F) as usize);
            let footer = if h[5] & 0x10 != 0 { 10 } else { 0 };
            10 + size + footer
        }
        _ => 0,
    }
}

/// First frame whose successor (if any) is a frame of the same stream.
fn find_first_frame(data: &[u8], from: usize) -> Option<(usize, FrameHeader)> {
    let end = data.len().min(from.saturating_add(SYNC_SEARCH_LIMIT));
    (from..end).find_map(|pos| {
        let header = FrameHeader::parse(&data[pos..])?;
        let next = pos + header.frame_len();
        if next == data.len() {
            return Some((pos, header));
        }
        let following = FrameHeader::parse(data.get(next..)?)?;
        header.same_stream(&following).then_some((pos, header))
    })
}

/// Frame count from a Xing/Info or VBRI header in the first frame.
fn vbr_frame_count(data: &[u8], frame_start: usize, header: &FrameHeader) -> Option<u32> {
    let xing = frame_start + 4 + header.side_info_len();
    if matches!(slice(data, xing, 4), Some(b"Xing") | Some(b"Info")) {
        let flags = be_u32(data, xing + 4)?;
        if flags & 0x1 != 0 {
            return be_u32(data, xing + 8).filter(|f| *f > 0);
        }
        return None;
    }

    let vbri = frame_start + 4 + 32;
    if slice(data, vbri, 4) == Some(b"VBRI") {
        return be_u32(data, vbri + 14).filter(|f| *f > 0);
    }

    None
}

/// Duration of an MPEG audio stream.
///
/// Uses the VBR frame count when the first frame carries one, otherwise
/// estimates from the first frame's bitrate and the audio payload size.
pub(crate) fn duration(excerpt: &Excerpt) -> Result<f64, ProbeError> {
    let (frame_start, header) = find_first_frame(&excerpt.head, 0)
        .ok_or_else(|| ProbeError::corrupt(FORMAT, "no frame sync"))?;

    if let Some(frames) = vbr_frame_count(&excerpt.head, frame_start, &header) {
        return Ok(frames as f64 * header.samples_per_frame() as f64 / header.sample_rate as f64);
    }

    let frame_start = excerpt.skipped + frame_start as u64;
    let mut end = excerpt.len;
    let tail = &excerpt.tail;
    if end >= frame_start + ID3V1_LEN as u64
        && tail.len() >= ID3V1_LEN
        && slice(tail, tail.len() - ID3V1_LEN, 3) == Some(b"TAG")
    {
        end -= ID3V1_LEN as u64;
    }
    let audio_bytes = end.saturating_sub(frame_start);
    Ok(audio_bytes as f64 * 8.0 / header.bitrate_bps as f64)
}

/// Looks like untagged MPEG audio: a frame sync at offset 0.
pub(crate) fn sniff(data: &[u8]) -> bool {
    FrameHeader::parse(data).is_some()
}
