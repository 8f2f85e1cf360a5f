//! Test fixtures: minimal audio payloads.

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz frame header.
const MP3_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
const MP3_FRAME_LEN: usize = 417;

/// A single MP3 frame whose Xing header declares 6891 frames (3:00).
pub fn three_minute_mp3() -> Vec<u8> {
    let mut frame = vec![0u8; MP3_FRAME_LEN];
    frame[..4].copy_from_slice(&MP3_HEADER);
    frame[36..40].copy_from_slice(b"Xing");
    frame[40..44].copy_from_slice(&1u32.to_be_bytes());
    frame[44..48].copy_from_slice(&6891u32.to_be_bytes());
    frame
}

/// 16-bit PCM WAV of silence.
pub fn wav(sample_rate: u32, channels: u16, seconds: u32) -> Vec<u8> {
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = byte_rate * seconds;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

/// Bytes no prober recognizes.
pub fn garbage() -> Vec<u8> {
    b"this is not an audio file, just some text pretending to be one".to_vec()
}
