//! Audio duration probing.

mod ffprobe;
mod flac;
mod mp3;
mod ogg;
mod wav;

use cloudbeat_core::constants::DEFAULT_DURATION;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::duration::format_duration;
use crate::error::ProbeError;

pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    data.get(offset..offset.checked_add(len)?)
}

pub(crate) fn le_u16(data: &[u8], offset: usize) -> Option<u16> {
    slice(data, offset, 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn le_u32(data: &[u8], offset: usize) -> Option<u32> {
    slice(data, offset, 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn le_u64(data: &[u8], offset: usize) -> Option<u64> {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice(data, offset, 8)?);
    Some(u64::from_le_bytes(buf))
}

pub(crate) fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    slice(data, offset, 4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn be_u64(data: &[u8], offset: usize) -> Option<u64> {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice(data, offset, 8)?);
    Some(u64::from_be_bytes(buf))
}

/// Bytes read from the start of the stream.
const HEAD_LEN: usize = 128 * 1024;
/// Bytes read from the end of the file; covers the largest Ogg page and an ID3v1 tag.
const TAIL_LEN: usize = 64 * 1024;

/// Bounded view of an audio file.
///
/// Parsers only ever see the stream start and the file end, plus the total
/// length for size-based estimates.
#[derive(Debug)]
pub(crate) struct Excerpt {
    /// Length of a leading ID3v2 tag; `head` starts right after it.
    pub(crate) skipped: u64,
    pub(crate) head: Vec<u8>,
    pub(crate) tail: Vec<u8>,
    pub(crate) len: u64,
}

impl Excerpt {
    pub(crate) fn from_bytes(data: &[u8]) -> Self {
        let skipped = mp3::id3v2_len(data).min(data.len());
        let head_end = data.len().min(skipped + HEAD_LEN);
        let tail_start = data.len().saturating_sub(TAIL_LEN).max(skipped);
        Self {
            skipped: skipped as u64,
            head: data[skipped..head_end].to_vec(),
            tail: data[tail_start..].to_vec(),
            len: data.len() as u64,
        }
    }

    fn read(path: &Path) -> Result<Self, ProbeError> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let mut head = read_window(&mut file, 0, HEAD_LEN)?;
        let skipped = (mp3::id3v2_len(&head) as u64).min(len);
        if skipped > 0 {
            head = read_window(&mut file, skipped, HEAD_LEN)?;
        }
        let tail_start = len.saturating_sub(TAIL_LEN as u64).max(skipped);
        let tail = read_window(&mut file, tail_start, TAIL_LEN)?;

        Ok(Self {
            skipped,
            head,
            tail,
            len,
        })
    }

    /// Bytes from the start of `head` to the end of the file.
    pub(crate) fn stream_len(&self) -> u64 {
        self.len - self.skipped
    }
}

fn read_window(file: &mut File, offset: u64, max: usize) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::with_capacity(max);
    file.by_ref().take(max as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

fn excerpt_duration(excerpt: &Excerpt) -> Result<f64, ProbeError> {
    if excerpt.len == 0 {
        return Err(ProbeError::Empty);
    }

    // `head` starts after any ID3v2 tag; tagged FLAC exists in the wild.
    match slice(&excerpt.head, 0, 4) {
        Some(b"RIFF") => wav::duration(excerpt),
        Some(b"fLaC") => flac::duration(excerpt),
        Some(b"OggS") => ogg::duration(excerpt),
        _ if excerpt.skipped > 0 || mp3::sniff(&excerpt.head) => mp3::duration(excerpt),
        _ => Err(ProbeError::Unsupported),
    }
}

/// Duration in seconds of an in-memory audio file, detected by signature.
pub fn bytes_duration(data: &[u8]) -> Result<f64, ProbeError> {
    excerpt_duration(&Excerpt::from_bytes(data))
}

/// Duration in seconds of an audio file on disk, reading only its start and end.
pub fn file_duration(path: &Path) -> Result<f64, ProbeError> {
    excerpt_duration(&Excerpt::read(path)?)
}

/// Derives playback length for uploaded files.
#[derive(Debug, Clone, Default)]
pub struct AudioProber {
    ffprobe_path: Option<String>,
}

impl AudioProber {
    /// `ffprobe_path` enables the external fallback for formats the native
    /// parsers do not handle.
    pub fn new(ffprobe_path: Option<String>) -> Self {
        Self { ffprobe_path }
    }

    /// Duration in seconds.
    ///
    /// The file is parsed on the blocking pool from a bounded excerpt; on failure, and if configured,
    /// `ffprobe` gets a second try.
    pub async fn probe_seconds(&self, file_path: &Path) -> Result<f64, ProbeError> {
        let path: PathBuf = file_path.to_path_buf();
        let native = tokio::task::spawn_blocking(move || file_duration(&path))
            .await
            .map_err(|e| ProbeError::Join(e.to_string()))?;

        match (native, self.ffprobe_path.as_deref()) {
            (Ok(secs), _) => Ok(secs),
            (Err(ProbeError::Empty), _) => Err(ProbeError::Empty),
            (Err(native_err), Some(ffprobe)) => {
                tracing::debug!(error = %native_err, "Native probe failed, trying ffprobe");
                ffprobe::duration(ffprobe, file_path).await
            }
            (Err(native_err), None) => Err(native_err),
        }
    }

    /// Duration formatted as `M:SS`; `0:00` when it cannot be determined.
    #[tracing::instrument(skip(self), fields(service = "audio"))]
    pub async fn probe_duration(&self, file_path: &Path) -> String {
        match self.probe_seconds(file_path).await {
            Ok(secs) => format_duration(secs),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    event = "MetadataProbeFailed",
                    "Could not determine audio duration, recording default"
                );
                DEFAULT_DURATION.to_string()
            }
        }
    }
}
