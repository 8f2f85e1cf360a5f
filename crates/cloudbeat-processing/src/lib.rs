//! CloudBeat Processing Library
//!
//! Audio duration probing for uploaded files. Container headers are parsed
//! natively (WAV, FLAC, MP3, Ogg Vorbis/Opus); `ffprobe` is an optional fallback.

pub mod audio;
pub mod duration;
pub mod error;

pub use audio::{bytes_duration, file_duration, AudioProber};
pub use duration::format_duration;
pub use error::ProbeError;
