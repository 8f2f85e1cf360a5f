//! Application-wide constants.

/// Artist recorded when an upload does not name one.
pub const DEFAULT_ARTIST: &str = "Unknown Artist";

/// Album recorded when an upload does not name one.
pub const DEFAULT_ALBUM: &str = "Unknown Album";

/// Duration recorded when the audio length cannot be probed.
pub const DEFAULT_DURATION: &str = "0:00";

/// Content type used when the client does not send one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Bucket holding uploaded audio.
pub const DEFAULT_BUCKET: &str = "music";

/// Lifetime of a delivery URL.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

pub const SONGS_TABLE: &str = "songs";
pub const PLAYLISTS_TABLE: &str = "playlists";
pub const PLAYLIST_SONGS_TABLE: &str = "playlist_songs";
