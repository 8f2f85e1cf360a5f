pub mod playlists;
pub mod public_file;
pub mod root;
pub mod songs;
