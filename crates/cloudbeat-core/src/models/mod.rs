//! Data models for the application
//!
//! Catalog rows, playlists and the credential every collaborator call carries.

mod credential;
mod ids;
mod playlist;
mod song;

pub use credential::*;
pub use ids::deserialize_id;
pub use playlist::*;
pub use song::*;
