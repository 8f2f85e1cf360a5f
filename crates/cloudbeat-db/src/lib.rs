//! Catalog repositories
//!
//! The catalog lives behind a PostgREST-style API with row-level security. Every
//! repository call takes a [`cloudbeat_core::Credential`]; with a caller credential
//! the platform only lets the call see and touch rows owned by that caller.
//!
//! `memory` provides the same contract in-process for local runs and tests.

pub mod error;
pub mod factory;
pub mod memory;
pub mod postgrest;
pub mod traits;

pub use error::{DbError, DbResult};
pub use factory::{create_repositories, Repositories};
pub use memory::{InMemoryPlaylistRepository, InMemorySongRepository};
pub use postgrest::{PostgrestClient, PostgrestPlaylistRepository, PostgrestSongRepository};
pub use traits::{PlaylistRepository, SongRepository};
