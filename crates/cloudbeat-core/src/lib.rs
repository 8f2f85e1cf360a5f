//! CloudBeat Core Library
//!
//! This crate provides the domain models, error types, configuration and constants
//! shared by every CloudBeat component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DatabaseBackend, StorageBackend, TokenVerificationMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    CatalogEntry, Credential, NewCatalogEntry, Playlist, PlaylistSong, PlaylistWithSongs,
};
