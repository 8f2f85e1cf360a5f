//! CloudBeat Storage Library
//!
//! Blob storage abstraction for uploaded audio, with a Supabase Storage backend
//! and a local filesystem backend.
//!
//! # Storage key format
//!
//! Every key is owner-scoped: `{user_id}/{unix_seconds}_{sanitized_filename}`.
//! The first path segment is what the platform's storage policies compare against
//! the caller's subject, so key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod signing;
pub mod supabase;
pub mod traits;

// Re-export commonly used types
pub use cloudbeat_core::StorageBackend;
pub use factory::{create_blob_store, ConfiguredBlobStore};
pub use keys::{allocate_storage_key, now_timestamp, sanitize_filename};
pub use local::{content_type_for, ByteStream, LocalBlobStore};
pub use supabase::SupabaseBlobStore;
pub use traits::{
    BlobStore, BucketStatus, SignedUrlResponse, StorageError, StorageResult, UploadReader,
};
