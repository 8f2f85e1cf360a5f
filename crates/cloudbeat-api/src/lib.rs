//! CloudBeat API Library
//!
//! HTTP surface of the gateway: authentication, ingestion and delivery services,
//! handlers and application setup.

mod handlers;
mod services;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::ingest::TempAsset;
pub use telemetry::init_tracing;
