//! Request-level operations built on the collaborators in [`AppState`](crate::state::AppState).

pub mod catalog;
pub mod delivery;
pub mod ingest;

pub use catalog::CatalogService;
pub use delivery::DeliveryService;
pub use ingest::IngestService;
