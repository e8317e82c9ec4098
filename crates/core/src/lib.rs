//! acctremap core library.
//!
//! Moves tracker issue participants from legacy account IDs to the current
//! first-party account of the same person, using an institutional identity
//! directory to confirm the person before touching any issue. Provides
//! configuration, API clients for both services, the CSV row source, and the
//! reconciliation driver.

pub mod config;
pub mod directory;
pub mod errors;
pub mod input;
pub mod models;
pub mod reconcile;
pub mod tracker;

// Re-exports for convenience.
pub use config::AppConfig;
pub use directory::DirectoryClient;
pub use reconcile::Reconciler;
pub use tracker::TrackerClient;
