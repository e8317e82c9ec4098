//! Institutional identity directory access.

pub mod client;

pub use client::DirectoryClient;
