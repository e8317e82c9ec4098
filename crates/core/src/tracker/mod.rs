//! Issue-tracker REST API access.

pub mod client;

pub use client::{IssueRef, TrackerClient, TrackerUser};
