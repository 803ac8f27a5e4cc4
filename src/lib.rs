//! stream-catalog: ingestion-normalization-verification-dedup pipeline
//!
//! Turns heterogeneous, unreliable streaming-catalog listings (Xtream Codes
//! APIs and plaintext playlists) into a clean, deduplicated, verified
//! catalog grouped by category.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod utils;
pub mod verify;
