//! Storage for downloaded documents.

pub mod local;

// Re-export for convenience
pub use local::{HEAD_LEN, LocalStorage, PartialDocument};
