//! Utility functions and helpers.

pub mod filename;
pub mod http;
pub mod url;
