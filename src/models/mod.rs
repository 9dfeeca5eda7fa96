// src/models/mod.rs

//! Domain models for the document fetcher.

mod business;
mod config;
mod outcome;

pub use business::{BusinessRecord, DocumentLink};
pub use config::ScraperConfiguration;
pub use outcome::FetchResult;
