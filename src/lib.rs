// src/lib.rs

//! Business registry document fetcher library.
//!
//! Searches a registry by business name, follows each match to its detail
//! page and downloads the PDF filings linked there.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
