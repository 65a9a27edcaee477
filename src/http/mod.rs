//! HTTP client module.

mod client;

pub use client::{DEFAULT_FILE_NAME, HttpClient};
