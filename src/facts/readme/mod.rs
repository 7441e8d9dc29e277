//! README retrieval
//!
//! Locates a repository's top-level README through the directory listing API and returns
//! its text, sanitized for storage inside a delimited text field and wrapped in sentinel
//! markers.

mod provider;

pub use provider::{ContentFetcher, README_END, README_START, sanitize_readme};
