//! Delimited-text input and output
//!
//! The harvester reads an ordered table of repositories (one per row, addressed by the
//! `html_url` column) and writes one CSV file per operation:
//!
//! - **README**: every input row with a `readme` column added, filled from the result set by
//!   row index so rows stay correlated with the input
//! - **Compliance**: one line per repository with its five indicators and the run date
//! - **Downloads**: one line per detected package with last month's download count
//!
//! Input bytes are decoded lossily since harvested metadata is not always valid UTF-8.

mod csv;
mod input;

pub use csv::{write_compliance, write_downloads, write_readme};
pub use input::{InputTable, URL_COLUMN};
