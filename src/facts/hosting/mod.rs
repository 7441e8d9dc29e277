mod client;

pub use client::{Client, DEFAULT_SECONDARY_LIMIT_WAIT, ContentEntry, HostingApiResult, QuotaSource, RateLimitInfo};
