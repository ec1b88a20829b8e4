//! Letterbox Relay Library
//!
//! Extracts the daily Letter Boxed puzzle embedded in its web page, validates
//! it, and serves it over HTTP from a cache that turns over at midnight in
//! New York.

pub mod cache;
pub mod cli;
pub mod extract;
pub mod puzzle;
pub mod server;
pub mod service;
pub mod source;
