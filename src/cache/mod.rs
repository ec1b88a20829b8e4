//! In-memory cache for the daily puzzle
//!
//! The cache holds a single payload and judges freshness by calendar day in a
//! fixed reference timezone rather than by elapsed time: a payload stored at
//! 23:59 in New York is stale one minute later. Entries live only in process
//! memory and are replaced whole on every successful refresh.

mod daily;

pub use daily::{DailyCache, REFERENCE_TZ};
