//! Single-slot cache with a calendar-day validity window

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::puzzle::GamePayload;

/// Timezone whose calendar day decides cache validity
pub const REFERENCE_TZ: Tz = chrono_tz::America::New_York;

/// The stored payload together with the instant it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: GamePayload,
    stored_at: DateTime<Utc>,
}

/// Holds at most one puzzle payload.
///
/// The entry is replaced as a unit under a write lock, so readers always see
/// a payload paired with its own `stored_at`. Each instance is independent;
/// the service owns one and tests create their own.
#[derive(Debug)]
pub struct DailyCache {
    entry: RwLock<Option<CacheEntry>>,
    tz: Tz,
}

impl Default for DailyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DailyCache {
    /// Creates an empty cache keyed to New York calendar days
    pub fn new() -> Self {
        Self::with_timezone(REFERENCE_TZ)
    }

    /// Creates an empty cache keyed to calendar days in `tz`
    pub fn with_timezone(tz: Tz) -> Self {
        Self {
            entry: RwLock::new(None),
            tz,
        }
    }

    /// Timezone used for the day comparison
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Whether the stored payload was stored on the same calendar day as `now`
    ///
    /// Returns `false` when nothing is stored.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.read()
            .as_ref()
            .is_some_and(|entry| self.same_day(entry.stored_at, now))
    }

    /// Returns a copy of the stored payload, valid or not
    ///
    /// Callers check [`is_valid`](Self::is_valid) first.
    pub fn get(&self) -> Option<GamePayload> {
        self.read().as_ref().map(|entry| entry.payload.clone())
    }

    /// Returns the stored payload only if it is valid for `now`
    ///
    /// The check and the copy happen under one read lock.
    pub fn get_valid(&self, now: DateTime<Utc>) -> Option<GamePayload> {
        self.read()
            .as_ref()
            .filter(|entry| self.same_day(entry.stored_at, now))
            .map(|entry| entry.payload.clone())
    }

    /// Replaces the entry with `payload` stored at `now`
    pub fn put(&self, payload: GamePayload, now: DateTime<Utc>) {
        *self.write() = Some(CacheEntry {
            payload,
            stored_at: now,
        });
    }

    /// When the current entry was stored, if any
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.read().as_ref().map(|entry| entry.stored_at)
    }

    /// Calendar date of `instant` in the reference timezone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date(a) == self.local_date(b)
    }

    // The entry is only ever assigned whole, so a poisoned lock still guards
    // a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Option<CacheEntry>> {
        self.entry.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CacheEntry>> {
        self.entry.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
