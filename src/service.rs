//! Refresh orchestration for the daily puzzle
//!
//! Serves the cached payload while it is valid for the current New York day
//! and otherwise fetches the page, extracts and validates the embedded data,
//! and stores it. A failed refresh leaves the existing entry untouched and is
//! reported to the caller; the stale entry is not served in its place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::DailyCache;
use crate::extract::{self, ExtractError, MARKER};
use crate::puzzle::{self, GamePayload, ValidationError, ValidationProfile};
use crate::source::{PuzzleClient, SourceError};

/// Characters of page text included in a debug report
const DEBUG_PREVIEW_CHARS: usize = 200;

/// Characters of page text logged when the marker is missing
const MISSING_MARKER_PREVIEW_CHARS: usize = 100;

/// Errors that abort a refresh
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The page could not be fetched
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The page did not contain a usable data literal
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The data parsed but has the wrong shape
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A refresh failure, shared by every request that waited on the same attempt
pub type SharedRefreshError = Arc<RefreshError>;

/// What the debug endpoint reports about the current page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    /// Whether the data marker is present
    pub found: bool,
    /// Byte offset of the marker, if present
    pub start_index: Option<usize>,
    /// Page text starting at the marker (or at the top when absent)
    pub content_preview: String,
    /// When the page was fetched
    pub timestamp: DateTime<Utc>,
}

/// Serves the daily puzzle from cache, refreshing it at most once per day
#[derive(Debug)]
pub struct PuzzleService {
    client: PuzzleClient,
    cache: Arc<DailyCache>,
    profile: ValidationProfile,
    /// Held while refreshing; keeps the failure of the last attempt, if any
    refresh_lock: Mutex<Option<SharedRefreshError>>,
    /// Number of finished refresh attempts
    attempts: AtomicU64,
}

impl PuzzleService {
    /// Creates a service with its own empty cache
    pub fn new(client: PuzzleClient, profile: ValidationProfile) -> Self {
        Self::with_cache(client, Arc::new(DailyCache::new()), profile)
    }

    /// Creates a service around an existing cache
    pub fn with_cache(
        client: PuzzleClient,
        cache: Arc<DailyCache>,
        profile: ValidationProfile,
    ) -> Self {
        Self {
            client,
            cache,
            profile,
            refresh_lock: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &Arc<DailyCache> {
        &self.cache
    }

    pub fn profile(&self) -> ValidationProfile {
        self.profile
    }

    /// Returns the puzzle for the New York calendar day containing `now`
    ///
    /// # Behavior
    /// - Returns the cached payload if it was stored on the same day
    /// - Otherwise fetches, extracts, parses and validates a fresh payload,
    ///   stores it at `now`, and returns it
    /// - On failure returns the error and leaves the cache as it was
    /// - Requests that queue behind a refresh get its outcome, success or
    ///   failure, instead of fetching again
    pub async fn today(&self, now: DateTime<Utc>) -> Result<GamePayload, SharedRefreshError> {
        if let Some(payload) = self.cache.get_valid(now) {
            info!("Using cached puzzle data");
            return Ok(payload);
        }

        let seen = self.attempts.load(Ordering::SeqCst);
        let mut last_failure = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited
        if let Some(payload) = self.cache.get_valid(now) {
            debug!("Puzzle refreshed by a concurrent request");
            return Ok(payload);
        }
        if self.attempts.load(Ordering::SeqCst) != seen {
            if let Some(error) = last_failure.as_ref() {
                debug!(error = %error, "Sharing failure of a concurrent refresh");
                return Err(Arc::clone(error));
            }
        }

        info!(url = self.client.url(), "Fetching fresh puzzle data");
        let result = self.refresh().await;
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(payload) => {
                *last_failure = None;
                self.cache.put(payload.clone(), now);
                info!(
                    stored_at = %now,
                    day = %self.cache.local_date(now),
                    "Cached puzzle data"
                );
                Ok(payload)
            }
            Err(e) => {
                let error = Arc::new(e);
                *last_failure = Some(Arc::clone(&error));
                Err(error)
            }
        }
    }

    /// Fetches the page and reports where the data marker sits
    pub async fn debug_content(&self, now: DateTime<Utc>) -> Result<DebugReport, RefreshError> {
        let html = self.client.fetch_page().await?;
        let start_index = extract::locate(&html, MARKER);
        let content_preview =
            extract::preview(&html, start_index.unwrap_or(0), DEBUG_PREVIEW_CHARS).to_string();

        Ok(DebugReport {
            found: start_index.is_some(),
            start_index,
            content_preview,
            timestamp: now,
        })
    }

    async fn refresh(&self) -> Result<GamePayload, RefreshError> {
        let html = self.client.fetch_page().await.map_err(|e| {
            warn!(error = %e, url = self.client.url(), "Puzzle page fetch failed");
            e
        })?;
        debug!(bytes = html.len(), "Fetched puzzle page");

        parse_document(&html, self.profile).map_err(|e| {
            log_parse_failure(&html, &e);
            e
        })
    }
}

/// Extracts, parses and validates the puzzle embedded in `html`
pub fn parse_document(
    html: &str,
    profile: ValidationProfile,
) -> Result<GamePayload, RefreshError> {
    let literal = extract::extract(html, MARKER)?;
    let value = extract::parse_literal(literal)?;
    Ok(puzzle::validate(value, profile)?)
}

fn log_parse_failure(html: &str, error: &RefreshError) {
    match error {
        RefreshError::Extract(ExtractError::MarkerNotFound { document_len }) => warn!(
            document_len,
            preview = extract::preview(html, 0, MISSING_MARKER_PREVIEW_CHARS),
            "Puzzle data marker not found; page layout may have changed"
        ),
        RefreshError::Extract(e) => warn!(
            error = %e,
            offset = ?e.offset(),
            snippet = e.snippet().unwrap_or_default(),
            "Puzzle data extraction failed"
        ),
        other => warn!(error = %other, "Puzzle data failed validation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::sample_payload;
    use crate::source::SourceConfig;
    use chrono::{Duration, TimeZone};
    use std::time::Duration as StdDuration;

    const PAGE: &str = concat!(
        r#"<html><script>window.gameData = {"id":1,"sides":["OAY","NTL","CEH","IRP"],"#,
        r#""ourSolution":["CHAPEL","LOYALTY"],"dictionary":["CHAPEL","LOYALTY"],"#,
        r#""hint":"a;b}"};</script></html>"#
    );

    /// A client that fails immediately if it is ever used
    fn unreachable_client() -> PuzzleClient {
        let config = SourceConfig {
            url: "http://127.0.0.1:9/".to_string(),
            timeout: StdDuration::from_secs(2),
            ..Default::default()
        };
        PuzzleClient::new(&config).unwrap()
    }

    fn noon(day: u32) -> DateTime<Utc> {
        crate::cache::REFERENCE_TZ
            .with_ymd_and_hms(2024, 3, day, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_document_full_page() {
        let payload = parse_document(PAGE, ValidationProfile::Strict).unwrap();
        assert_eq!(payload.as_value()["id"], 1);
        assert_eq!(payload.as_value()["hint"], "a;b}");
        assert_eq!(payload.our_solution().len(), 2);
    }

    #[test]
    fn test_parse_document_missing_marker() {
        let result = parse_document("<html></html>", ValidationProfile::Strict);
        assert!(matches!(
            result,
            Err(RefreshError::Extract(ExtractError::MarkerNotFound { .. }))
        ));
    }

    #[test]
    fn test_parse_document_truncated() {
        let html = r#"window.gameData = {"sides":["#;
        let result = parse_document(html, ValidationProfile::Strict);
        assert!(matches!(
            result,
            Err(RefreshError::Extract(ExtractError::UnterminatedLiteral { .. }))
        ));
    }

    #[test]
    fn test_parse_document_invalid_json() {
        // Balanced braces, but a script literal rather than JSON
        let html = "window.gameData = {sides: [1, 2, 3, 4]};";
        let result = parse_document(html, ValidationProfile::Strict);
        assert!(matches!(
            result,
            Err(RefreshError::Extract(ExtractError::JsonSyntax { .. }))
        ));
    }

    #[test]
    fn test_parse_document_validation_failure() {
        let html = r#"window.gameData = {"sides":["A","B","C"],"ourSolution":[]};"#;
        let result = parse_document(html, ValidationProfile::Minimal);
        assert!(matches!(
            result,
            Err(RefreshError::Validation(ValidationError::InvalidSides))
        ));
    }

    #[test]
    fn test_parse_document_minimal_profile_allows_missing_dictionary() {
        let html = r#"window.gameData = {"sides":["A","B","C","D"],"ourSolution":["ABCD"]};"#;
        assert!(matches!(
            parse_document(html, ValidationProfile::Strict),
            Err(RefreshError::Validation(ValidationError::InvalidDictionary))
        ));
        assert!(parse_document(html, ValidationProfile::Minimal).is_ok());
    }

    #[tokio::test]
    async fn test_today_serves_valid_cache_without_fetching() {
        let cache = Arc::new(DailyCache::new());
        cache.put(sample_payload("CACHED"), noon(11));
        let service =
            PuzzleService::with_cache(unreachable_client(), cache, ValidationProfile::Strict);

        let payload = service.today(noon(11) + Duration::hours(3)).await.unwrap();

        assert_eq!(payload, sample_payload("CACHED"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let cache = Arc::new(DailyCache::new());
        cache.put(sample_payload("YESTERDAY"), noon(10));
        let service = PuzzleService::with_cache(
            unreachable_client(),
            Arc::clone(&cache),
            ValidationProfile::Strict,
        );

        let error = service.today(noon(11)).await.unwrap_err();

        assert!(matches!(*error, RefreshError::Source(_)));
        assert_eq!(cache.get(), Some(sample_payload("YESTERDAY")));
        assert_eq!(cache.stored_at(), Some(noon(10)));
    }

    #[tokio::test]
    async fn test_failed_refresh_on_empty_cache() {
        let service = PuzzleService::new(unreachable_client(), ValidationProfile::Minimal);
        assert_eq!(service.profile(), ValidationProfile::Minimal);

        assert!(service.today(noon(11)).await.is_err());
        assert!(service.cache().get().is_none());
    }

    #[test]
    fn test_debug_report_serializes_camel_case() {
        let report = DebugReport {
            found: true,
            start_index: Some(42),
            content_preview: "window.gameData = {".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["found"], true);
        assert_eq!(json["startIndex"], 42);
        assert_eq!(json["contentPreview"], "window.gameData = {");
        assert_eq!(json["timestamp"], "2024-03-11T12:00:00Z");
    }
}
