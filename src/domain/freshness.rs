//! Pure freshness decision over a previously published snapshot.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Why a region does or does not need regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessReason {
    /// No published snapshot was found (or reading it failed).
    Missing,
    /// A snapshot exists but its `last_updated` could not be parsed.
    NoTimestamp,
    /// The snapshot is older than the configured maximum age.
    Stale,
    Fresh,
}

/// Computed on every orchestration tick, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessDecision {
    pub regenerate: bool,
    pub reason: FreshnessReason,
    pub observed_age_ms: Option<i64>,
}

impl FreshnessDecision {
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            regenerate: true,
            reason: FreshnessReason::Missing,
            observed_age_ms: None,
        }
    }
}

/// Just enough of the published artifact to read its timestamp; everything
/// else is ignored so schema drift in the body cannot break the gate.
#[derive(Deserialize)]
struct PublishedStamp {
    last_updated: Option<String>,
}

/// Decide from a previously published artifact body whether the region needs
/// regeneration. `body` is `None` when no snapshot was found; read errors are
/// mapped to `None` by the caller so the gate fails open toward regeneration.
#[must_use]
pub fn decide(body: Option<&str>, now: DateTime<Utc>, max_age_ms: i64) -> FreshnessDecision {
    let Some(body) = body else {
        return FreshnessDecision::missing();
    };

    let stamp = serde_json::from_str::<PublishedStamp>(body)
        .ok()
        .and_then(|s| s.last_updated)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok());

    let Some(last_updated) = stamp else {
        return FreshnessDecision {
            regenerate: true,
            reason: FreshnessReason::NoTimestamp,
            observed_age_ms: None,
        };
    };

    let age_ms = (now - last_updated).num_milliseconds();
    if age_ms > max_age_ms {
        FreshnessDecision {
            regenerate: true,
            reason: FreshnessReason::Stale,
            observed_age_ms: Some(age_ms),
        }
    } else {
        FreshnessDecision {
            regenerate: false,
            reason: FreshnessReason::Fresh,
            observed_age_ms: Some(age_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const TEN_MINUTES_MS: i64 = 600_000;

    fn body_with_age(now: DateTime<Utc>, age_ms: i64) -> String {
        let stamp = now - Duration::milliseconds(age_ms);
        format!(r#"{{"region_id":1,"last_updated":"{}"}}"#, stamp.to_rfc3339())
    }

    #[test]
    fn missing_snapshot_regenerates() {
        let d = decide(None, Utc::now(), TEN_MINUTES_MS);
        assert!(d.regenerate);
        assert_eq!(d.reason, FreshnessReason::Missing);
        assert_eq!(d.observed_age_ms, None);
    }

    #[test]
    fn unparseable_timestamp_regenerates() {
        let d = decide(
            Some(r#"{"last_updated":"not a date"}"#),
            Utc::now(),
            TEN_MINUTES_MS,
        );
        assert!(d.regenerate);
        assert_eq!(d.reason, FreshnessReason::NoTimestamp);
    }

    #[test]
    fn absent_timestamp_field_regenerates() {
        let d = decide(Some(r#"{"region_id":1}"#), Utc::now(), TEN_MINUTES_MS);
        assert!(d.regenerate);
        assert_eq!(d.reason, FreshnessReason::NoTimestamp);
    }

    #[test]
    fn garbage_body_regenerates() {
        let d = decide(Some("<html>503</html>"), Utc::now(), TEN_MINUTES_MS);
        assert!(d.regenerate);
        assert_eq!(d.reason, FreshnessReason::NoTimestamp);
    }

    #[test]
    fn just_inside_window_is_fresh() {
        let now = Utc::now();
        let d = decide(Some(&body_with_age(now, 599_999)), now, TEN_MINUTES_MS);
        assert!(!d.regenerate);
        assert_eq!(d.reason, FreshnessReason::Fresh);
        assert_eq!(d.observed_age_ms, Some(599_999));
    }

    #[test]
    fn just_outside_window_is_stale() {
        let now = Utc::now();
        let d = decide(Some(&body_with_age(now, 600_001)), now, TEN_MINUTES_MS);
        assert!(d.regenerate);
        assert_eq!(d.reason, FreshnessReason::Stale);
        assert_eq!(d.observed_age_ms, Some(600_001));
    }

    #[test]
    fn exactly_at_window_is_fresh() {
        let now = Utc::now();
        let d = decide(Some(&body_with_age(now, 600_000)), now, TEN_MINUTES_MS);
        assert!(!d.regenerate);
    }
}
