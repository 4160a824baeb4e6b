use std::fmt;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use url::Url;

use crate::extract::ExtractionOutcome;
use crate::formats::Reading;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    /// Captured when the invocation started.
    pub started_at: DateTime<Utc>,
    pub event_id: Option<u64>,
    pub event_url: Url,
}

pub fn build_reading(meta: &RunMetadata, outcome: &ExtractionOutcome) -> anyhow::Result<Reading> {
    let result = &outcome.result;
    let sectors_json =
        serde_json::to_string(&result.sectors).context("serialize sector readings")?;

    Ok(Reading {
        timestamp_utc: meta.started_at.to_rfc3339(),
        event_id: meta.event_id,
        event_url: meta.event_url.to_string(),
        sold_tickets: result.sold_tickets,
        total_available: result.total_available,
        sectors_json,
        success: outcome.success,
        notes: result.notes.join("; "),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub threshold: u64,
    pub observed: u64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALERT: total available {} <= threshold {}",
            self.observed, self.threshold
        )
    }
}

/// A threshold of zero disables alerting.
#[must_use]
pub fn alert(threshold: u64, total_available: Option<u64>) -> Option<Alert> {
    let observed = total_available?;
    (threshold != 0 && observed <= threshold).then_some(Alert {
        threshold,
        observed,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::extract::ExtractionResult;
    use crate::formats::SectorReading;

    fn meta() -> RunMetadata {
        RunMetadata {
            started_at: Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap(),
            event_id: Some(7),
            event_url: Url::parse("https://tickets.example/Stadium/Index?eventId=7").unwrap(),
        }
    }

    #[test]
    fn build_reading_serializes_sectors_and_joins_notes() -> anyhow::Result<()> {
        let outcome = ExtractionOutcome {
            result: ExtractionResult {
                sold_tickets: Some(320),
                total_available: Some(55),
                sectors: vec![
                    SectorReading {
                        sector: "Ł1".to_owned(),
                        available: 50,
                    },
                    SectorReading {
                        sector: "B".to_owned(),
                        available: 5,
                    },
                ],
                notes: vec!["sold from homepage".to_owned(), "available from 2 sectors".to_owned()],
            },
            success: true,
        };

        let reading = build_reading(&meta(), &outcome)?;

        assert_eq!(reading.timestamp_utc, "2025-03-01T18:30:00+00:00");
        assert_eq!(reading.event_id, Some(7));
        assert_eq!(
            reading.event_url,
            "https://tickets.example/Stadium/Index?eventId=7"
        );
        assert_eq!(reading.sold_tickets, Some(320));
        assert_eq!(reading.total_available, Some(55));
        assert_eq!(
            reading.sectors_json,
            r#"[{"sector":"Ł1","available":50},{"sector":"B","available":5}]"#
        );
        assert!(reading.success);
        assert_eq!(reading.notes, "sold from homepage; available from 2 sectors");
        Ok(())
    }

    #[test]
    fn build_reading_keeps_nulls_and_empty_sector_list() -> anyhow::Result<()> {
        let outcome = ExtractionOutcome {
            result: ExtractionResult {
                sold_tickets: None,
                total_available: None,
                sectors: Vec::new(),
                notes: vec!["no page could be acquired".to_owned()],
            },
            success: false,
        };

        let reading = build_reading(&meta(), &outcome)?;

        assert_eq!(reading.sold_tickets, None);
        assert_eq!(reading.total_available, None);
        assert_eq!(reading.sectors_json, "[]");
        assert!(!reading.success);
        Ok(())
    }

    #[test]
    fn alert_fires_at_or_below_threshold() {
        assert_eq!(
            alert(50, Some(30)),
            Some(Alert {
                threshold: 50,
                observed: 30,
            })
        );
        assert!(alert(50, Some(50)).is_some());
        assert_eq!(alert(50, Some(80)), None);
    }

    #[test]
    fn alert_needs_threshold_and_value() {
        assert_eq!(alert(0, Some(0)), None);
        assert_eq!(alert(50, None), None);
        assert_eq!(
            alert(10, Some(0)).map(|a| a.to_string()),
            Some("ALERT: total available 0 <= threshold 10".to_owned())
        );
    }
}
