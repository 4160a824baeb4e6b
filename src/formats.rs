use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorReading {
    pub sector: String,
    pub available: u64,
}

/// One row of the snapshot log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp_utc: String,
    pub event_id: Option<u64>,
    pub event_url: String,
    pub sold_tickets: Option<u64>,
    pub total_available: Option<u64>,
    pub sectors_json: String,
    pub success: bool,
    pub notes: String,
}

impl Reading {
    pub const COLUMNS: [&'static str; 8] = [
        "timestamp_utc",
        "event_id",
        "event_url",
        "sold_tickets",
        "total_available",
        "sectors_json",
        "success",
        "notes",
    ];

    /// Cells in [`Reading::COLUMNS`] order; nulls become empty cells.
    pub fn to_row(&self) -> Vec<String> {
        fn cell(value: Option<u64>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        vec![
            self.timestamp_utc.clone(),
            cell(self.event_id),
            self.event_url.clone(),
            cell(self.sold_tickets),
            cell(self.total_available),
            self.sectors_json.clone(),
            self.success.to_string(),
            self.notes.clone(),
        ]
    }
}
