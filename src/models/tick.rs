use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// Corporate action attached to a trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTag {
    #[serde(rename = "type")]
    pub kind: String,
    pub factor: i64,
    pub label: String,
}

impl EventTag {
    pub const SPLIT: &'static str = "SPLIT";

    /// A `factor`-for-one split, labelled `1:<factor>`.
    pub fn split(factor: u32) -> Self {
        Self {
            kind: Self::SPLIT.to_string(),
            factor: i64::from(factor),
            label: format!("1:{}", factor),
        }
    }
}

/// One trading day for one symbol, as written by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub valid_start: DateTime<Utc>,
    pub price_raw: f64,
    pub price_adjusted: f64,
    pub volume: i64,
    pub event_tags: Vec<EventTag>,
}

/// Row shape returned by the tick history select.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct TickRow {
    pub ts: DateTime<Utc>,
    pub valid_start: DateTime<Utc>,
    pub price_raw: f64,
    pub price_adjusted: f64,
    pub volume: i64,
    pub event_tags: serde_json::Value,
}

/// API projection of a stored record. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEntry {
    pub ts: String,
    #[serde(rename = "validStart")]
    pub valid_start: String,
    pub price_raw: f64,
    pub price_adjusted: f64,
    pub volume: i64,
    #[serde(rename = "eventTags")]
    pub event_tags: Vec<EventTag>,
}

impl TryFrom<TickRow> for TickEntry {
    type Error = serde_json::Error;

    fn try_from(row: TickRow) -> Result<Self, Self::Error> {
        let event_tags = match row.event_tags {
            serde_json::Value::Null => Vec::new(),
            tags => serde_json::from_value(tags)?,
        };

        Ok(Self {
            ts: format_date(&row.ts),
            valid_start: format_date(&row.valid_start),
            price_raw: row.price_raw,
            price_adjusted: row.price_adjusted,
            volume: row.volume,
            event_tags,
        })
    }
}

pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn row(tags: serde_json::Value) -> TickRow {
        TickRow {
            ts: Utc.with_ymd_and_hms(2022, 3, 21, 0, 0, 0).unwrap(),
            valid_start: Utc.with_ymd_and_hms(2022, 3, 21, 0, 0, 0).unwrap(),
            price_raw: 31.5,
            price_adjusted: 63.0,
            volume: 8_000_000,
            event_tags: tags,
        }
    }

    #[test]
    fn test_split_tag_shape() {
        let tag = EventTag::split(2);
        assert_eq!(
            serde_json::to_value(&tag).unwrap(),
            json!({"type": "SPLIT", "factor": 2, "label": "1:2"})
        );
    }

    #[test]
    fn test_entry_projection() {
        let entry = TickEntry::try_from(row(json!([
            {"type": "SPLIT", "factor": 2, "label": "1:2"}
        ])))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "ts": "2022-03-21",
                "validStart": "2022-03-21",
                "price_raw": 31.5,
                "price_adjusted": 63.0,
                "volume": 8_000_000,
                "eventTags": [{"type": "SPLIT", "factor": 2, "label": "1:2"}]
            })
        );
    }

    #[test]
    fn test_null_tags_become_empty() {
        let entry = TickEntry::try_from(row(serde_json::Value::Null)).unwrap();
        assert!(entry.event_tags.is_empty());
    }

    #[test]
    fn test_malformed_tags_are_rejected() {
        assert!(TickEntry::try_from(row(json!({"type": "SPLIT"}))).is_err());
    }
}
