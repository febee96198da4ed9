use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use price_history_backend::{services::tick_store::TickSettings, AppState};
use sea_orm::{DatabaseConnection, Transaction, Value};
use serde_json::json;

pub const TABLE: &str = "stock_ticks_v2";

/// Wrap a (mock) connection in the state the router expects. Keep a clone of
/// the `Arc` to read the transaction log once the router is done with it.
pub fn app_state(db: Arc<DatabaseConnection>) -> AppState {
    AppState {
        db,
        ticks: TickSettings {
            table: TABLE.to_string(),
            symbol: "KO".to_string(),
        },
    }
}

/// Statements the mock saw. Only valid after every router holding `db` is dropped.
pub fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    Arc::into_inner(db)
        .expect("router still holds the connection")
        .into_transaction_log()
}

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A row as the tick select returns it.
pub fn tick_row(
    ts: DateTime<Utc>,
    price_raw: f64,
    price_adjusted: f64,
    volume: i64,
    event_tags: serde_json::Value,
) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("ts", ts.into()),
        ("valid_start", ts.into()),
        ("price_raw", price_raw.into()),
        ("price_adjusted", price_adjusted.into()),
        ("volume", volume.into()),
        ("event_tags", event_tags.into()),
    ])
}

/// The three days around the 2022-03-21 two-for-one split.
pub fn split_week_rows() -> Vec<BTreeMap<&'static str, Value>> {
    vec![
        tick_row(day(2022, 3, 18), 61.2, 61.2, 3_900_000, json!([])),
        tick_row(
            day(2022, 3, 21),
            30.9,
            61.8,
            8_200_000,
            json!([{"type": "SPLIT", "factor": 2, "label": "1:2"}]),
        ),
        tick_row(day(2022, 3, 22), 31.05, 62.1, 7_600_000, json!([])),
    ]
}
