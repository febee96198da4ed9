//! Synthetic daily price history for a single symbol.
//!
//! The underlying (split-adjusted) price is a geometric random walk over the
//! Monday-Friday calendar. Raw prices and volumes are derived from it by
//! dividing/multiplying with the cumulative split factor as of each date, so
//! a chart of `price_adjusted` is continuous across splits while
//! `price_raw` drops on each split date.
//!
//! All randomness comes from one `StdRng` seeded from the config: returns are
//! drawn first, volumes second. The same config always yields the same
//! records.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::models::tick::{EventTag, PriceRecord};

#[derive(Debug, Error, PartialEq)]
pub enum GeneratorError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("start price must be positive, got {0}")]
    InvalidStartPrice(f64),
    #[error("{name} must be non-negative, got {value}")]
    NegativeDispersion { name: &'static str, value: f64 },
    #[error("base volume must be positive, got {0}")]
    InvalidBaseVolume(f64),
    #[error("split on {date} has factor {factor}; factors must be >= 1")]
    InvalidSplitFactor { date: NaiveDate, factor: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub seed: u64,
    pub start_price: f64,
    /// Mean of the daily log-return.
    pub daily_drift: f64,
    /// Standard deviation of the daily log-return.
    pub daily_vol: f64,
    /// Median of the daily (split-adjusted) volume.
    pub base_volume: f64,
    /// Log-space standard deviation of the daily volume.
    pub volume_sigma: f64,
    /// Split date -> number of post-split shares per pre-split share.
    pub splits: BTreeMap<NaiveDate, u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start: ymd(2020, 1, 1),
            end: ymd(2025, 9, 8),
            seed: 42,
            start_price: 50.0,
            daily_drift: 0.0003,
            daily_vol: 0.02,
            base_volume: 4_000_000.0,
            volume_sigma: 0.25,
            splits: BTreeMap::from([(ymd(2022, 3, 21), 2), (ymd(2025, 1, 9), 5)]),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.start > self.end {
            return Err(GeneratorError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if !(self.start_price > 0.0) {
            return Err(GeneratorError::InvalidStartPrice(self.start_price));
        }
        for (name, value) in [("daily_vol", self.daily_vol), ("volume_sigma", self.volume_sigma)] {
            if !(value >= 0.0) {
                return Err(GeneratorError::NegativeDispersion { name, value });
            }
        }
        if !(self.base_volume > 0.0) {
            return Err(GeneratorError::InvalidBaseVolume(self.base_volume));
        }
        if let Some((&date, &factor)) = self.splits.iter().find(|(_, f)| **f < 1) {
            return Err(GeneratorError::InvalidSplitFactor { date, factor });
        }
        Ok(())
    }
}

/// Builds the full record set for `symbol`, one record per business day.
pub fn generate_records(
    config: &GeneratorConfig,
    symbol: &str,
) -> Result<Vec<PriceRecord>, GeneratorError> {
    config.validate()?;

    let dates = business_days(config.start, config.end);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let path = underlying_path(config, dates.len(), &mut rng);
    let factors = cumulative_split_factors(&dates, &config.splits);
    let volumes = adjusted_volumes(config, dates.len(), &mut rng);

    let records = dates
        .iter()
        .zip(path)
        .zip(factors)
        .zip(volumes)
        .map(|(((date, adjusted), factor), volume)| {
            let ts = at_midnight(*date);
            PriceRecord {
                symbol: symbol.to_string(),
                ts,
                valid_start: ts,
                price_raw: adjusted / factor,
                price_adjusted: adjusted,
                volume: (volume as f64 * factor).round() as i64,
                event_tags: event_tags_for(*date, &config.splits),
            }
        })
        .collect();

    Ok(records)
}

/// Every Monday-Friday in `[start, end]`, ascending. No holiday calendar.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

/// Geometric random walk starting at `start_price`.
///
/// One return is drawn per day, but the first day is pinned to the start
/// price, so `ret[0]` only advances the stream.
pub fn underlying_path(config: &GeneratorConfig, n: usize, rng: &mut StdRng) -> Vec<f64> {
    let returns: Vec<f64> = (0..n)
        .map(|_| sample_normal(rng, config.daily_drift, config.daily_vol))
        .collect();

    let mut price = config.start_price;
    returns
        .iter()
        .enumerate()
        .map(|(i, ret)| {
            if i > 0 {
                price *= ret.exp();
            }
            price
        })
        .collect()
}

/// Product of every split factor effective on or before each date.
pub fn cumulative_split_factors(dates: &[NaiveDate], splits: &BTreeMap<NaiveDate, u32>) -> Vec<f64> {
    let mut pending = splits.iter().peekable();
    let mut cumulative = 1.0;

    dates
        .iter()
        .map(|date| {
            while let Some((_, factor)) = pending.next_if(|(split_date, _)| *split_date <= date) {
                cumulative *= f64::from(*factor);
            }
            cumulative
        })
        .collect()
}

/// Split-adjusted daily volumes, log-normal with median `base_volume`.
pub fn adjusted_volumes(config: &GeneratorConfig, n: usize, rng: &mut StdRng) -> Vec<i64> {
    let mu = config.base_volume.ln();
    (0..n)
        .map(|_| sample_normal(rng, mu, config.volume_sigma).exp().round() as i64)
        .collect()
}

pub fn event_tags_for(date: NaiveDate, splits: &BTreeMap<NaiveDate, u32>) -> Vec<EventTag> {
    splits
        .get(&date)
        .map(|factor| vec![EventTag::split(*factor)])
        .unwrap_or_default()
}

fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1].
    let u1: f64 = 1.0 - rng.r#gen::<f64>();
    let u2: f64 = rng.r#gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
