// src/provider.rs
//
// Reference-data boundary. The matchers only need (timestamp, frequency)
// rows covering the dates under test; where those rows come from (an API,
// a cache, a file) stays behind this trait.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::signal::EnfSeries;

/// One reference measurement: grid frequency at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub timestamp: DateTime<Utc>,
    pub frequency_hz: f64,
}

impl ReferencePoint {
    pub fn new(timestamp: DateTime<Utc>, frequency_hz: f64) -> Self {
        Self {
            timestamp,
            frequency_hz,
        }
    }

    /// Build a point from a provider row timestamp.
    ///
    /// Accepts RFC 3339 (`2024-05-01T00:00:00Z`, any offset) and naive
    /// ISO 8601 (`2024-05-01T00:00:00` with optional fraction); naive
    /// values are taken as UTC, which is how the upstream feeds serve them.
    pub fn from_iso8601(timestamp: &str, frequency_hz: f64) -> Result<Self> {
        let parsed = DateTime::parse_from_rfc3339(timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|rfc_err| {
                NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| naive.and_utc())
                    .map_err(|_| Error::Timestamp {
                        value: timestamp.to_string(),
                        source: rfc_err,
                    })
            })?;
        Ok(Self::new(parsed, frequency_hz))
    }
}

/// Source of reference grid-frequency data.
///
/// Implementations return rows for the requested dates with timestamps
/// that never decrease; the rest of the pipeline consumes the rows and
/// nothing else.
pub trait ReferenceProvider {
    /// Nominal grid frequency in Hz for the region this source covers.
    fn nominal_frequency(&self) -> f64 {
        50.0
    }

    /// All rows for the requested dates, in timestamp order.
    fn query(&self, dates: &[NaiveDate]) -> Result<Vec<ReferencePoint>>;
}

/// Provider over pre-loaded rows, for tests and offline work.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    points: Vec<ReferencePoint>,
    nominal_hz: f64,
}

impl InMemoryProvider {
    /// Rows must already be in timestamp order.
    pub fn new(points: Vec<ReferencePoint>) -> Self {
        Self {
            points,
            nominal_hz: 50.0,
        }
    }

    pub fn with_nominal(mut self, nominal_hz: f64) -> Self {
        self.nominal_hz = nominal_hz;
        self
    }
}

impl ReferenceProvider for InMemoryProvider {
    fn nominal_frequency(&self) -> f64 {
        self.nominal_hz
    }

    fn query(&self, dates: &[NaiveDate]) -> Result<Vec<ReferencePoint>> {
        let rows: Vec<ReferencePoint> = self
            .points
            .iter()
            .filter(|p| dates.contains(&p.timestamp.date_naive()))
            .copied()
            .collect();
        info!(
            "in-memory reference query: {} rows across {} dates",
            rows.len(),
            dates.len()
        );
        Ok(rows)
    }
}

/// Convert provider rows into a matcher-ready series, checking the ordering
/// contract along the way.
pub fn reference_series(points: &[ReferencePoint]) -> Result<EnfSeries> {
    if points.is_empty() {
        return Err(Error::EmptyInput("reference points"));
    }
    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(Error::NonMonotonicTimestamps { index: index + 1 });
        }
    }
    EnfSeries::new(points.iter().map(|p| p.frequency_hz).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_timestamps() {
        let zulu = ReferencePoint::from_iso8601("2024-05-01T00:00:30Z", 50.01).unwrap();
        assert_eq!(zulu.timestamp, utc(2024, 5, 1, 0, 0, 30));
        assert_eq!(zulu.frequency_hz, 50.01);

        // Offsets normalize to UTC.
        let offset = ReferencePoint::from_iso8601("2024-05-01T02:00:30+02:00", 49.98).unwrap();
        assert_eq!(offset.timestamp, zulu.timestamp);
    }

    #[test]
    fn test_parse_naive_timestamps_as_utc() {
        let naive = ReferencePoint::from_iso8601("2024-05-01T00:00:30", 50.01).unwrap();
        assert_eq!(naive.timestamp, utc(2024, 5, 1, 0, 0, 30));

        let fractional = ReferencePoint::from_iso8601("2024-05-01T00:00:30.500", 50.01).unwrap();
        assert!(fractional.timestamp > naive.timestamp);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = ReferencePoint::from_iso8601("yesterday-ish", 50.0).unwrap_err();
        assert!(matches!(err, Error::Timestamp { .. }));
        assert!(err.to_string().contains("yesterday-ish"));
    }

    #[test]
    fn test_in_memory_provider_filters_by_date() {
        let provider = InMemoryProvider::new(vec![
            ReferencePoint::new(utc(2024, 5, 1, 23, 59, 59), 50.01),
            ReferencePoint::new(utc(2024, 5, 2, 0, 0, 0), 49.99),
            ReferencePoint::new(utc(2024, 5, 3, 12, 0, 0), 50.02),
        ]);

        let dates = vec![NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()];
        let rows = provider.query(&dates).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].frequency_hz, 49.99);

        assert_eq!(provider.nominal_frequency(), 50.0);
        let american = InMemoryProvider::new(Vec::new()).with_nominal(60.0);
        assert_eq!(american.nominal_frequency(), 60.0);
    }

    #[test]
    fn test_reference_series_keeps_row_order() {
        let points = vec![
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 0), 50.01),
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 1), 49.99),
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 1), 49.99),
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 2), 50.00),
        ];

        let trace = reference_series(&points).unwrap();
        assert_eq!(trace.frequencies(), &[50.01, 49.99, 49.99, 50.00]);
    }

    #[test]
    fn test_reference_series_rejects_time_reversal() {
        let points = vec![
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 5), 50.01),
            ReferencePoint::new(utc(2024, 5, 1, 0, 0, 4), 49.99),
        ];

        assert!(matches!(
            reference_series(&points),
            Err(Error::NonMonotonicTimestamps { index: 1 })
        ));
    }

    #[test]
    fn test_reference_point_serde_round_trip() {
        let point = ReferencePoint::from_iso8601("2024-05-01T00:00:30Z", 50.013).unwrap();
        let json = serde_json::to_string(&point).unwrap();
        let back: ReferencePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
    }
}
