//! Data models for trip statistics.
//!
//! This module contains the typed trip record read from the export,
//! the first-seen ordered [`Tally`] used for breakdowns, and the
//! [`Statistics`] accumulator produced by the aggregation pass.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Column names of the trip history export.
pub mod columns {
    pub const FARE_AMOUNT: &str = "Fare Amount";
    pub const STATUS: &str = "Trip or Order Status";
    pub const REQUEST_TIME: &str = "Request Time";
    pub const CITY: &str = "City";
    pub const DISTANCE: &str = "Distance (miles)";
    pub const PRODUCT_TYPE: &str = "Product Type";
    pub const DROPOFF_TIME: &str = "Dropoff Time";
    pub const BEGIN_TRIP_TIME: &str = "Begin Trip Time";

    /// Every column the aggregator consumes.
    pub const REQUIRED: [&str; 8] = [
        FARE_AMOUNT,
        STATUS,
        REQUEST_TIME,
        CITY,
        DISTANCE,
        PRODUCT_TYPE,
        DROPOFF_TIME,
        BEGIN_TRIP_TIME,
    ];
}

/// Outcome of a trip as reported in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripStatus {
    Completed,
    Canceled,
    /// Any other status, including an empty one.
    Other,
}

impl TripStatus {
    /// Classify a raw status value. Matching is exact and case-sensitive.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "COMPLETED" => TripStatus::Completed,
            "CANCELED" => TripStatus::Canceled,
            _ => TripStatus::Other,
        }
    }
}

/// One row of the trip history export.
///
/// Numeric and timestamp fields are kept as raw text; parsing happens in
/// the aggregation pass so that failures are reported uniformly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripRecord {
    /// Fare charged for the trip. Missing or empty counts as zero.
    pub fare_amount: Option<String>,
    /// Raw trip or order status.
    pub status: String,
    /// Request timestamp, `YYYY-MM-DD ...`.
    pub request_time: String,
    /// City name, used verbatim as a breakdown key.
    pub city: String,
    /// Distance in the export's unit. Missing or empty counts as zero.
    pub distance: Option<String>,
    /// Product type; empty means the trip is not counted per product.
    pub product_type: String,
    /// Dropoff timestamp, only read for completed trips.
    pub dropoff_time: Option<String>,
    /// Begin-trip timestamp, only read for completed trips.
    pub begin_trip_time: Option<String>,
    /// Line in the source file, when the record came from one.
    pub line: Option<u64>,
}

impl TripRecord {
    /// Returns the classified status of this record.
    pub fn trip_status(&self) -> TripStatus {
        TripStatus::classify(&self.status)
    }
}

/// Running counts per category key, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the bucket for `key`, creating it at zero first if needed.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `count` to the bucket for `key`.
    pub fn add(&mut self, key: &str, count: u64) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += count,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), count));
            }
        }
    }

    #[allow(dead_code)] // Lookup utility for callers and tests
    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&slot| self.entries[slot].1)
    }

    #[allow(dead_code)] // Utility for callers and tests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Utility for callers and tests
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Iterate buckets in the order their keys were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
    }

    /// Fold another tally into this one. New keys are appended in the
    /// other tally's order.
    #[allow(dead_code)] // Used by Statistics::merge
    pub fn merge(&mut self, other: &Tally) {
        for (key, count) in other.iter() {
            self.add(key, count);
        }
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Total ride time expressed in larger units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationTotals {
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
}

impl DurationTotals {
    pub fn from_seconds(seconds: u64) -> Self {
        let minutes = seconds as f64 / 60.0;
        let hours = minutes / 60.0;
        let days = hours / 24.0;
        Self {
            minutes,
            hours,
            days,
        }
    }
}

/// Summary statistics over a trip history.
///
/// Built empty, updated once per record, then finalized to fill in
/// [`Statistics::durations`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Sum of all fare amounts.
    pub total_spent: f64,
    /// Number of records folded in.
    pub total_trips: u64,
    /// Records with status `COMPLETED`.
    pub completed_count: u64,
    /// Records with status `CANCELED`.
    pub canceled_count: u64,
    pub trips_by_year: Tally,
    pub trips_by_city: Tally,
    pub trips_by_month: Tally,
    /// Sum of distances, in the export's unit.
    pub total_distance: f64,
    pub trips_by_product: Tally,
    /// Ride time over completed trips, sub-day residual per trip.
    pub total_duration_seconds: u64,
    /// Shortest completed trip in minutes; infinite until one is seen.
    /// Serialized as `null` while infinite.
    pub shortest_trip_minutes: f64,
    /// Longest completed trip in minutes.
    pub longest_trip_minutes: f64,
    /// Derived totals, present once finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durations: Option<DurationTotals>,
    /// Records dropped in lenient mode.
    pub skipped_records: u64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            total_spent: 0.0,
            total_trips: 0,
            completed_count: 0,
            canceled_count: 0,
            trips_by_year: Tally::new(),
            trips_by_city: Tally::new(),
            trips_by_month: Tally::new(),
            total_distance: 0.0,
            trips_by_product: Tally::new(),
            total_duration_seconds: 0,
            shortest_trip_minutes: f64::INFINITY,
            longest_trip_minutes: 0.0,
            durations: None,
            skipped_records: 0,
        }
    }

    /// Record one completed trip's ride time.
    pub fn observe_duration(&mut self, seconds: u64) {
        self.total_duration_seconds += seconds;

        let minutes = seconds as f64 / 60.0;
        if minutes < self.shortest_trip_minutes {
            self.shortest_trip_minutes = minutes;
        }
        if minutes > self.longest_trip_minutes {
            self.longest_trip_minutes = minutes;
        }
    }

    /// Compute the derived duration totals.
    pub fn finalize(mut self) -> Self {
        self.durations = Some(DurationTotals::from_seconds(self.total_duration_seconds));
        self
    }

    #[allow(dead_code)] // Utility for callers and tests
    pub fn is_finalized(&self) -> bool {
        self.durations.is_some()
    }

    /// Whether at least one completed trip contributed a duration.
    #[allow(dead_code)] // Utility for callers and tests
    pub fn has_timed_trips(&self) -> bool {
        self.shortest_trip_minutes.is_finite()
    }

    /// Combine a partial accumulator into this one.
    ///
    /// Derived totals are cleared; call [`Statistics::finalize`] again.
    #[allow(dead_code)] // Combines partial passes over split inputs
    pub fn merge(&mut self, other: &Statistics) {
        self.total_spent += other.total_spent;
        self.total_trips += other.total_trips;
        self.completed_count += other.completed_count;
        self.canceled_count += other.canceled_count;
        self.trips_by_year.merge(&other.trips_by_year);
        self.trips_by_city.merge(&other.trips_by_city);
        self.trips_by_month.merge(&other.trips_by_month);
        self.total_distance += other.total_distance;
        self.trips_by_product.merge(&other.trips_by_product);
        self.total_duration_seconds += other.total_duration_seconds;
        self.shortest_trip_minutes = self.shortest_trip_minutes.min(other.shortest_trip_minutes);
        self.longest_trip_minutes = self.longest_trip_minutes.max(other.longest_trip_minutes);
        self.skipped_records += other.skipped_records;
        self.durations = None;
    }
}
