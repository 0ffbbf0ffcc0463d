//! Trip aggregation and statistics.
//!
//! This module folds trip records into a [`Statistics`] value in a single
//! left-to-right pass. Each record is parsed completely before anything is
//! accumulated, so a rejected record never contributes partial counts.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use thiserror::Error;
use tracing::{debug, warn};

use super::fields::{self, ParseError};
use crate::models::{columns, Statistics, TripRecord, TripStatus};

/// What to do when a record cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first bad record.
    #[default]
    Abort,
    /// Log a warning, count the record as skipped and keep going.
    Skip,
}

/// A record rejected during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index}{}: {reason}", location(.line))]
pub struct TripError {
    /// 1-based position of the record in the input sequence.
    pub index: usize,
    /// Source line, when the record came from a file.
    pub line: Option<u64>,
    /// Why the record was rejected.
    pub reason: ParseError,
}

fn location(line: &Option<u64>) -> String {
    match line {
        Some(line) => format!(" (line {})", line),
        None => String::new(),
    }
}

/// Everything one record adds to the statistics, already parsed.
#[derive(Debug)]
struct TripContribution<'a> {
    fare: f64,
    status: TripStatus,
    year: &'a str,
    month: &'a str,
    city: &'a str,
    distance: f64,
    product: Option<&'a str>,
    duration_seconds: Option<u64>,
}

impl<'a> TripContribution<'a> {
    fn parse(record: &'a TripRecord) -> Result<Self, ParseError> {
        let fare = fields::parse_amount(columns::FARE_AMOUNT, record.fare_amount.as_deref())?;
        let status = record.trip_status();
        let (year, month) = fields::split_request_time(&record.request_time)?;
        let distance = fields::parse_amount(columns::DISTANCE, record.distance.as_deref())?;

        let product = Some(record.product_type.as_str()).filter(|p| !p.is_empty());

        let duration_seconds = if status == TripStatus::Completed {
            let dropoff =
                fields::parse_trip_timestamp(columns::DROPOFF_TIME, record.dropoff_time.as_deref())?;
            let begin = fields::parse_trip_timestamp(
                columns::BEGIN_TRIP_TIME,
                record.begin_trip_time.as_deref(),
            )?;
            Some(fields::trip_duration_seconds(begin, dropoff))
        } else {
            None
        };

        Ok(Self {
            fare,
            status,
            year,
            month,
            city: &record.city,
            distance,
            product,
            duration_seconds,
        })
    }
}

/// Incremental aggregator over trip records.
#[derive(Debug, Clone)]
pub struct Aggregator {
    policy: ErrorPolicy,
    stats: Statistics,
    records_seen: usize,
}

impl Aggregator {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            stats: Statistics::new(),
            records_seen: 0,
        }
    }

    /// Fold one record into the running statistics.
    ///
    /// Under [`ErrorPolicy::Abort`] a bad record is returned as an error and
    /// the statistics are left untouched by it.
    pub fn push(&mut self, record: &TripRecord) -> Result<(), TripError> {
        self.records_seen += 1;

        match TripContribution::parse(record) {
            Ok(contribution) => {
                self.apply(contribution);
                Ok(())
            }
            Err(reason) => {
                let err = TripError {
                    index: self.records_seen,
                    line: record.line,
                    reason,
                };
                match self.policy {
                    ErrorPolicy::Abort => Err(err),
                    ErrorPolicy::Skip => {
                        warn!("Skipping {}", err);
                        self.stats.skipped_records += 1;
                        Ok(())
                    }
                }
            }
        }
    }

    fn apply(&mut self, trip: TripContribution<'_>) {
        let stats = &mut self.stats;

        stats.total_spent += trip.fare;
        stats.total_trips += 1;

        match trip.status {
            TripStatus::Completed => stats.completed_count += 1,
            TripStatus::Canceled => stats.canceled_count += 1,
            TripStatus::Other => {}
        }

        stats.trips_by_year.increment(trip.year);
        stats.trips_by_city.increment(trip.city);
        stats.trips_by_month.increment(trip.month);

        stats.total_distance += trip.distance;

        if let Some(product) = trip.product {
            stats.trips_by_product.increment(product);
        }

        if let Some(seconds) = trip.duration_seconds {
            stats.observe_duration(seconds);
        }
    }

    /// Statistics accumulated so far, not yet finalized.
    #[allow(dead_code)] // Inspection utility for incremental callers
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Finish the pass and compute derived totals.
    pub fn finish(self) -> Statistics {
        debug!(
            "Aggregated {} records ({} trips, {} skipped)",
            self.records_seen, self.stats.total_trips, self.stats.skipped_records
        );
        self.stats.finalize()
    }
}

/// Aggregate a sequence of trip records into finalized statistics.
pub fn process<I>(records: I, policy: ErrorPolicy) -> Result<Statistics, TripError>
where
    I: IntoIterator,
    I::Item: Borrow<TripRecord>,
{
    let mut aggregator = Aggregator::new(policy);
    for record in records {
        aggregator.push(record.borrow())?;
    }
    Ok(aggregator.finish())
}
