//! Report generation.
//!
//! This module renders finalized [`Statistics`] as a plain text report or
//! as JSON.

use crate::cli::OutputFormat;
use crate::config::ReportConfig;
use crate::models::{DurationTotals, Statistics, Tally};
use anyhow::Result;

/// Unit labels printed next to totals.
#[derive(Debug, Clone)]
pub struct ReportLabels {
    pub currency: String,
    pub distance_unit: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ReportLabels {
    fn from(config: &ReportConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            distance_unit: config.distance_unit.clone(),
        }
    }
}

/// Render a report in the configured format.
pub fn generate_report(stats: &Statistics, config: &ReportConfig) -> Result<String> {
    match config.format {
        OutputFormat::Text => Ok(generate_text_report(stats, &ReportLabels::from(config))),
        OutputFormat::Json => generate_json_report(stats),
    }
}

/// Generate the complete text report.
pub fn generate_text_report(stats: &Statistics, labels: &ReportLabels) -> String {
    let mut output = String::new();

    output.push_str(&generate_totals_section(stats, labels));
    output.push_str(&generate_tally_section("Trips per year:", &stats.trips_by_year));
    output.push_str(&generate_tally_section("Trips per city:", &stats.trips_by_city));
    output.push_str(&generate_tally_section("Trips per month:", &stats.trips_by_month));
    output.push_str(&format!(
        "Total distance: {} {}\n",
        stats.total_distance, labels.distance_unit
    ));
    output.push_str(&generate_tally_section(
        "Trips per product:",
        &stats.trips_by_product,
    ));
    output.push_str(&generate_duration_section(stats));

    if stats.skipped_records > 0 {
        output.push_str(&format!(
            "Skipped malformed records: {}\n",
            stats.skipped_records
        ));
    }

    output
}

/// Spend and trip counts.
fn generate_totals_section(stats: &Statistics, labels: &ReportLabels) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "Total spent: {} {}\n",
        stats.total_spent, labels.currency
    ));
    section.push_str(&format!("Total trips: {}\n", stats.total_trips));
    section.push_str(&format!("  COMPLETED: {}\n", stats.completed_count));
    section.push_str(&format!("  CANCELED: {}\n", stats.canceled_count));

    section
}

/// A heading followed by one indented line per bucket, in first-seen order.
fn generate_tally_section(title: &str, tally: &Tally) -> String {
    let mut section = String::new();

    section.push_str(title);
    section.push('\n');
    for (key, count) in tally.iter() {
        section.push_str(&format!("  {}: {}\n", key, count));
    }

    section
}

/// Ride time totals and extremes.
fn generate_duration_section(stats: &Statistics) -> String {
    let mut section = String::new();

    let durations = stats
        .durations
        .unwrap_or_else(|| DurationTotals::from_seconds(stats.total_duration_seconds));

    section.push_str(&format!(
        "Total time spent in trips: {} seconds\n",
        stats.total_duration_seconds
    ));
    section.push_str(&format!("  Minutes: {}\n", durations.minutes));
    section.push_str(&format!("  Hours: {}\n", durations.hours));
    section.push_str(&format!("  Days: {}\n", durations.days));
    section.push_str(&format!(
        "Shortest trip: {} minutes\n",
        stats.shortest_trip_minutes
    ));
    section.push_str(&format!(
        "Longest trip: {} minutes\n",
        stats.longest_trip_minutes
    ));

    section
}

/// Generate a JSON report.
pub fn generate_json_report(stats: &Statistics) -> Result<String> {
    serde_json::to_string_pretty(stats).map_err(Into::into)
}

/// Message printed when there is nothing to aggregate.
pub fn no_data_message(source: &str) -> String {
    format!("No data found to process in {}.", source)
}
