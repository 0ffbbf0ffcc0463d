//! CSV reader for trip history exports.
//!
//! This module turns a delimited export with a header row into typed
//! [`TripRecord`]s. The header is checked once up front so that a missing
//! column is reported as a single error instead of failing row by row.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{columns, TripRecord};

/// Errors raised while reading an export.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(csv::Error),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl ReadError {
    /// Whether the run should stop instead of continuing with no data.
    ///
    /// Only a schema mismatch is fatal; unreadable or undecodable files
    /// are reported like a missing one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReadError::MissingColumns(_))
    }
}

impl From<csv::Error> for ReadError {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return ReadError::Csv(err);
        }
        match err.into_kind() {
            csv::ErrorKind::Io(source) => ReadError::Io(source),
            other => ReadError::Io(io::Error::new(io::ErrorKind::Other, format!("{:?}", other))),
        }
    }
}

/// Options for reading an export.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl From<&crate::config::InputConfig> for ReaderOptions {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
        }
    }
}

/// Positions of the consumed columns within a row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    fare_amount: usize,
    status: usize,
    request_time: usize,
    city: usize,
    distance: usize,
    product_type: usize,
    dropoff_time: usize,
    begin_trip_time: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ReadError> {
        let mut slots = [0usize; columns::REQUIRED.len()];
        let mut missing = Vec::new();

        // A repeated header resolves to its last occurrence.
        for (slot, name) in slots.iter_mut().zip(columns::REQUIRED) {
            let position = headers
                .iter()
                .enumerate()
                .filter(|(_, header)| *header == name)
                .map(|(i, _)| i)
                .last();
            match position {
                Some(position) => *slot = position,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ReadError::MissingColumns(missing));
        }

        let [fare_amount, status, request_time, city, distance, product_type, dropoff_time, begin_trip_time] =
            slots;

        Ok(Self {
            fare_amount,
            status,
            request_time,
            city,
            distance,
            product_type,
            dropoff_time,
            begin_trip_time,
        })
    }

    fn to_record(self, row: &StringRecord) -> TripRecord {
        let text = |i: usize| row.get(i).unwrap_or_default().to_string();
        let optional = |i: usize| {
            row.get(i)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        TripRecord {
            fare_amount: optional(self.fare_amount),
            status: text(self.status),
            request_time: text(self.request_time),
            city: text(self.city),
            distance: optional(self.distance),
            product_type: text(self.product_type),
            dropoff_time: optional(self.dropoff_time),
            begin_trip_time: optional(self.begin_trip_time),
            line: row.position().map(|p| p.line()),
        }
    }
}

/// Read all trips from the export at `path`, in file order.
pub fn read_trips(path: &Path, options: &ReaderOptions) -> Result<Vec<TripRecord>, ReadError> {
    info!("Reading trips from {}", path.display());

    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
        _ => ReadError::Io(e),
    })?;

    read_trips_from(file, options)
}

/// Read all trips from any byte source.
pub fn read_trips_from<R: Read>(
    source: R,
    options: &ReaderOptions,
) -> Result<Vec<TripRecord>, ReadError> {
    // Short rows are padded with empty values instead of being rejected.
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(source);

    let headers = rdr.headers()?;
    if headers.is_empty() {
        debug!("Export is empty");
        return Ok(Vec::new());
    }
    let index = ColumnIndex::from_headers(headers)?;
    debug!("Column layout: {:?}", index);

    let mut trips = Vec::new();
    for result in rdr.records() {
        let row = result?;
        trips.push(index.to_record(&row));
    }

    debug!("Read {} trip records", trips.len());
    Ok(trips)
}
