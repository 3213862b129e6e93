//! Indicator table extraction.
//!
//! The `Indicators` section is read in two phases:
//!
//! 1. **Definitions**: one `id, observer` row per indicator, up to the first
//!    row with fewer than two fields (or the first `Indicator` switch row).
//! 2. **Data**: `Indicator, id` rows switch the current indicator and reset
//!    its series; numeric-leading rows `date, sample_size, mean?, std?`
//!    append one [`SamplePoint`] to the current indicator. Any other row is
//!    skipped.
//!
//! ```text
//! Indicators
//! Name        Observer
//! ind1        obsA
//! ind2        obsB
//!
//! Indicator   ind1
//! Date        Sample size   Mean   Std
//! 0.0         100           5.0    1.0
//! ```

use super::scanner::Delimiter;
use super::sections::Section;
use crate::constants::INDICATOR_SWITCH_MARKER;
use crate::error::{Result, StudyError};
use crate::models::{Indicator, IndicatorDef, SamplePoint};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

type SeriesById = HashMap<String, Vec<SamplePoint>>;

/// Indicator context while scanning the data phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState<'a> {
    NoActiveIndicator,
    Active(&'a str),
}

/// Extract every indicator with its series, keyed by id in definition order
pub fn extract_indicators(
    lines: &[&str],
    delimiter: Delimiter,
) -> Result<IndexMap<String, Indicator>> {
    let start = Section::Indicators.locate(lines, delimiter);

    let (definitions, data_start) = read_definitions(lines, start, delimiter)?;
    debug!(
        "Read {} indicator definitions, data phase starts at line {}",
        definitions.len(),
        data_start + 1
    );

    let mut series = read_series(lines, data_start, delimiter, &definitions)?;

    Ok(definitions
        .into_iter()
        .map(|(id, indicator)| {
            let points = series.remove(&id).unwrap_or_default();
            (id, indicator.with_series(points))
        })
        .collect())
}

/// Phase 1: read definition rows, returning them with the data phase start
fn read_definitions(
    lines: &[&str],
    start: usize,
    delimiter: Delimiter,
) -> Result<(IndexMap<String, Indicator>, usize)> {
    let mut definitions = IndexMap::new();

    for (index, line) in lines.iter().enumerate().skip(start) {
        let fields = delimiter.split(line);

        if fields[0].trim() == INDICATOR_SWITCH_MARKER {
            return Ok((definitions, index));
        }
        if fields.len() < 2 {
            return Ok((definitions, index + 1));
        }

        let id = fields[0].trim().to_string();
        let indicator = Indicator::from_def(IndicatorDef {
            id: Some(id.clone()),
            name: Some(id.clone()),
            observer: Some(fields[1].trim().to_string()),
            ..Default::default()
        })?;
        definitions.insert(id, indicator);
    }

    Ok((definitions, lines.len()))
}

/// Phase 2: fold the data rows into per-indicator series
fn read_series<'a>(
    lines: &[&'a str],
    start: usize,
    delimiter: Delimiter,
    definitions: &IndexMap<String, Indicator>,
) -> Result<SeriesById> {
    let (_, series) = lines
        .iter()
        .enumerate()
        .skip(start)
        .map(|(index, line)| (index, *line))
        .try_fold(
            (ScanState::NoActiveIndicator, HashMap::new()),
            |(state, mut series), (index, line)| -> Result<(ScanState<'a>, SeriesById)> {
                let fields: Vec<&'a str> = delimiter
                    .split(line.trim())
                    .into_iter()
                    .map(str::trim)
                    .collect();
                let line_number = index + 1;

                if fields[0] == INDICATOR_SWITCH_MARKER {
                    let id = switch_target(&fields, line_number, definitions)?;
                    series.insert(id.to_string(), Vec::new());
                    return Ok((ScanState::Active(id), series));
                }

                match (state, fields[0].parse::<f64>()) {
                    (ScanState::Active(id), Ok(date)) => {
                        let point = parse_sample(date, &fields, line_number)?;
                        series
                            .entry(id.to_string())
                            .or_insert_with(Vec::new)
                            .push(point);
                    }
                    (ScanState::NoActiveIndicator, Ok(_)) => {
                        debug!("Skipping data row at line {} outside any indicator", line_number);
                    }
                    (_, Err(_)) => {}
                }

                Ok((state, series))
            },
        )?;

    Ok(series)
}

/// Indicator id named by a switch row; it must have been defined in phase 1
fn switch_target<'a>(
    fields: &[&'a str],
    line_number: usize,
    definitions: &IndexMap<String, Indicator>,
) -> Result<&'a str> {
    let id = fields
        .get(1)
        .copied()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StudyError::malformed(line_number, "indicator switch row without an id"))?;

    if !definitions.contains_key(id) {
        return Err(StudyError::malformed(
            line_number,
            format!("data for undefined indicator '{}'", id),
        ));
    }

    Ok(id)
}

/// Build a sample point from `[date, sample_size, mean?, std?]`
fn parse_sample(date: f64, fields: &[&str], line_number: usize) -> Result<SamplePoint> {
    let sample_size = fields
        .get(1)
        .ok_or_else(|| StudyError::malformed(line_number, "data row without a sample size"))?;
    let sample_size = sample_size.parse::<u64>().map_err(|_| {
        StudyError::malformed(
            line_number,
            format!("invalid sample size '{}'", sample_size),
        )
    })?;

    let mean = optional_float(fields.get(2).copied(), "mean", line_number)?;
    let std = optional_float(fields.get(3).copied(), "std", line_number)?;

    Ok(SamplePoint::new(date, sample_size, mean, std))
}

/// Parse a trailing column; absent or empty columns are NaN
fn optional_float(field: Option<&str>, column: &str, line_number: usize) -> Result<f64> {
    match field {
        None | Some("") => Ok(f64::NAN),
        Some(value) => value.parse::<f64>().map_err(|_| {
            StudyError::malformed(line_number, format!("invalid {} '{}'", column, value))
        }),
    }
}
