//! Metadata and mission section extraction.
//!
//! Both sections are key/value tables: the trimmed first field names the
//! key, the trimmed second field carries the value. A section ends at the
//! first line with fewer than two fields. Unrecognized keys are ignored so
//! newer simulator versions can add rows without breaking the parser.

use super::scanner::Delimiter;
use super::sections::Section;
use crate::constants::{metadata_keys, mission_keys};
use crate::error::{Result, StudyError};
use crate::models::{EventFiredStats, Metadata, MissionResult};
use std::str::FromStr;
use tracing::debug;

/// Extract the `Meta-Data` section; an absent section yields defaults
pub fn extract_metadata(lines: &[&str], delimiter: Delimiter) -> Metadata {
    let start = Section::MetaData.locate(lines, delimiter);
    let mut builder = MetadataBuilder::default();

    for row in key_value_rows(lines, start, delimiter) {
        builder.apply(row.key, row.value);
    }

    builder.build()
}

/// Extract the `Mission` section; an absent section yields defaults
pub fn extract_mission(lines: &[&str], delimiter: Delimiter) -> Result<MissionResult> {
    let start = Section::Mission.locate(lines, delimiter);
    let mut builder = MissionBuilder::default();

    for row in key_value_rows(lines, start, delimiter) {
        builder.apply(&row, lines, delimiter)?;
    }

    Ok(builder.build())
}

/// One key/value row of a header section
#[derive(Debug, Clone, Copy)]
struct KeyValueRow<'a> {
    /// 0-based index into the report lines
    index: usize,
    key: &'a str,
    value: &'a str,
}

impl KeyValueRow<'_> {
    fn line_number(&self) -> usize {
        self.index + 1
    }
}

/// Rows from `start` up to the first line with fewer than two fields
fn key_value_rows<'a>(
    lines: &'a [&'a str],
    start: usize,
    delimiter: Delimiter,
) -> impl Iterator<Item = KeyValueRow<'a>> + 'a {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .map(move |(index, line)| (index, delimiter.split(line)))
        .take_while(|(_, fields)| fields.len() >= 2)
        .map(|(index, fields)| KeyValueRow {
            index,
            key: fields[0].trim(),
            value: fields[1].trim(),
        })
}

/// Parse a numeric header value, naming the key in the error
fn parse_number<T: FromStr>(row: &KeyValueRow<'_>) -> Result<T> {
    row.value.parse::<T>().map_err(|_| {
        StudyError::malformed(
            row.line_number(),
            format!("'{}' expects a number, found '{}'", row.key, row.value),
        )
    })
}

/// Builder for report metadata
#[derive(Debug, Default)]
struct MetadataBuilder {
    main_block: Option<String>,
    source_file: Option<String>,
    tool_version: Option<String>,
    compiler_version: Option<String>,
}

impl MetadataBuilder {
    fn apply(&mut self, key: &str, value: &str) {
        match key {
            metadata_keys::SOURCE_FILE => self.source_file = Some(value.to_string()),
            metadata_keys::MAIN_BLOCK => self.main_block = Some(value.to_string()),
            metadata_keys::TOOL_VERSION => self.tool_version = Some(value.to_string()),
            metadata_keys::COMPILER_VERSION => self.compiler_version = Some(value.to_string()),
            _ => debug!("Ignoring unrecognized metadata key '{}'", key),
        }
    }

    fn build(self) -> Metadata {
        Metadata {
            main_block: self.main_block,
            source_file: self.source_file,
            tool_version: self.tool_version,
            compiler_version: self.compiler_version,
        }
    }
}

/// Builder for mission run statistics
#[derive(Debug, Default)]
struct MissionBuilder {
    executions: Option<u64>,
    seed: Option<i64>,
    mission_time: Option<f64>,
    started: Option<String>,
    completed: Option<String>,
    event_fired_stats: Option<EventFiredStats>,
}

impl MissionBuilder {
    fn apply(&mut self, row: &KeyValueRow<'_>, lines: &[&str], delimiter: Delimiter) -> Result<()> {
        match row.key {
            mission_keys::EXECUTIONS => self.executions = Some(parse_number(row)?),
            mission_keys::SEED => self.seed = Some(parse_number(row)?),
            mission_keys::MISSION_TIME => self.mission_time = Some(parse_number(row)?),
            mission_keys::STARTED => self.started = Some(row.value.to_string()),
            mission_keys::COMPLETED => self.completed = Some(row.value.to_string()),
            mission_keys::EVENTS_FIRED => {
                self.event_fired_stats = Some(parse_event_fired_stats(row, lines, delimiter)?);
            }
            _ => debug!("Ignoring unrecognized mission key '{}'", row.key),
        }
        Ok(())
    }

    fn build(self) -> MissionResult {
        MissionResult {
            executions: self.executions,
            seed: self.seed,
            mission_time: self.mission_time,
            started: self.started,
            completed: self.completed,
            event_fired_stats: self.event_fired_stats,
        }
    }
}

/// Read the mean/min/max triple sitting two lines below the key row
fn parse_event_fired_stats(
    row: &KeyValueRow<'_>,
    lines: &[&str],
    delimiter: Delimiter,
) -> Result<EventFiredStats> {
    let stats_index = row.index + mission_keys::EVENTS_FIRED_LOOKAHEAD;
    let stats_line = lines.get(stats_index).ok_or_else(|| {
        StudyError::malformed(
            row.line_number(),
            format!("'{}' has no statistics line below it", row.key),
        )
    })?;

    let tokens: Vec<&str> = delimiter
        .split(stats_line)
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    let values = tokens
        .iter()
        .map(|token| token.parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>();

    match (tokens.len(), values) {
        (3, Ok(values)) => Ok(EventFiredStats {
            mean: values[0],
            min: values[1],
            max: values[2],
        }),
        _ => Err(StudyError::malformed(
            stats_index + 1,
            format!(
                "expected three numbers (mean, min, max) for '{}', found '{}'",
                row.key,
                stats_line.trim()
            ),
        )),
    }
}
