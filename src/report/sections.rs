//! Section location within a report.

use super::scanner::Delimiter;
use crate::constants::{
    INDICATORS_MARKER, META_DATA_MARKER, MISSION_MARKER, section_offsets,
};
use tracing::debug;

/// Named report sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    MetaData,
    Mission,
    Indicators,
}

impl Section {
    pub fn marker(self) -> &'static str {
        match self {
            Section::MetaData => META_DATA_MARKER,
            Section::Mission => MISSION_MARKER,
            Section::Indicators => INDICATORS_MARKER,
        }
    }

    /// Lines between the marker line and the first data row
    pub fn offset(self) -> usize {
        match self {
            Section::MetaData => section_offsets::META_DATA,
            Section::Mission => section_offsets::MISSION,
            Section::Indicators => section_offsets::INDICATORS,
        }
    }

    /// Index of the first data row of this section, `lines.len()` if absent
    pub fn locate(self, lines: &[&str], delimiter: Delimiter) -> usize {
        let start = locate(lines, delimiter, self.marker(), self.offset());
        if start >= lines.len() {
            debug!("Section '{}' not found or empty", self.marker());
        } else {
            debug!("Section '{}' data starts at line {}", self.marker(), start + 1);
        }
        start
    }
}

/// Find the line after the first line whose trimmed first field equals
/// `marker`, plus `offset`.
///
/// Returns `lines.len()` when the marker is absent, and never more than
/// `lines.len()`.
pub fn locate(lines: &[&str], delimiter: Delimiter, marker: &str, offset: usize) -> usize {
    lines
        .iter()
        .position(|line| delimiter.first_field(line) == marker)
        .map(|index| (index + 1 + offset).min(lines.len()))
        .unwrap_or(lines.len())
}
