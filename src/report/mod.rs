//! Simulator result report parser.
//!
//! A report is delimited text (tab or semicolon) holding three sections,
//! each opened by a marker in the first column:
//!
//! ```text
//! Meta-Data
//! Main block      System
//! Tool version    1.2.0
//!
//! Mission
//! Seed            1234
//! Mission time    8760
//!
//! Indicators
//! Name    Observer
//! ind1    obsA
//!
//! Indicator   ind1
//! 0.0     100     5.0     1.0
//! ```
//!
//! ## Architecture
//!
//! - [`scanner`] - line splitting and delimiter detection
//! - [`sections`] - section marker location
//! - [`header`] - metadata and mission key/value extraction
//! - [`indicators`] - two-phase indicator definition/series extraction
//!
//! Each extractor re-scans the report from the top, so sections may appear
//! in any order or be missing altogether. When a marker appears more than
//! once, the first occurrence wins.

pub mod header;
pub mod indicators;
pub mod scanner;
pub mod sections;

#[cfg(test)]
pub mod tests;

pub use scanner::{Delimiter, ReportLines};
pub use sections::Section;

use crate::error::Result;
use crate::models::StudyResult;
use tracing::debug;

/// Parse a full report into an immutable [`StudyResult`].
///
/// Fails atomically: any malformed row in a section being parsed aborts
/// the whole aggregate.
pub fn parse_report(text: &str) -> Result<StudyResult> {
    let report = ReportLines::scan(text)?;
    let lines = report.lines();
    let delimiter = report.delimiter();

    debug!(
        "Parsing report: {} lines, {} delimited",
        report.len(),
        delimiter
    );

    let metadata = header::extract_metadata(lines, delimiter);
    let mission = header::extract_mission(lines, delimiter)?;
    let indicators = indicators::extract_indicators(lines, delimiter)?;

    debug!(
        "Parsed report with {} indicators (main block: {:?})",
        indicators.len(),
        metadata.main_block
    );

    Ok(StudyResult::assemble(metadata, mission, indicators))
}
