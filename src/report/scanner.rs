//! Line splitting and delimiter detection for simulator reports.
//!
//! Reports come either tab- or semicolon-separated. The header lines do not
//! tell them apart, so the choice is made from line index 1 and threaded
//! through every extractor. Mixed delimiters within one report are not
//! detected.

use crate::error::{Result, StudyError};
use std::fmt;

/// Field delimiter of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Detect the delimiter by inspecting the second line of the report
    pub fn detect(lines: &[&str]) -> Result<Self> {
        let second = lines
            .get(1)
            .ok_or_else(|| StudyError::UnrecognizedDelimiter {
                reason: format!(
                    "report has {} line(s), at least 2 are needed",
                    lines.len()
                ),
            })?;

        if second.contains(';') {
            Ok(Delimiter::Semicolon)
        } else {
            Ok(Delimiter::Tab)
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Split a line into its raw (untrimmed) fields
    pub fn split(self, line: &str) -> Vec<&str> {
        line.split(self.as_char()).collect()
    }

    /// Trimmed first field of a line
    pub fn first_field(self, line: &str) -> &str {
        line.split(self.as_char()).next().unwrap_or_default().trim()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Semicolon => write!(f, "semicolon"),
        }
    }
}

/// Report text split into lines with its detected delimiter
#[derive(Debug, Clone)]
pub struct ReportLines<'a> {
    lines: Vec<&'a str>,
    delimiter: Delimiter,
}

impl<'a> ReportLines<'a> {
    /// Split `text` on line endings (`\n` or `\r\n`) and detect the delimiter
    pub fn scan(text: &'a str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let delimiter = Delimiter::detect(&lines)?;
        Ok(Self { lines, delimiter })
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
