//! Core data structures for simulator reports and study definitions.
//!
//! Defines the report records (metadata, mission statistics, indicator
//! series), the indicator model shared with study specifications, and the
//! immutable study result aggregate.

use crate::constants::{
    BOOLEAN_TYPE, FALSE_VALUE, IC95_Z_SCORE, NAME_SEPARATOR, NOT_APPLICABLE_VALUE, TRUE_VALUE,
};
use crate::error::{Result, StudyError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Metadata extracted from the `Meta-Data` section of a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub main_block: Option<String>,
    pub source_file: Option<String>,
    pub tool_version: Option<String>,
    pub compiler_version: Option<String>,
}

/// Mean/min/max number of events fired per execution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventFiredStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Run statistics extracted from the `Mission` section of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionResult {
    pub executions: Option<u64>,
    pub seed: Option<i64>,
    pub mission_time: Option<f64>,
    pub started: Option<String>,
    pub completed: Option<String>,
    pub event_fired_stats: Option<EventFiredStats>,
}

/// One timestamped statistical summary of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub date: f64,
    pub sample_size: u64,
    pub mean: f64,
    pub std: f64,
    pub ic95: f64,
}

impl SamplePoint {
    /// Build a sample point, deriving the 95% confidence half-width.
    ///
    /// `mean` and `std` are NaN when the report row omits them.
    pub fn new(date: f64, sample_size: u64, mean: f64, std: f64) -> Self {
        Self {
            date,
            sample_size,
            mean,
            std,
            ic95: confidence_half_width(std, sample_size),
        }
    }
}

/// `1.96 * std / sqrt(n)`, NaN when `std` is NaN or `n == 0`
pub fn confidence_half_width(std: f64, sample_size: u64) -> f64 {
    if std.is_nan() || sample_size == 0 {
        return f64::NAN;
    }
    IC95_Z_SCORE * std / (sample_size as f64).sqrt()
}

/// Raw indicator definition as written by a user or read from a report.
///
/// Every field is optional; [`Indicator::from_def`] applies the defaults
/// and normalization rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorDef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub tags: Vec<String>,
    pub observer: Option<String>,
    pub block: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub measure: Option<String>,
    pub value: Option<String>,
    pub stats: Vec<String>,
}

/// A measurable quantity tracked across simulation time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    id: String,
    name: String,
    description: String,
    unit: Option<String>,
    tags: Vec<String>,
    observer: String,
    block: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    measure: Option<String>,
    value: String,
    stats: Vec<String>,
    #[serde(skip)]
    series: Vec<SamplePoint>,
}

impl Indicator {
    /// Build a fully normalized indicator from a raw definition
    pub fn from_def(def: IndicatorDef) -> Result<Self> {
        let observer = def
            .observer
            .ok_or_else(|| StudyError::missing_field("indicator.observer"))?;

        let id = def
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let name = def.name.unwrap_or_else(|| match &def.measure {
            Some(measure) => format!("{observer}{NAME_SEPARATOR}{measure}"),
            None => observer.clone(),
        });
        let description = def.description.unwrap_or_else(|| name.clone());
        let value = normalize_value(def.kind.as_deref(), def.value.as_deref());

        if let Some(stat) = def.stats.iter().find(|s| !is_element_name(s)) {
            return Err(StudyError::invalid_field(
                "indicator.stats",
                format!("'{stat}' is not usable as an element name"),
            ));
        }

        Ok(Self {
            id,
            name,
            description,
            unit: def.unit,
            tags: def.tags,
            observer,
            block: def.block,
            kind: def.kind,
            measure: def.measure,
            value,
            stats: def.stats,
            series: Vec::new(),
        })
    }

    /// Raw definition reproducing this indicator (series excluded)
    pub fn to_def(&self) -> IndicatorDef {
        IndicatorDef {
            id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            unit: self.unit.clone(),
            tags: self.tags.clone(),
            observer: Some(self.observer.clone()),
            block: self.block.clone(),
            kind: self.kind.clone(),
            measure: self.measure.clone(),
            value: Some(self.value.clone()),
            stats: self.stats.clone(),
        }
    }

    pub(crate) fn with_series(mut self, series: Vec<SamplePoint>) -> Self {
        self.series = series;
        self
    }

    pub(crate) fn with_default_block(mut self, block: Option<&str>) -> Self {
        if self.block.is_none() {
            self.block = block.map(str::to_string);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn observer(&self) -> &str {
        &self.observer
    }

    pub fn block(&self) -> Option<&str> {
        self.block.as_deref()
    }

    /// Simulator indicator type (`Boolean` for categorical indicators)
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn measure(&self) -> Option<&str> {
        self.measure.as_deref()
    }

    /// Normalized value: `true`/`false` for categorical indicators, `NA` otherwise
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn stats(&self) -> &[String] {
        &self.stats
    }

    pub fn series(&self) -> &[SamplePoint] {
        &self.series
    }

    pub fn is_categorical(&self) -> bool {
        self.kind.as_deref() == Some(BOOLEAN_TYPE)
    }
}

/// Normalize an indicator value according to its type
///
/// Categorical indicators carry lowercase `true`/`false` (`true` when the
/// raw value is missing or unrecognized); every other type carries `NA`.
pub fn normalize_value(kind: Option<&str>, value: Option<&str>) -> String {
    if kind != Some(BOOLEAN_TYPE) {
        return NOT_APPLICABLE_VALUE.to_string();
    }

    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == FALSE_VALUE => FALSE_VALUE.to_string(),
        _ => TRUE_VALUE.to_string(),
    }
}

/// Statistic names become IDF element names: an ASCII letter or `_`
/// followed by ASCII alphanumerics, `-`, `_` or `.`
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Parsed simulator report: metadata, run statistics and indicator series
#[derive(Debug, Clone, Serialize)]
pub struct StudyResult {
    metadata: Metadata,
    mission: MissionResult,
    indicators: IndexMap<String, Indicator>,
}

impl StudyResult {
    /// Assemble the aggregate, back-filling unset indicator blocks from
    /// the report's main block.
    pub(crate) fn assemble(
        metadata: Metadata,
        mission: MissionResult,
        indicators: IndexMap<String, Indicator>,
    ) -> Self {
        let main_block = metadata.main_block.as_deref();
        let indicators = indicators
            .into_iter()
            .map(|(id, indicator)| (id, indicator.with_default_block(main_block)))
            .collect();

        Self {
            metadata,
            mission,
            indicators,
        }
    }

    /// Parse a report from its full text
    pub fn from_report_str(text: &str) -> Result<Self> {
        crate::report::parse_report(text)
    }

    /// Read and parse a UTF-8 report file
    pub fn from_report_file(path: &Path) -> Result<Self> {
        info!("Loading simulator report: {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_report_str(&text)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn mission(&self) -> &MissionResult {
        &self.mission
    }

    /// Indicators keyed by id, in report order
    pub fn indicators(&self) -> &IndexMap<String, Indicator> {
        &self.indicators
    }

    pub fn indicator(&self, id: &str) -> Option<&Indicator> {
        self.indicators.get(id)
    }

    /// Compact overview suitable for JSON reporting
    pub fn summary(&self) -> StudySummary {
        StudySummary {
            main_block: self.metadata.main_block.clone(),
            tool_version: self.metadata.tool_version.clone(),
            executions: self.mission.executions,
            seed: self.mission.seed,
            mission_time: self.mission.mission_time,
            indicators: self
                .indicators
                .values()
                .map(|indicator| IndicatorSummary {
                    id: indicator.id().to_string(),
                    observer: indicator.observer().to_string(),
                    block: indicator.block().map(str::to_string),
                    points: indicator.series().len(),
                    final_mean: indicator.series().last().map(|point| point.mean),
                })
                .collect(),
        }
    }
}

/// Serializable overview of a parsed report
#[derive(Debug, Clone, Serialize)]
pub struct StudySummary {
    pub main_block: Option<String>,
    pub tool_version: Option<String>,
    pub executions: Option<u64>,
    pub seed: Option<i64>,
    pub mission_time: Option<f64>,
    pub indicators: Vec<IndicatorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSummary {
    pub id: String,
    pub observer: String,
    pub block: Option<String>,
    pub points: usize,
    pub final_mean: Option<f64>,
}
