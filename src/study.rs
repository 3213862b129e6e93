//! Study specifications.
//!
//! A study names the indicators the simulator must compute and the run
//! schedule. It is loaded from a TOML or JSON document through raw serde
//! structs, then validated into [`StudySpec`]: only `runs`, `seed`,
//! `result_filename` and `schedule_name` have schema defaults, and a
//! missing `schedule_to` is rejected.
//!
//! ```toml
//! name = "pumping_station"
//! main_block = "System"
//!
//! [simu_params]
//! runs = 1000
//! schedule_to = 8760
//! schedule_step = 876
//!
//! [[indicators]]
//! observer = "pump_failed"
//! type = "Boolean"
//! measure = "mean-value"
//! stats = ["mean", "standard-deviation"]
//! ```

use crate::constants::{
    DEFAULT_RESULT_FILENAME, DEFAULT_RUNS, DEFAULT_SCHEDULE_NAME, DEFAULT_SEED,
};
use crate::error::{Result, StudyError};
use crate::models::{Indicator, IndicatorDef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Simulation run and schedule parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationParams {
    pub runs: u64,
    pub seed: i64,
    pub result_filename: String,
    pub schedule_name: String,
    pub schedule_unit: Option<String>,
    pub schedule_from: Option<f64>,
    pub schedule_to: f64,
    pub schedule_step: Option<f64>,
}

impl SimulationParams {
    /// Parameters with schema defaults and the given mission time
    pub fn new(schedule_to: f64) -> Self {
        Self {
            runs: DEFAULT_RUNS,
            seed: DEFAULT_SEED,
            result_filename: DEFAULT_RESULT_FILENAME.to_string(),
            schedule_name: DEFAULT_SCHEDULE_NAME.to_string(),
            schedule_unit: None,
            schedule_from: None,
            schedule_to,
            schedule_step: None,
        }
    }

    pub fn with_runs(mut self, runs: u64) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.schedule_unit = Some(unit.into());
        self
    }

    /// Sample the schedule every `step` from `from` (0 when unset)
    pub fn with_range(mut self, from: Option<f64>, step: f64) -> Self {
        self.schedule_from = from;
        self.schedule_step = Some(step);
        self
    }

    fn from_raw(raw: RawSimulationParams) -> Result<Self> {
        let schedule_to = raw
            .schedule_to
            .ok_or_else(|| StudyError::missing_field("simu_params.schedule_to"))?;

        Ok(Self {
            runs: raw.runs,
            seed: raw.seed,
            result_filename: raw.result_filename,
            schedule_name: raw.schedule_name,
            schedule_unit: raw.schedule_unit,
            schedule_from: raw.schedule_from,
            schedule_to,
            schedule_step: raw.schedule_step,
        })
    }
}

/// Validated study specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySpec {
    pub name: String,
    pub description: Option<String>,
    pub main_block: Option<String>,
    pub indicators: Vec<Indicator>,
    pub simu_params: SimulationParams,
}

impl StudySpec {
    pub fn new(name: impl Into<String>, simu_params: SimulationParams) -> Self {
        Self {
            name: name.into(),
            description: None,
            main_block: None,
            indicators: Vec::new(),
            simu_params,
        }
    }

    pub fn with_main_block(mut self, main_block: impl Into<String>) -> Self {
        self.main_block = Some(main_block.into());
        self
    }

    /// Add an indicator, normalizing its raw definition
    pub fn with_indicator(mut self, def: IndicatorDef) -> Result<Self> {
        self.indicators.push(Indicator::from_def(def)?);
        Ok(self)
    }

    /// Same study writing its results to `filename`
    pub fn with_result_filename(mut self, filename: impl Into<String>) -> Self {
        self.simu_params.result_filename = filename.into();
        self
    }

    /// Load a study from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading study definition: {}", path.display());

        let text = std::fs::read_to_string(path)
            .map_err(|e| StudyError::study_load(path, e.to_string()))?;

        let raw: RawStudySpec = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&text).map_err(|e| StudyError::study_load(path, e.to_string()))?
            }
            _ => toml::from_str(&text).map_err(|e| StudyError::study_load(path, e.to_string()))?,
        };

        Self::from_raw(raw)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawStudySpec =
            toml::from_str(text).map_err(|e| StudyError::study_load("<toml>", e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawStudySpec = serde_json::from_str(text)
            .map_err(|e| StudyError::study_load("<json>", e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawStudySpec) -> Result<Self> {
        let simu_params = SimulationParams::from_raw(raw.simu_params)?;
        let indicators = raw
            .indicators
            .into_iter()
            .map(Indicator::from_def)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Study '{}' defines {} indicators",
            raw.name,
            indicators.len()
        );

        Ok(Self {
            name: raw.name,
            description: raw.description,
            main_block: raw.main_block,
            indicators,
            simu_params,
        })
    }
}

/// Study document as written by users
#[derive(Debug, Deserialize)]
struct RawStudySpec {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    main_block: Option<String>,
    #[serde(default)]
    indicators: Vec<IndicatorDef>,
    #[serde(default)]
    simu_params: RawSimulationParams,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSimulationParams {
    runs: u64,
    seed: i64,
    result_filename: String,
    schedule_name: String,
    schedule_unit: Option<String>,
    schedule_from: Option<f64>,
    schedule_to: Option<f64>,
    schedule_step: Option<f64>,
}

impl Default for RawSimulationParams {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            seed: DEFAULT_SEED,
            result_filename: DEFAULT_RESULT_FILENAME.to_string(),
            schedule_name: DEFAULT_SCHEDULE_NAME.to_string(),
            schedule_unit: None,
            schedule_from: None,
            schedule_to: None,
            schedule_step: None,
        }
    }
}
