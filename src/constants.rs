//! Application constants for the STO study toolkit
//!
//! This module contains the report format markers, recognized header keys,
//! normalization sentinels and schema defaults used throughout the crate.

// =============================================================================
// Report Section Markers
// =============================================================================

/// First-column marker opening the metadata section
pub const META_DATA_MARKER: &str = "Meta-Data";

/// First-column marker opening the mission (run statistics) section
pub const MISSION_MARKER: &str = "Mission";

/// First-column marker opening the indicators section
pub const INDICATORS_MARKER: &str = "Indicators";

/// First-column marker switching the current indicator in the data phase
pub const INDICATOR_SWITCH_MARKER: &str = "Indicator";

/// Lines to skip after the marker line before section data starts
pub mod section_offsets {
    pub const META_DATA: usize = 0;
    pub const MISSION: usize = 0;

    /// The indicators marker is followed by one column-header row
    pub const INDICATORS: usize = 1;
}

// =============================================================================
// Recognized Header Keys
// =============================================================================

/// Keys recognized below the `Meta-Data` marker
pub mod metadata_keys {
    pub const SOURCE_FILE: &str = "Source file";
    pub const MAIN_BLOCK: &str = "Main block";
    pub const TOOL_VERSION: &str = "Tool version";
    pub const COMPILER_VERSION: &str = "Compiler version";
}

/// Keys recognized below the `Mission` marker
pub mod mission_keys {
    pub const EXECUTIONS: &str = "Number of executions";
    pub const SEED: &str = "Seed";
    pub const MISSION_TIME: &str = "Mission time";
    pub const STARTED: &str = "Started";
    pub const COMPLETED: &str = "Completed";
    pub const EVENTS_FIRED: &str = "Number of events fired per execution";

    /// The event statistics values sit this many lines below their key
    pub const EVENTS_FIRED_LOOKAHEAD: usize = 2;
}

// =============================================================================
// Indicator Normalization
// =============================================================================

/// Indicator type whose value is categorical
pub const BOOLEAN_TYPE: &str = "Boolean";

/// Value carried by every non-categorical indicator
pub const NOT_APPLICABLE_VALUE: &str = "NA";

pub const TRUE_VALUE: &str = "true";
pub const FALSE_VALUE: &str = "false";

/// Separator between observer and measure in generated indicator names
pub const NAME_SEPARATOR: &str = "__";

/// Two-sided 95% normal quantile used for confidence half-widths
pub const IC95_Z_SCORE: f64 = 1.96;

// =============================================================================
// Study Schema Defaults
// =============================================================================

pub const DEFAULT_RUNS: u64 = 100;
pub const DEFAULT_SEED: i64 = 1234;
pub const DEFAULT_RESULT_FILENAME: &str = "result.csv";
pub const DEFAULT_SCHEDULE_NAME: &str = "Date";

/// Range start used when a step is given without an explicit start
pub const DEFAULT_SCHEDULE_FROM: f64 = 0.0;

// =============================================================================
// Simulator Files and Tooling
// =============================================================================

/// File name of the generated indicator definition document
pub const IDF_FILENAME: &str = "study.idf";

/// File name of the generated mission definition document
pub const MDF_FILENAME: &str = "study.mdf";

/// Executable name of the stochastic simulator
pub const SIMULATOR_BINARY: &str = "ar3sim";

/// Directory under the user data dir holding installed tool versions
pub const TOOLS_DIR_NAME: &str = "ar3sto";

/// Default simulator run timeout in seconds
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 3600;

/// Columns of an exported indicator table, in order
pub const EXPORT_COLUMNS: &[&str] = &["date", "sample_size", "mean", "std", "ic95"];
