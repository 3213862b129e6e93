//! AltaRica 3 Stochastic Simulator Study Toolkit
//!
//! A Rust library for working with studies of the AltaRica 3 stochastic
//! simulator in both directions.
//!
//! This library provides tools for:
//! - Parsing simulator result reports (tab or semicolon delimited) into
//!   metadata, mission statistics and named indicator time series
//! - Generating the indicator (IDF) and mission (MDF) definition documents
//!   from a declarative study specification
//! - Exporting indicator series as CSV or Parquet tables
//! - Locating and running the simulator executable

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod generator;
pub mod models;
pub mod report;
pub mod simulator;
pub mod study;

// Re-export commonly used types
pub use config::ToolConfig;
pub use error::{Result, StudyError};
pub use export::{ExportFormat, indicator_frames, write_tables};
pub use generator::{generate_idf, generate_mdf, write_configuration};
pub use models::{
    EventFiredStats, Indicator, IndicatorDef, Metadata, MissionResult, SamplePoint, StudyResult,
    StudySummary,
};
pub use report::parse_report;
pub use study::{SimulationParams, StudySpec};
