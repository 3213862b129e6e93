//! Command-line argument definitions for ar3sto
//!
//! This module defines the CLI interface using the clap derive API.

use crate::export::ExportFormat;
use crate::{Result, StudyError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the AltaRica 3 study toolkit
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ar3sto",
    version,
    about = "Inspect, export, generate and run AltaRica 3 stochastic simulator studies",
    long_about = "Parses result reports of the AltaRica 3 stochastic simulator into metadata, \
                  mission statistics and indicator time series, exports those series as CSV or \
                  Parquet tables, and generates the indicator and mission definition files the \
                  simulator consumes from a TOML or JSON study."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress output except errors"
    )]
    pub quiet: bool,

    /// TOML configuration file. If not specified, looks for
    /// <config dir>/ar3sto/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse a result report and print its contents
    Inspect(InspectArgs),
    /// Export the indicator series of one or more reports as tables
    Export(ExportArgs),
    /// Generate the IDF and MDF documents of a study
    Generate(GenerateArgs),
    /// Generate a study, run the simulator and parse its report
    Simulate(SimulateArgs),
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Result report to parse
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Print the full series of this indicator
    #[arg(short = 'i', long = "indicator", value_name = "ID")]
    pub indicator: Option<String>,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the export command
#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    /// Report path or glob pattern, e.g. "runs/*/result.csv"
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Output directory; one subdirectory per report
    #[arg(short = 'o', long = "output", value_name = "PATH", default_value = "export")]
    pub output_path: PathBuf,

    /// Table format (defaults to the configured one)
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<ExportFormat>,

    /// Reports exported concurrently (defaults to the configured value)
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,
}

/// Arguments for the generate command
#[derive(Debug, Clone, Parser)]
pub struct GenerateArgs {
    /// Study definition (.toml or .json)
    #[arg(value_name = "STUDY")]
    pub study: PathBuf,

    /// Directory receiving the IDF and MDF files (defaults to the work dir)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Override the result file name written into the MDF
    #[arg(long = "result-file", value_name = "NAME")]
    pub result_file: Option<String>,

    /// Print both documents instead of writing them
    #[arg(long = "print")]
    pub print: bool,
}

/// Arguments for the simulate command
#[derive(Debug, Clone, Parser)]
pub struct SimulateArgs {
    /// Study definition (.toml or .json)
    #[arg(value_name = "STUDY")]
    pub study: PathBuf,

    /// Model file handed to the simulator
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Directory for generated documents and the result report
    #[arg(short = 'w', long = "work-dir", value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Simulator executable, bypassing discovery
    #[arg(long = "simulator", value_name = "FILE")]
    pub simulator: Option<PathBuf>,

    /// Installed simulator version to use
    #[arg(long = "tool-version", value_name = "VERSION")]
    pub tool_version: Option<String>,

    /// Maximum run time in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Override the result file name written into the MDF
    #[arg(long = "result-file", value_name = "NAME")]
    pub result_file: Option<String>,

    /// Also export the indicator tables into this directory
    #[arg(long = "export", value_name = "PATH")]
    pub export_path: Option<PathBuf>,
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON summary for machine consumption
    Json,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ExportArgs {
    pub fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(StudyError::configuration("export pattern must not be empty"));
        }
        if self.workers == Some(0) {
            return Err(StudyError::configuration("workers must be at least 1"));
        }
        Ok(())
    }
}

impl SimulateArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.model.exists() {
            return Err(StudyError::configuration(format!(
                "Model file does not exist: {}",
                self.model.display()
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(StudyError::configuration("timeout must be positive"));
        }
        Ok(())
    }
}
