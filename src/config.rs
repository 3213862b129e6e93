//! Configuration management and validation.
//!
//! Provides the tool configuration shared by the command-line front end and
//! the simulator collaborator: where the simulator lives, how long a run may
//! take, where study documents are written and how indicator tables are
//! exported. Every field has a default, so a TOML file only needs to name
//! what it overrides.

use crate::constants::{
    DEFAULT_RUN_TIMEOUT_SECS, IDF_FILENAME, MDF_FILENAME, SIMULATOR_BINARY, TOOLS_DIR_NAME,
};
use crate::error::{Result, StudyError};
use crate::export::ExportFormat;
use crate::generator::ConfigurationFiles;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration for simulator runs and exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Explicit simulator binary; skips discovery when set
    pub simulator_binary: Option<PathBuf>,
    /// Simulator version directory under the install root
    pub tool_version: Option<String>,
    /// Root of installed simulator versions (defaults to the user data dir)
    pub install_root: Option<PathBuf>,
    /// Executable name searched for during discovery
    pub binary_name: String,
    /// Maximum wall-clock time of one simulator run, in seconds
    pub run_timeout_secs: u64,
    /// Directory receiving generated documents and simulator output
    pub work_dir: PathBuf,
    /// Indicator definition file name inside the work dir
    pub idf_filename: String,
    /// Mission definition file name inside the work dir
    pub mdf_filename: String,
    /// Table format for exported indicator series
    pub export_format: ExportFormat,
    /// Reports exported concurrently
    pub export_parallelism: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            simulator_binary: None,
            tool_version: None,
            install_root: None,
            binary_name: SIMULATOR_BINARY.to_string(),
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
            work_dir: PathBuf::from("."),
            idf_filename: IDF_FILENAME.to_string(),
            mdf_filename: MDF_FILENAME.to_string(),
            export_format: ExportFormat::default(),
            export_parallelism: num_cpus::get(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration: {}", path.display());

        let text = std::fs::read_to_string(path).map_err(|e| {
            StudyError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| StudyError::configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could honour
    pub fn validate(&self) -> Result<()> {
        if self.run_timeout_secs == 0 {
            return Err(StudyError::configuration("run_timeout_secs must be positive"));
        }
        if self.export_parallelism == 0 {
            return Err(StudyError::configuration(
                "export_parallelism must be positive",
            ));
        }
        if self.binary_name.trim().is_empty() {
            return Err(StudyError::configuration("binary_name must not be empty"));
        }
        Ok(())
    }

    /// Use this simulator binary instead of discovering one
    pub fn with_simulator_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.simulator_binary = Some(binary.into());
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = Some(root.into());
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    pub fn with_export_parallelism(mut self, parallelism: usize) -> Self {
        self.export_parallelism = parallelism.max(1);
        self
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Install root, falling back to `<data dir>/ar3sto/tools`
    pub fn resolved_install_root(&self) -> Option<PathBuf> {
        self.install_root
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(TOOLS_DIR_NAME).join("tools")))
    }

    pub fn idf_path(&self) -> PathBuf {
        self.work_dir.join(&self.idf_filename)
    }

    pub fn mdf_path(&self) -> PathBuf {
        self.work_dir.join(&self.mdf_filename)
    }

    /// Study documents inside the work dir
    pub fn configuration_files(&self) -> ConfigurationFiles {
        ConfigurationFiles {
            idf: self.idf_path(),
            mdf: self.mdf_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();

        assert_eq!(config.binary_name, "ar3sim");
        assert_eq!(config.run_timeout(), Duration::from_secs(3600));
        assert_eq!(config.idf_path(), PathBuf::from("./study.idf"));
        assert_eq!(config.export_format, ExportFormat::Csv);
        assert!(config.export_parallelism >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ToolConfig::from_toml_str(
            "tool_version = \"1.4\"\nrun_timeout_secs = 60\nexport_format = \"parquet\"\n",
        )
        .unwrap();

        assert_eq!(config.tool_version.as_deref(), Some("1.4"));
        assert_eq!(config.run_timeout_secs, 60);
        assert_eq!(config.export_format, ExportFormat::Parquet);
        assert_eq!(config.mdf_filename, "study.mdf");
        assert_eq!(config.simulator_binary, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ToolConfig::from_toml_str("run_timeout_secs = 0\n"),
            Err(StudyError::Configuration { .. })
        ));
        assert!(matches!(
            ToolConfig::from_toml_str("export_parallelism = 0\n"),
            Err(StudyError::Configuration { .. })
        ));
        assert!(matches!(
            ToolConfig::from_toml_str("run_timeout_secs = \"soon\"\n"),
            Err(StudyError::Configuration { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "install_root = \"/opt/ar3\"").unwrap();
        writeln!(file, "work_dir = \"/tmp/study\"").unwrap();

        let config = ToolConfig::from_file(file.path()).unwrap();

        assert_eq!(config.resolved_install_root(), Some(PathBuf::from("/opt/ar3")));
        assert_eq!(config.mdf_path(), PathBuf::from("/tmp/study/study.mdf"));
    }

    #[test]
    fn test_missing_file_is_a_configuration_error() {
        let err = ToolConfig::from_file(Path::new("/nonexistent/ar3sto.toml")).unwrap_err();
        assert!(matches!(err, StudyError::Configuration { .. }));
    }

    #[test]
    fn test_builder_methods() {
        let config = ToolConfig::default()
            .with_simulator_binary("/usr/local/bin/ar3sim")
            .with_tool_version("2.0")
            .with_run_timeout(Duration::from_millis(10))
            .with_export_parallelism(0)
            .with_work_dir("/work");

        assert_eq!(
            config.simulator_binary,
            Some(PathBuf::from("/usr/local/bin/ar3sim"))
        );
        assert_eq!(config.run_timeout_secs, 1);
        assert_eq!(config.export_parallelism, 1);
        assert_eq!(config.idf_path(), PathBuf::from("/work/study.idf"));
    }
}
