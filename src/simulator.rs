//! Simulator discovery and invocation.
//!
//! The simulator is an external executable. [`resolve`] locates it,
//! [`run`] executes it once under a timeout and captures its output, and
//! [`run_study`] chains generation, execution and report parsing for one
//! study.
//!
//! Discovery order:
//! 1. the explicit `simulator_binary` override;
//! 2. `<install_root>/<version>/bin/<binary_name>`;
//! 3. any `<binary_name>` file below the install root;
//! 4. the `PATH` entries.

use crate::config::ToolConfig;
use crate::error::{Result, StudyError};
use crate::models::StudyResult;
use crate::report::parse_report;
use crate::study::StudySpec;
use chrono::{DateTime, Utc};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Captured result of one simulator execution
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished - self.started
    }
}

/// Everything produced by [`run_study`]
#[derive(Debug)]
pub struct StudyRun {
    pub idf: PathBuf,
    pub mdf: PathBuf,
    pub result_file: PathBuf,
    pub outcome: RunOutcome,
    pub result: StudyResult,
}

/// Locate the simulator executable
///
/// `version` takes precedence over the configured tool version.
pub fn resolve(config: &ToolConfig, version: Option<&str>) -> Result<PathBuf> {
    if let Some(binary) = &config.simulator_binary {
        if binary.is_file() {
            debug!("Using configured simulator binary: {}", binary.display());
            return Ok(binary.clone());
        }
        return Err(StudyError::ToolNotFound {
            reason: format!("configured binary {} does not exist", binary.display()),
        });
    }

    let version = version.or(config.tool_version.as_deref());
    let install_root = config.resolved_install_root();

    if let Some(root) = &install_root {
        if let Some(version) = version {
            let candidate = root.join(version).join("bin").join(&config.binary_name);
            if candidate.is_file() {
                debug!("Found simulator for version {}: {}", version, candidate.display());
                return Ok(candidate);
            }
        }

        if let Some(found) = search_install_root(root, &config.binary_name, version) {
            debug!("Found simulator under install root: {}", found.display());
            return Ok(found);
        }
    }

    if let Some(found) = search_path(&config.binary_name, std::env::var_os("PATH")) {
        debug!("Found simulator on PATH: {}", found.display());
        return Ok(found);
    }

    Err(StudyError::ToolNotFound {
        reason: match (version, install_root) {
            (Some(version), Some(root)) => format!(
                "no '{}' for version {} under {} or on PATH",
                config.binary_name,
                version,
                root.display()
            ),
            (None, Some(root)) => format!(
                "no '{}' under {} or on PATH",
                config.binary_name,
                root.display()
            ),
            (_, None) => format!("no '{}' on PATH", config.binary_name),
        },
    })
}

/// First matching file below `root`; restricted to a version directory when given
fn search_install_root(root: &Path, binary_name: &str, version: Option<&str>) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == binary_name)
        .map(|entry| entry.into_path())
        .find(|path| match version {
            Some(version) => path
                .strip_prefix(root)
                .map(|relative| relative.starts_with(version))
                .unwrap_or(false),
            None => true,
        })
}

fn search_path(binary_name: &str, path_var: Option<OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary_name))
        .find(|candidate| candidate.is_file())
}

/// Execute `binary` with `args` in `cwd`, killing it when `timeout` elapses
pub async fn run(binary: &Path, args: &[OsString], cwd: &Path, timeout: Duration) -> Result<RunOutcome> {
    info!("Running {} {:?}", binary.display(), args);

    let mut command = Command::new(binary);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let started = Utc::now();
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(StudyError::simulator(format!(
                "failed to start {}: {}",
                binary.display(),
                e
            )));
        }
        Err(_) => {
            return Err(StudyError::simulator(format!(
                "{} did not finish within {}s",
                binary.display(),
                timeout.as_secs_f64()
            )));
        }
    };
    let finished = Utc::now();

    let outcome = RunOutcome {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        started,
        finished,
    };

    if outcome.success() {
        debug!("Simulator finished in {}ms", outcome.elapsed().num_milliseconds());
    } else {
        warn!("Simulator exited with status {:?}", outcome.exit_code);
    }
    Ok(outcome)
}

/// Generate the study documents, run the simulator on `model` and parse its report
///
/// The simulator is called as `<binary> <model> <idf> <mdf>` from the
/// configured work dir, and must write the study's result file there.
/// Every path handed to it is absolute, so relative work dirs and models
/// resolve against the caller's directory.
pub async fn run_study(spec: &StudySpec, model: &Path, config: &ToolConfig) -> Result<StudyRun> {
    let binary = resolve(config, None)?;

    tokio::fs::create_dir_all(&config.work_dir).await?;
    let work_dir = std::path::absolute(&config.work_dir)?;
    let model = std::path::absolute(model)?;
    let config = config.clone().with_work_dir(&work_dir);

    let files = config.configuration_files();
    files.write_async(spec).await?;

    let args = vec![
        model.into_os_string(),
        files.idf.as_os_str().to_owned(),
        files.mdf.as_os_str().to_owned(),
    ];
    let outcome = run(&binary, &args, &work_dir, config.run_timeout()).await?;

    if !outcome.success() {
        return Err(StudyError::simulator(format!(
            "exit status {:?}: {}",
            outcome.exit_code,
            outcome.stderr.trim()
        )));
    }

    let result_file = work_dir.join(&spec.simu_params.result_filename);
    let text = tokio::fs::read_to_string(&result_file).await.map_err(|e| {
        StudyError::simulator(format!(
            "result file {} not readable: {}",
            result_file.display(),
            e
        ))
    })?;
    let result = parse_report(&text)?;

    Ok(StudyRun {
        idf: files.idf,
        mdf: files.mdf,
        result_file,
        outcome,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndicatorDef;
    use crate::study::SimulationParams;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn isolated_config(root: &Path) -> ToolConfig {
        let mut config = ToolConfig::default().with_install_root(root);
        config.binary_name = "ar3sim-test-only-binary".to_string();
        config
    }

    #[test]
    fn test_resolve_explicit_override() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("custom-sim");
        touch(&binary);

        let config = ToolConfig::default().with_simulator_binary(&binary);
        assert_eq!(resolve(&config, Some("9.9")).unwrap(), binary);
    }

    #[test]
    fn test_resolve_missing_override_is_not_found() {
        let config = ToolConfig::default().with_simulator_binary("/nonexistent/ar3sim");
        assert!(matches!(
            resolve(&config, None),
            Err(StudyError::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_versioned_layout() {
        let root = TempDir::new().unwrap();
        let config = isolated_config(root.path());
        let v1 = root.path().join("1.0/bin/ar3sim-test-only-binary");
        let v2 = root.path().join("2.0/bin/ar3sim-test-only-binary");
        touch(&v1);
        touch(&v2);

        assert_eq!(resolve(&config, Some("2.0")).unwrap(), v2);
        assert_eq!(
            resolve(&config.clone().with_tool_version("1.0"), None).unwrap(),
            v1
        );
        // Explicit version wins over the configured one
        assert_eq!(
            resolve(&config.with_tool_version("1.0"), Some("2.0")).unwrap(),
            v2
        );
    }

    #[test]
    fn test_resolve_searches_install_root() {
        let root = TempDir::new().unwrap();
        let config = isolated_config(root.path());
        let nested = root.path().join("1.0/libexec/ar3sim-test-only-binary");
        touch(&nested);

        assert_eq!(resolve(&config, None).unwrap(), nested);
        assert_eq!(resolve(&config, Some("1.0")).unwrap(), nested);
        assert!(matches!(
            resolve(&config, Some("3.0")),
            Err(StudyError::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_search_path_entries() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let binary = second.path().join("ar3sim-test-only-binary");
        touch(&binary);

        let path_var = std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            search_path("ar3sim-test-only-binary", Some(path_var)),
            Some(binary)
        );
        assert_eq!(search_path("ar3sim-test-only-binary", None), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_output_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let args: Vec<OsString> = vec![
            "-c".into(),
            "echo out; echo err >&2; pwd; exit 3".into(),
        ];

        let outcome = run(Path::new("/bin/sh"), &args, dir.path(), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success());
        assert!(outcome.stdout.starts_with("out\n"));
        assert_eq!(outcome.stderr, "err\n");
        assert!(outcome.finished >= outcome.started);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out() {
        let dir = TempDir::new().unwrap();
        let args: Vec<OsString> = vec!["-c".into(), "sleep 5".into()];

        let err = run(Path::new("/bin/sh"), &args, dir.path(), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::Simulator { .. }));
    }

    #[tokio::test]
    async fn test_run_missing_binary_fails() {
        let dir = TempDir::new().unwrap();
        let err = run(
            Path::new("/nonexistent/ar3sim"),
            &[],
            dir.path(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StudyError::Simulator { .. }));
    }

    /// `/bin/sh` stands in for the simulator; the "model" is a script that
    /// checks its arguments and writes a report
    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_study_end_to_end() {
        let work = TempDir::new().unwrap();
        let model = work.path().join("fake_model.sh");
        std::fs::write(
            &model,
            "test -f \"$1\" || exit 7\n\
             test -f \"$2\" || exit 8\n\
             printf 'Meta-Data\\nMain block\\tSystem\\nMission\\nSeed\\t42\\n\\n\
             Indicators\\nName\\tObserver\\nup\\tpump\\n\\nIndicator\\tup\\n0\\t10\\t0.5\\t0.1\\n' > out.csv\n",
        )
        .unwrap();

        let spec = StudySpec::new("pumps", SimulationParams::new(100.0))
            .with_result_filename("out.csv")
            .with_indicator(IndicatorDef {
                id: Some("up".to_string()),
                observer: Some("pump".to_string()),
                ..Default::default()
            })
            .unwrap();
        let config = ToolConfig::default()
            .with_simulator_binary("/bin/sh")
            .with_work_dir(work.path());

        let run = run_study(&spec, &model, &config).await.unwrap();

        assert!(run.outcome.success());
        assert!(run.idf.exists());
        assert!(run.mdf.exists());
        assert_eq!(run.result.mission().seed, Some(42));
        assert_eq!(run.result.indicator("up").unwrap().series().len(), 1);
        assert_eq!(run.result.indicator("up").unwrap().block(), Some("System"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_study_with_relative_paths() {
        // Relative to the test's working directory
        let scratch = TempDir::new_in(".").unwrap();
        assert!(scratch.path().is_relative());
        let model = scratch.path().join("model.sh");
        let work_dir = scratch.path().join("work");
        std::fs::write(
            &model,
            "test -f \"$1\" || exit 7\n\
             test -f \"$2\" || exit 8\n\
             printf 'Meta-Data\\nMain block\\tSystem\\nMission\\nSeed\\t7\\n' > result.csv\n",
        )
        .unwrap();

        let spec = StudySpec::new("relative", SimulationParams::new(10.0));
        let config = ToolConfig::default()
            .with_simulator_binary("/bin/sh")
            .with_work_dir(&work_dir);

        let run = run_study(&spec, &model, &config).await.unwrap();

        assert!(run.outcome.success(), "stderr: {}", run.outcome.stderr);
        assert!(run.idf.is_absolute());
        assert!(run.idf.exists());
        assert!(work_dir.join("study.idf").exists());
        assert!(work_dir.join("result.csv").exists());
        assert_eq!(run.result.mission().seed, Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_study_reports_simulator_failure() {
        let work = TempDir::new().unwrap();
        let model = work.path().join("failing.sh");
        std::fs::write(&model, "echo 'model error' >&2\nexit 2\n").unwrap();

        let spec = StudySpec::new("s", SimulationParams::new(1.0));
        let config = ToolConfig::default()
            .with_simulator_binary("/bin/sh")
            .with_work_dir(work.path());

        match run_study(&spec, &model, &config).await.unwrap_err() {
            StudyError::Simulator { reason } => assert!(reason.contains("model error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
