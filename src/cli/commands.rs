//! Command implementations for the ar3sto CLI
//!
//! This module contains the command execution logic, console reporting and
//! error context for the CLI interface. Library errors are wrapped with
//! `anyhow` context at this boundary.

use crate::cli::args::{
    Args, Commands, ExportArgs, GenerateArgs, InspectArgs, OutputFormat, SimulateArgs,
};
use crate::config::ToolConfig;
use crate::export::{BatchExporter, ExportStats, write_tables};
use crate::generator::{ConfigurationFiles, generate_idf, generate_mdf};
use crate::models::{Indicator, StudyResult};
use crate::simulator::{self, StudyRun};
use crate::study::StudySpec;
use anyhow::{Context, Result, bail};
use colored::*;
use indicatif::HumanDuration;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Main command runner
pub async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = load_configuration(args.config_file.as_deref())?;

    let command = args
        .command
        .clone()
        .context("No command given; run with --help for usage")?;

    match command {
        Commands::Inspect(inspect) => run_inspect(&inspect).await?,
        Commands::Export(export) => run_export(&export, &config, args.show_progress()).await?,
        Commands::Generate(generate) => run_generate(&generate, &config)?,
        Commands::Simulate(simulate) => run_simulate(&simulate, config).await?,
    }

    info!("Finished in {}", HumanDuration(start_time.elapsed()));
    Ok(())
}

/// Set up logging based on verbosity flags
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ar3sto={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Explicit config file, else the default location when present, else defaults
pub fn load_configuration(config_file: Option<&Path>) -> Result<ToolConfig> {
    if let Some(path) = config_file {
        return ToolConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()));
    }

    match default_config_path().filter(|path| path.exists()) {
        Some(path) => {
            info!("Using config file: {}", path.display());
            ToolConfig::from_file(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        }
        None => {
            info!("No config file found, using defaults");
            Ok(ToolConfig::default())
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ar3sto").join("config.toml"))
}

async fn run_inspect(args: &InspectArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.report)
        .await
        .with_context(|| format!("Failed to read report {}", args.report.display()))?;
    let result = crate::report::parse_report(&text)
        .with_context(|| format!("Failed to parse report {}", args.report.display()))?;

    let selected = match &args.indicator {
        Some(id) => Some(
            result
                .indicator(id)
                .with_context(|| format!("Indicator '{}' not found in report", id))?,
        ),
        None => None,
    };

    match args.output_format {
        OutputFormat::Json => match selected {
            Some(indicator) => {
                let json = serde_json::json!({
                    "indicator": indicator,
                    "series": indicator.series(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            None => println!("{}", serde_json::to_string_pretty(&result.summary())?),
        },
        OutputFormat::Human => {
            print_result(&args.report, &result);
            if let Some(indicator) = selected {
                print_series(indicator);
            }
        }
    }

    Ok(())
}

/// Expand a glob pattern into a sorted list of report files
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut reports = glob::glob(pattern)
        .with_context(|| format!("Invalid pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    reports.sort();
    Ok(reports)
}

async fn run_export(args: &ExportArgs, config: &ToolConfig, show_progress: bool) -> Result<()> {
    args.validate()?;

    let reports = expand_pattern(&args.pattern)?;
    if reports.is_empty() {
        bail!("No report files match '{}'", args.pattern);
    }
    info!("Exporting {} reports to {}", reports.len(), args.output_path.display());

    let format = args.format.unwrap_or(config.export_format);
    let exporter = BatchExporter::new(args.output_path.clone(), format)
        .with_parallelism(args.workers.unwrap_or(config.export_parallelism))
        .with_progress(show_progress);

    let start_time = Instant::now();
    let (exports, stats) = exporter.export_all(reports).await;

    for export in &exports {
        if let Err(e) = &export.outcome {
            eprintln!("{} {}: {}", "✗".red().bold(), export.report.display(), e);
        }
    }
    print_export_stats(&stats, start_time.elapsed());

    if stats.reports_exported == 0 {
        bail!("All {} reports failed to export", stats.reports_failed);
    }
    Ok(())
}

/// Load a study and apply the result file override
fn load_study(path: &Path, result_file: Option<&str>) -> Result<StudySpec> {
    let spec = StudySpec::from_file(path)
        .with_context(|| format!("Failed to load study {}", path.display()))?;
    Ok(match result_file {
        Some(name) => spec.with_result_filename(name),
        None => spec,
    })
}

fn run_generate(args: &GenerateArgs, config: &ToolConfig) -> Result<()> {
    let spec = load_study(&args.study, args.result_file.as_deref())?;

    if args.print {
        print!("{}", generate_idf(&spec));
        print!("{}", generate_mdf(&spec));
        return Ok(());
    }

    let files = match &args.output_path {
        Some(dir) => ConfigurationFiles::in_dir(dir),
        None => config.configuration_files(),
    };
    files
        .write(&spec)
        .context("Failed to write study configuration")?;

    println!(
        "{} {} ({} indicators)",
        "Generated study".bright_green().bold(),
        spec.name.bright_cyan(),
        spec.indicators.len()
    );
    println!("   • IDF: {}", files.idf.display());
    println!("   • MDF: {}", files.mdf.display());
    Ok(())
}

async fn run_simulate(args: &SimulateArgs, config: ToolConfig) -> Result<()> {
    args.validate()?;

    let config = apply_simulate_overrides(config, args);
    config.validate()?;

    let spec = load_study(&args.study, args.result_file.as_deref())?;
    let run = simulator::run_study(&spec, &args.model, &config)
        .await
        .with_context(|| format!("Simulation of study '{}' failed", spec.name))?;

    print_run(&run);
    print_result(&run.result_file, &run.result);

    if let Some(dir) = &args.export_path {
        let written = write_tables(&run.result, dir, config.export_format)
            .with_context(|| format!("Failed to export tables to {}", dir.display()))?;
        println!(
            "{} {} tables to {}",
            "Exported".bright_green().bold(),
            written.len(),
            dir.display()
        );
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
fn apply_simulate_overrides(mut config: ToolConfig, args: &SimulateArgs) -> ToolConfig {
    if let Some(binary) = &args.simulator {
        config = config.with_simulator_binary(binary);
    }
    if let Some(version) = &args.tool_version {
        config = config.with_tool_version(version);
    }
    if let Some(dir) = &args.work_dir {
        config = config.with_work_dir(dir);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_run_timeout(Duration::from_secs(secs));
    }
    config
}

fn print_result(source: &Path, result: &StudyResult) {
    let metadata = result.metadata();
    let mission = result.mission();

    println!("\n{} {}", "Study results:".bright_green().bold(), source.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", "Meta-data:".bold());
    print_field("Main block", metadata.main_block.as_deref());
    print_field("Source file", metadata.source_file.as_deref());
    print_field("Tool version", metadata.tool_version.as_deref());
    print_field("Compiler version", metadata.compiler_version.as_deref());

    println!("{}", "Mission:".bold());
    print_field("Executions", mission.executions.map(|v| v.to_string()).as_deref());
    print_field("Seed", mission.seed.map(|v| v.to_string()).as_deref());
    print_field("Mission time", mission.mission_time.map(|v| v.to_string()).as_deref());
    print_field("Started", mission.started.as_deref());
    print_field("Completed", mission.completed.as_deref());
    if let Some(events) = &mission.event_fired_stats {
        println!(
            "   • Events fired per execution: mean {} (min {}, max {})",
            events.mean, events.min, events.max
        );
    }

    println!("{} {}", "Indicators:".bold(), result.indicators().len());
    for (id, indicator) in result.indicators() {
        let last = indicator
            .series()
            .last()
            .map(|point| format!("mean {} ± {} at {}", point.mean, point.ic95, point.date))
            .unwrap_or_else(|| "no samples".to_string());
        println!(
            "   • {} {} {} points, {}",
            id.bright_cyan(),
            format!("[{}]", indicator.observer()).bright_black(),
            indicator.series().len(),
            last
        );
    }
    println!();
}

fn print_field(label: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("   • {}: {}", label, value),
        None => println!("   • {}: {}", label, "-".bright_black()),
    }
}

fn print_series(indicator: &Indicator) {
    println!("{} {}", "Series of".bold(), indicator.id().bright_cyan());
    println!("{:>12} {:>12} {:>14} {:>14} {:>14}", "date", "sample_size", "mean", "std", "ic95");
    for point in indicator.series() {
        println!(
            "{:>12} {:>12} {:>14} {:>14} {:>14}",
            point.date, point.sample_size, point.mean, point.std, point.ic95
        );
    }
    println!();
}

fn print_run(run: &StudyRun) {
    let elapsed = run
        .outcome
        .elapsed()
        .to_std()
        .unwrap_or(Duration::ZERO);

    println!(
        "{} in {} (exit status {:?})",
        "Simulation complete".bright_green().bold(),
        HumanDuration(elapsed),
        run.outcome.exit_code
    );
    println!("   • IDF: {}", run.idf.display());
    println!("   • MDF: {}", run.mdf.display());
    println!("   • Report: {}", run.result_file.display());
}

fn print_export_stats(stats: &ExportStats, elapsed: Duration) {
    println!("\n{}", "Export complete".bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   • Reports exported: {}", stats.reports_exported);
    println!("   • Tables written: {}", stats.tables_written);
    println!("   • Time: {}", HumanDuration(elapsed));
    if stats.reports_failed > 0 {
        println!(
            "{}",
            format!("   • Reports failed: {}", stats.reports_failed).yellow()
        );
    }
    println!();
}
