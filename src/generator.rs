//! Simulator configuration generation.
//!
//! Translates a [`StudySpec`] into the two documents the simulator reads:
//!
//! - **IDF** (indicator definitions): one `calculation` per observer, in
//!   first-seen order, each holding its `indicator` elements and one empty
//!   element per requested statistic.
//! - **MDF** (mission definition): one `simulation` element holding the
//!   `schedule`, with a `range` element only when a schedule step is set.
//!
//! Generation is a pure function of the spec: attribute order is fixed and
//! identical input yields byte-identical output.

use crate::constants::{DEFAULT_SCHEDULE_FROM, IDF_FILENAME, MDF_FILENAME};
use crate::error::Result;
use crate::models::Indicator;
use crate::study::StudySpec;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::info;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "  ";

/// Generate the indicator definition document
pub fn generate_idf(spec: &StudySpec) -> String {
    let mut by_observer: IndexMap<&str, Vec<&Indicator>> = IndexMap::new();
    for indicator in &spec.indicators {
        by_observer
            .entry(indicator.observer())
            .or_default()
            .push(indicator);
    }

    let mut xml = MarkupWriter::new();
    xml.open("indicators-definition", &[]);

    for (observer, indicators) in &by_observer {
        xml.open("calculation", &[("observer", observer.to_string())]);

        for indicator in indicators {
            let mut attributes = vec![("name", indicator.id().to_string())];
            if let Some(measure) = indicator.measure() {
                attributes.push(("type", measure.to_string()));
            }
            attributes.push(("value", indicator.value().to_string()));

            if indicator.stats().is_empty() {
                xml.empty("indicator", &attributes);
                continue;
            }

            xml.open("indicator", &attributes);
            for stat in indicator.stats() {
                xml.empty(stat, &[]);
            }
            xml.close("indicator");
        }

        xml.close("calculation");
    }

    xml.close("indicators-definition");
    xml.finish()
}

/// Generate the mission (simulation and schedule) definition document
pub fn generate_mdf(spec: &StudySpec) -> String {
    let params = &spec.simu_params;

    let mut xml = MarkupWriter::new();
    xml.open("mission-definition", &[]);
    xml.open(
        "simulation",
        &[
            ("seed", params.seed.to_string()),
            ("runs", params.runs.to_string()),
            ("result-file", params.result_filename.clone()),
        ],
    );

    let mut schedule = vec![("name", params.schedule_name.clone())];
    if let Some(unit) = &params.schedule_unit {
        schedule.push(("unit", unit.clone()));
    }
    schedule.push(("mission-time", params.schedule_to.to_string()));

    match params.schedule_step {
        Some(step) => {
            xml.open("schedule", &schedule);
            xml.empty(
                "range",
                &[
                    ("step", step.to_string()),
                    (
                        "from",
                        params
                            .schedule_from
                            .unwrap_or(DEFAULT_SCHEDULE_FROM)
                            .to_string(),
                    ),
                    ("to", params.schedule_to.to_string()),
                ],
            );
            xml.close("schedule");
        }
        None => xml.empty("schedule", &schedule),
    }

    xml.close("simulation");
    xml.close("mission-definition");
    xml.finish()
}

/// Locations of the two generated documents
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationFiles {
    pub idf: PathBuf,
    pub mdf: PathBuf,
}

impl ConfigurationFiles {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            idf: dir.join(IDF_FILENAME),
            mdf: dir.join(MDF_FILENAME),
        }
    }

    /// Generate and write both documents, creating parent directories
    pub fn write(&self, spec: &StudySpec) -> Result<()> {
        for path in [&self.idf, &self.mdf] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.idf, generate_idf(spec))?;
        std::fs::write(&self.mdf, generate_mdf(spec))?;

        info!(
            "Wrote study configuration: {} and {}",
            self.idf.display(),
            self.mdf.display()
        );
        Ok(())
    }

    /// Non-blocking variant of [`write`](Self::write) for async callers
    pub async fn write_async(&self, spec: &StudySpec) -> Result<()> {
        for path in [&self.idf, &self.mdf] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.idf, generate_idf(spec)).await?;
        tokio::fs::write(&self.mdf, generate_mdf(spec)).await?;

        info!(
            "Wrote study configuration: {} and {}",
            self.idf.display(),
            self.mdf.display()
        );
        Ok(())
    }
}

/// Write both documents into `dir` under their default names
pub fn write_configuration(spec: &StudySpec, dir: &Path) -> Result<ConfigurationFiles> {
    let files = ConfigurationFiles::in_dir(dir);
    files.write(spec)?;
    Ok(files)
}

/// Indented XML text builder
struct MarkupWriter {
    buffer: String,
    depth: usize,
}

impl MarkupWriter {
    fn new() -> Self {
        let mut buffer = String::from(XML_DECLARATION);
        buffer.push('\n');
        Self { buffer, depth: 0 }
    }

    fn open(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.start_tag(name, attributes);
        self.buffer.push_str(">\n");
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.start_tag(name, attributes);
        self.buffer.push_str("/>\n");
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.buffer.push_str("</");
        self.buffer.push_str(name);
        self.buffer.push_str(">\n");
    }

    fn start_tag(&mut self, name: &str, attributes: &[(&str, String)]) {
        self.indent();
        self.buffer.push('<');
        self.buffer.push_str(name);
        for (key, value) in attributes {
            self.buffer.push(' ');
            self.buffer.push_str(key);
            self.buffer.push_str("=\"");
            self.buffer.push_str(&escape_attribute(value));
            self.buffer.push('"');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(INDENT);
        }
    }

    fn finish(self) -> String {
        self.buffer
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
