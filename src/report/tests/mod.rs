//! Test utilities and fixtures for report parser testing
//!
//! Reports are built from line slices so each test shows the exact rows it
//! feeds to the parser.

mod indicator_tests;

/// Join report rows with newlines
pub fn report(rows: &[&str]) -> String {
    rows.join("\n")
}

/// Join report rows, replacing tabs with the given delimiter
pub fn report_with(rows: &[&str], delimiter: char) -> String {
    rows.iter()
        .map(|row| row.replace('\t', &delimiter.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Complete tab-separated report with all three sections
pub fn complete_report_rows() -> Vec<&'static str> {
    vec![
        "Meta-Data",
        "Source file\tmodel.alt",
        "Main block\tSystem",
        "Tool version\t1.2.0",
        "Compiler version\t0.9.4",
        "",
        "Mission",
        "Number of executions\t1000",
        "Seed\t1234",
        "Mission time\t8760",
        "Started\t2023-01-01 10:00:00",
        "Completed\t2023-01-01 10:05:00",
        "Number of events fired per execution\t",
        "Mean\tMin\tMax",
        "12.5\t3\t40",
        "",
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "ind2\tobsB",
        "",
        "Indicator\tind1",
        "Date\tSample size\tMean\tStd",
        "0\t1000\t0.0\t0.0",
        "100\t1000\t0.1\t0.3",
        "",
        "Indicator\tind2",
        "Date\tSample size\tMean",
        "0\t500\t2.0",
    ]
}

/// Assert two floats are equal within 1e-9
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
