//! Tests for the two-phase indicator table extraction

use super::*;
use crate::error::StudyError;
use crate::report::indicators::extract_indicators;
use crate::report::scanner::Delimiter;

fn extract(rows: &[&str]) -> crate::Result<indexmap::IndexMap<String, crate::Indicator>> {
    let text = report(rows);
    let lines: Vec<&str> = text.lines().collect();
    extract_indicators(&lines, Delimiter::Tab)
}

#[test]
fn test_definitions_and_series() {
    let indicators = extract(&complete_report_rows()).unwrap();

    let ids: Vec<&str> = indicators.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["ind1", "ind2"]);

    let ind1 = &indicators["ind1"];
    assert_eq!(ind1.observer(), "obsA");
    assert_eq!(ind1.name(), "ind1");
    assert_eq!(ind1.series().len(), 2);
    assert_close(ind1.series()[1].date, 100.0);
    assert_eq!(ind1.series()[1].sample_size, 1000);
    assert_close(ind1.series()[1].mean, 0.1);
    assert_close(ind1.series()[1].std, 0.3);
    assert_close(ind1.series()[1].ic95, 1.96 * 0.3 / 1000f64.sqrt());

    let ind2 = &indicators["ind2"];
    assert_eq!(ind2.observer(), "obsB");
    assert_eq!(ind2.series().len(), 1);
    assert_close(ind2.series()[0].mean, 2.0);
    assert!(ind2.series()[0].std.is_nan());
    assert!(ind2.series()[0].ic95.is_nan());
}

#[test]
fn test_report_indicators_are_not_categorical() {
    let indicators = extract(&complete_report_rows()).unwrap();

    assert_eq!(indicators["ind1"].value(), "NA");
    assert_eq!(indicators["ind1"].description(), "ind1");
}

#[test]
fn test_undefined_indicator_in_data_phase_is_malformed() {
    let err = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind2",
        "0.0\t100\t5.0\t1.0",
    ])
    .unwrap_err();

    match err {
        StudyError::MalformedReport { line, reason } => {
            assert_eq!(line, 5);
            assert!(reason.contains("ind2"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_switch_row_without_id_is_malformed() {
    let result = extract(&["Indicators", "Name\tObserver", "ind1\tobsA", "", "Indicator"]);

    assert!(matches!(
        result,
        Err(StudyError::MalformedReport { line: 5, .. })
    ));
}

#[test]
fn test_zero_definitions_yield_empty_mapping() {
    let indicators = extract(&["Meta-Data", "Main block\tSystem", "Indicators", "Name\tObserver", ""])
        .unwrap();
    assert!(indicators.is_empty());

    let indicators = extract(&["Meta-Data", "Main block\tSystem", "Indicators"]).unwrap();
    assert!(indicators.is_empty());
}

#[test]
fn test_missing_indicators_section_yields_empty_mapping() {
    let indicators = extract(&["Meta-Data", "Main block\tSystem"]).unwrap();
    assert!(indicators.is_empty());
}

#[test]
fn test_switch_resets_series() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0\t10\t1.0\t0.1",
        "1\t10\t1.0\t0.1",
        "Indicator\tind1",
        "5\t20\t2.0\t0.2",
    ])
    .unwrap();

    let series = indicators["ind1"].series();
    assert_eq!(series.len(), 1);
    assert_close(series[0].date, 5.0);
    assert_eq!(series[0].sample_size, 20);
}

#[test]
fn test_series_preserve_row_order_across_blocks() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "a\tobs1",
        "b\tobs2",
        "",
        "Indicator\tb",
        "3\t1\t0.3",
        "1\t1\t0.1",
        "Indicator\ta",
        "2\t1\t0.2",
    ])
    .unwrap();

    let dates: Vec<f64> = indicators["b"].series().iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![3.0, 1.0]);
    assert_eq!(indicators["a"].series().len(), 1);

    // Definition order, not data order
    let ids: Vec<&str> = indicators.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_missing_trailing_columns_default_to_nan() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0\t100",
        "1\t100\t4.0",
        "2\t100\t4.0\t",
    ])
    .unwrap();

    let series = indicators["ind1"].series();
    assert_eq!(series.len(), 3);
    assert!(series[0].mean.is_nan());
    assert!(series[0].std.is_nan());
    assert_close(series[1].mean, 4.0);
    assert!(series[1].ic95.is_nan());
    assert!(series[2].std.is_nan());
}

#[test]
fn test_zero_sample_size_gives_nan_ic95() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0\t0\t1.0\t0.5",
    ])
    .unwrap();

    let point = indicators["ind1"].series()[0];
    assert_eq!(point.sample_size, 0);
    assert!(point.ic95.is_nan());
}

#[test]
fn test_invalid_sample_size_is_malformed() {
    let result = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0\t1e3\t1.0",
    ]);

    assert!(matches!(
        result,
        Err(StudyError::MalformedReport { line: 6, .. })
    ));
}

#[test]
fn test_missing_sample_size_is_malformed() {
    let result = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0",
    ]);

    assert!(matches!(
        result,
        Err(StudyError::MalformedReport { line: 6, .. })
    ));
}

#[test]
fn test_invalid_mean_is_malformed() {
    let result = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "Indicator\tind1",
        "0\t10\tn/a\t0.1",
    ]);

    assert!(matches!(
        result,
        Err(StudyError::MalformedReport { line: 6, .. })
    ));
}

#[test]
fn test_rows_before_first_switch_are_skipped() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "",
        "0\t10\t1.0\t0.1",
        "-------",
        "Indicator\tind1",
        "Date\tSample size\tMean\tStd",
        "",
        "7\t10\t1.0\t0.1",
    ])
    .unwrap();

    let series = indicators["ind1"].series();
    assert_eq!(series.len(), 1);
    assert_close(series[0].date, 7.0);
}

#[test]
fn test_definitions_end_at_switch_row_without_separator() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "Indicator\tind1",
        "0.0\t100\t5.0\t1.0",
    ])
    .unwrap();

    assert_eq!(indicators.len(), 1);
    assert_eq!(indicators["ind1"].series().len(), 1);
}

#[test]
fn test_defined_indicator_without_data_has_empty_series() {
    let indicators = extract(&[
        "Indicators",
        "Name\tObserver",
        "ind1\tobsA",
        "ind2\tobsB",
        "",
        "Indicator\tind1",
        "0\t1\t1.0\t0.0",
    ])
    .unwrap();

    assert!(indicators["ind2"].series().is_empty());
}

#[test]
fn test_semicolon_indicator_rows() {
    let text = report_with(
        &[
            "Indicators",
            "Name\tObserver",
            "ind1\tobsA",
            "",
            "Indicator\tind1",
            "0.5\t100\t5.0\t1.0",
        ],
        ';',
    );
    let lines: Vec<&str> = text.lines().collect();

    let indicators = extract_indicators(&lines, Delimiter::Semicolon).unwrap();

    let point = indicators["ind1"].series()[0];
    assert_close(point.date, 0.5);
    assert_close(point.ic95, 0.196);
}
