//! Tests for report building, naming and saving

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rstest::rstest;
use tempfile::TempDir;

use cribs::application::services::report::{
    build_report, format_report_date, report_filename, report_timestamp, ReportBody, ReportItem,
    ALL_CLEAR_MESSAGE, FOOTER_LINES, REPORT_HEADING, REPORT_TITLE,
};
use cribs::application::services::{ReportRenderer, ReportService, TextReportRenderer};
use cribs::domain::catalog::{category_label, category_short_code};
use cribs::infrastructure::traits::{FixedClock, RealFileSystem};
use cribs::util::testing::init_test_setup;

fn items() -> Vec<ReportItem> {
    vec![
        ReportItem {
            icon: Some("🛢️".into()),
            text: "Install a water storage tank.".into(),
        },
        ReportItem {
            icon: None,
            text: "Raise walkways.".into(),
        },
    ]
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
}

// ============================================================
// document
// ============================================================

#[test]
fn given_items_when_build_report_then_numbered_rows_with_icons() {
    init_test_setup();
    let doc = build_report(&items(), "water-supply", Some("Hillside Primary"), date());

    assert_eq!(doc.title, REPORT_TITLE);
    assert_eq!(doc.school_line.as_deref(), Some("School: Hillside Primary"));
    assert_eq!(doc.category_line, "Assessment Category: Water Supply Issues");
    assert_eq!(doc.date_line, "Date: Mar 7, 2026");
    assert_eq!(doc.heading, REPORT_HEADING);
    match doc.body {
        ReportBody::Recommendations(rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].marker, "1. 🛢️");
            assert_eq!(rows[0].text, "Install a water storage tank.");
            assert_eq!(rows[1].marker, "2. ");
        }
        other => panic!("expected rows, got {:?}", other),
    }
    assert_eq!(doc.footer, FOOTER_LINES.map(str::to_string));
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(""))]
fn given_no_school_name_when_build_report_then_school_line_omitted(#[case] school: Option<&str>) {
    let doc = build_report(&items(), "water-supply", school, date());
    assert!(doc.school_line.is_none());
}

#[test]
fn given_no_items_when_build_report_then_all_clear() {
    let doc = build_report(&[], "heat-impacts", None, date());
    assert_eq!(doc.body, ReportBody::AllClear(ALL_CLEAR_MESSAGE.to_string()));
}

#[test]
fn given_unknown_category_when_build_report_then_key_used_as_label() {
    let doc = build_report(&[], "noise-levels", None, date());
    assert_eq!(doc.category_line, "Assessment Category: noise-levels");
}

#[rstest]
#[case("water-supply", "Water Supply Issues", "water")]
#[case("water-demand", "Water Demand Issues", "demand")]
#[case("dust-impacts", "Airborne Dust Impacts", "dust")]
#[case("heat-impacts", "Heat Impacts", "heat")]
#[case("rainwater-entry", "Rainwater Entry", "rain")]
#[case("flood-management", "Flood Management", "flood")]
#[case("wildfire-impacts", "Wildfire Impacts", "fire")]
#[case("electricity-supply", "Electricity Supply", "elec")]
#[case("air-quality", "Air Quality", "air")]
#[case("custom", "custom", "custom")]
fn given_category_key_when_looked_up_then_label_and_short_code(
    #[case] key: &str,
    #[case] label: &str,
    #[case] short: &str,
) {
    assert_eq!(category_label(key), label);
    assert_eq!(category_short_code(key), short);
}

#[test]
fn given_two_digit_day_when_formatting_date_then_no_padding_issue() {
    let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    assert_eq!(format_report_date(date), "Oct 17, 2026");
}

// ============================================================
// naming
// ============================================================

#[test]
fn given_instant_when_report_timestamp_then_dashes_and_19_chars() {
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 4, 19, 0).unwrap();
    assert_eq!(report_timestamp(now), "2026-10-17T04-19-00");
}

#[test]
fn given_category_when_report_filename_then_short_code_and_extension() {
    let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(
        report_filename("flood-management", now, "pdf"),
        "CRIBS_flood_2026-01-02T03-04-05.pdf"
    );
}

// ============================================================
// saving
// ============================================================

#[test]
fn given_report_service_when_save_then_text_file_with_document() {
    // Arrange
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 7, 9, 30, 15).unwrap();
    let service = ReportService::new(
        Arc::new(RealFileSystem),
        Arc::new(FixedClock(now)),
        Arc::new(TextReportRenderer),
    );

    // Act
    let path = service
        .save(&items(), "water-supply", Some("Hillside Primary"), temp.path())
        .unwrap();

    // Assert
    assert_eq!(path, temp.path().join("CRIBS_water_2026-03-07T09-30-15.txt"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(REPORT_TITLE));
    assert!(text.contains("School: Hillside Primary"));
    assert!(text.contains("Date: Mar 7, 2026"));
    assert!(text.contains("1. 🛢️  Install a water storage tank."));
    assert!(text.contains("2.  Raise walkways."));
    assert!(text.contains(FOOTER_LINES[1]));
}

#[test]
fn given_text_renderer_when_all_clear_then_message_rendered() {
    let doc = build_report(&[], "air-quality", None, date());

    let bytes = TextReportRenderer.render(&doc).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains(ALL_CLEAR_MESSAGE));
    assert!(!text.contains("School:"));
    assert_eq!(TextReportRenderer.extension(), "txt");
}
