//! Tests for JSON import/export

use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use cribs::application::services::interchange::{BUNDLED_DATASET, DEFAULT_EXPORT_FILE_NAME};
use cribs::application::services::{
    bundled_dataset, export_to_json_string, import_from_json_string, parse_flowchart_json,
    InterchangeService,
};
use cribs::application::{ApplicationError, FlowchartStore, ImportError};
use cribs::domain::integrity;
use cribs::infrastructure::traits::RealFileSystem;
use cribs::util::testing::init_test_setup;

fn service() -> InterchangeService {
    InterchangeService::new(Arc::new(RealFileSystem), DEFAULT_EXPORT_FILE_NAME)
}

const MINIMAL: &str = r#"{
  "water-supply": [
    {"id": "q1", "text": "Piped water?", "next": {"yes": "q2", "no": "end"}},
    {"id": "q2", "text": "Interrupted?", "next": {"yes": "rec_x1"}}
  ],
  "recommendations": {"rec_x1": {"text": "Install tank"}}
}"#;

// ============================================================
// export / import round-trip
// ============================================================

#[test]
fn given_bundled_dataset_when_round_tripped_then_equal() {
    init_test_setup();
    let data = bundled_dataset().unwrap();

    let json = export_to_json_string(&data).unwrap();
    let back = import_from_json_string(&json).unwrap();

    assert_eq!(back, data);
}

#[test]
fn given_data_when_exported_then_two_space_indent_and_key_order_kept() {
    let data = parse_flowchart_json(MINIMAL).unwrap();

    let json = export_to_json_string(&data).unwrap();

    assert!(json.starts_with("{\n  \"water-supply\": [\n    {"));
    let water = json.find("\"water-supply\"").unwrap();
    let recs = json.find("\"recommendations\"").unwrap();
    assert!(water < recs);
    let yes = json.find("\"yes\"").unwrap();
    let no = json.find("\"no\"").unwrap();
    assert!(yes < no, "answers keep authored order");
}

#[test]
fn given_unknown_fields_when_round_tripped_then_preserved() {
    let text = r#"{
      "heat": [{"id": "h1", "text": "Hot?", "next": {"yes": "end"}, "image": "h1.png"}],
      "recommendations": {"rec_a": {"text": "Shade", "priority": 2}}
    }"#;

    let data = parse_flowchart_json(text).unwrap();
    let back: serde_json::Value =
        serde_json::from_str(&export_to_json_string(&data).unwrap()).unwrap();

    assert_eq!(back["heat"][0]["image"], "h1.png");
    assert_eq!(back["recommendations"]["rec_a"]["priority"], 2);
}

#[test]
fn given_node_without_next_when_imported_then_empty_mapping() {
    let text = r#"{"c": [{"id": "n1", "text": "Only"}], "recommendations": {}}"#;

    let data = parse_flowchart_json(text).unwrap();

    assert!(data.find_node("c", "n1").unwrap().next.is_empty());
}

// ============================================================
// import rejections
// ============================================================

#[rstest]
#[case::not_json("{not json", "Parse")]
#[case::array("[1, 2]", "NotAnObject")]
#[case::string("\"flowchart\"", "NotAnObject")]
#[case::no_categories(r#"{"recommendations": {}}"#, "MissingCategories")]
#[case::category_not_array(r#"{"c": {}, "recommendations": {}}"#, "MissingCategories")]
#[case::no_recommendations(r#"{"c": []}"#, "MissingRecommendations")]
#[case::recommendations_array(r#"{"c": [], "recommendations": []}"#, "MissingRecommendations")]
#[case::bad_node(r#"{"c": [{"text": "no id"}], "recommendations": {}}"#, "Schema")]
#[case::stray_scalar(r#"{"c": [], "version": 2, "recommendations": {}}"#, "Schema")]
fn given_invalid_text_when_parse_flowchart_json_then_rejected(
    #[case] text: &str,
    #[case] expected: &str,
) {
    init_test_setup();
    let err = parse_flowchart_json(text).unwrap_err();

    let kind = match err {
        ImportError::Parse(_) => "Parse",
        ImportError::NotAnObject => "NotAnObject",
        ImportError::MissingCategories => "MissingCategories",
        ImportError::MissingRecommendations => "MissingRecommendations",
        ImportError::Schema(_) => "Schema",
    };
    assert_eq!(kind, expected);
    assert!(import_from_json_string(text).is_none());
}

#[test]
fn given_invalid_text_when_import_flowchart_then_false_and_store_unchanged() {
    init_test_setup();
    let mut store = FlowchartStore::new(parse_flowchart_json(MINIMAL).unwrap());
    let before = store.snapshot();

    let imported = service().import_flowchart(&mut store, r#"{"recommendations": {}}"#);

    assert!(!imported);
    assert_eq!(store.data(), &before);
}

#[test]
fn given_valid_text_when_import_flowchart_then_store_replaced() {
    let mut store = FlowchartStore::new(bundled_dataset().unwrap());

    let imported = service().import_flowchart(&mut store, MINIMAL);

    assert!(imported);
    assert_eq!(store.data().category_names().collect::<Vec<_>>(), vec!["water-supply"]);
    assert_eq!(store.data().recommendations.len(), 1);
}

// ============================================================
// files
// ============================================================

#[test]
fn given_directory_when_export_flowchart_then_writes_named_file() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = FlowchartStore::new(parse_flowchart_json(MINIMAL).unwrap());

    // Act
    let json = service().export_flowchart(&store, temp.path()).unwrap();

    // Assert
    let path = temp.path().join("flowchart_data.json");
    assert!(path.exists());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), json);
}

#[test]
fn given_missing_directory_when_export_then_created() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("out");
    let data = parse_flowchart_json(MINIMAL).unwrap();

    service().export_to_json_file(&data, &dir).unwrap();

    assert!(dir.join(DEFAULT_EXPORT_FILE_NAME).exists());
}

#[test]
fn given_exported_file_when_import_file_then_same_data() {
    let temp = TempDir::new().unwrap();
    let data = bundled_dataset().unwrap();
    let svc = service();
    svc.export_to_json_file(&data, temp.path()).unwrap();

    let back = svc.import_file(&svc.export_path(temp.path())).unwrap();

    assert_eq!(back, data);
}

#[test]
fn given_missing_file_when_import_file_then_operation_failed() {
    let temp = TempDir::new().unwrap();

    let err = service()
        .import_file(&temp.path().join("missing.json"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
}

#[test]
fn given_no_dataset_path_when_load_dataset_then_bundled() {
    let data = service().load_dataset(None).unwrap();
    assert_eq!(data, parse_flowchart_json(BUNDLED_DATASET).unwrap());
}

#[test]
fn given_dataset_path_when_load_dataset_then_file_used() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.json");
    std::fs::write(&path, MINIMAL).unwrap();

    let data = service().load_dataset(Some(path.as_path())).unwrap();

    assert_eq!(data.node_count(), 2);
}

// ============================================================
// bundled dataset
// ============================================================

#[test]
fn given_bundled_dataset_when_checked_then_clean() {
    let data = bundled_dataset().unwrap();

    let report = integrity::check(&data);

    assert!(report.is_clean(), "{:?}", report);
    assert!(data.has_category("water-supply"));
}
