//! Tests for layered settings loading

use std::path::PathBuf;

use tempfile::TempDir;

use cribs::application::ApplicationError;
use cribs::config::Settings;
use cribs::util::testing::init_test_setup;

#[test]
fn given_local_config_when_loading_then_named_fields_override_defaults() {
    // Arrange
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cribs.toml");
    std::fs::write(
        &path,
        r#"
school_name = "Hillside Primary"
report_dir = "/srv/reports"
storage_key = "hillside"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(path.as_path())).unwrap();

    // Assert
    assert_eq!(settings.school_name.as_deref(), Some("Hillside Primary"));
    assert_eq!(settings.report_dir, PathBuf::from("/srv/reports"));
    assert_eq!(settings.storage_key, "hillside");
    assert_eq!(settings.export_file_name, "flowchart_data.json");
}

#[test]
fn given_missing_local_config_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();

    let err = Settings::load(Some(temp.path().join("absent.toml").as_path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_malformed_local_config_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    std::fs::write(&path, "school_name = [").unwrap();

    let err = Settings::load(Some(path.as_path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_tilde_dataset_when_loading_then_expanded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cribs.toml");
    std::fs::write(&path, "dataset = \"~/surveys/data.json\"\n").unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();

    let home = std::env::var("HOME").unwrap();
    let dataset = settings.dataset.unwrap();
    assert_eq!(dataset, PathBuf::from(home).join("surveys/data.json"));
}

#[test]
fn given_settings_when_storage_dir_then_under_data_dir() {
    let settings = Settings {
        data_dir: PathBuf::from("/var/lib/cribs"),
        ..Settings::default()
    };
    assert_eq!(settings.storage_dir(), PathBuf::from("/var/lib/cribs/storage"));
}
