//! End-to-end tests of CLI commands against in-memory storage

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use cribs::application::services::bundled_dataset;
use cribs::cli::args::{parse_branch, CategoryCommands, Commands, NodeCommands, RecCommands};
use cribs::cli::{execute_with, CliError};
use cribs::config::Settings;
use cribs::domain::NextRef;
use cribs::infrastructure::di::ServiceContainer;
use cribs::infrastructure::traits::{
    FixedClock, InMemoryKeyValueStore, RealFileSystem, ScriptedSelector,
};
use cribs::util::testing::init_test_setup;

struct Harness {
    container: ServiceContainer,
    temp: TempDir,
}

impl Harness {
    fn run(&self, command: Commands) -> Result<(), CliError> {
        execute_with(&command, &self.container)
    }

    fn saved(&self) -> Option<cribs::domain::FlowchartData> {
        self.container.persistence().try_load().unwrap()
    }

    fn dir(&self) -> PathBuf {
        self.temp.path().to_path_buf()
    }
}

#[fixture]
fn harness() -> Harness {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        data_dir: temp.path().join("data"),
        report_dir: temp.path().join("reports"),
        school_name: Some("Hillside Primary".into()),
        ..Settings::default()
    };
    let container = ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        Arc::new(InMemoryKeyValueStore::new()),
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 7, 9, 30, 15).unwrap())),
        Arc::new(ScriptedSelector::new(["yes", "no"])),
    );
    Harness { container, temp }
}

#[rstest]
fn given_fresh_storage_when_listing_then_nothing_saved(harness: Harness) {
    harness.run(Commands::Categories).unwrap();
    harness
        .run(Commands::Node {
            command: NodeCommands::Tree {
                category: "water-supply".into(),
            },
        })
        .unwrap();

    assert!(harness.saved().is_none());
}

#[rstest]
fn given_category_add_when_run_then_saved_copy_has_category(harness: Harness) {
    harness
        .run(Commands::Category {
            command: CategoryCommands::Add {
                name: "noise-levels".into(),
            },
        })
        .unwrap();

    let saved = harness.saved().unwrap();
    assert!(saved.has_category("noise-levels"));
    assert!(saved.has_category("water-supply"));
}

#[rstest]
fn given_existing_category_when_added_again_then_invalid_args(harness: Harness) {
    let err = harness
        .run(Commands::Category {
            command: CategoryCommands::Add {
                name: "water-supply".into(),
            },
        })
        .unwrap_err();

    assert!(matches!(err, CliError::InvalidArgs(_)));
    assert!(harness.saved().is_none());
}

#[rstest]
fn given_node_add_then_update_when_run_then_changes_accumulate(harness: Harness) {
    // Arrange
    harness
        .run(Commands::Node {
            command: NodeCommands::Add {
                category: "heat-impacts".into(),
                id: Some("hi4".into()),
                text: "Are fans available?".into(),
                next: vec![parse_branch("yes=end").unwrap()],
            },
        })
        .unwrap();

    // Act
    harness
        .run(Commands::Node {
            command: NodeCommands::Update {
                category: "heat-impacts".into(),
                id: "hi4".into(),
                text: None,
                next: vec![parse_branch("no=rec_hi_shade,end").unwrap()],
                remove_answer: vec!["yes".into()],
            },
        })
        .unwrap();

    // Assert
    let saved = harness.saved().unwrap();
    let node = saved.find_node("heat-impacts", "hi4").unwrap();
    assert_eq!(node.text, "Are fans available?");
    assert_eq!(node.answers().collect::<Vec<_>>(), vec!["no"]);
    assert_eq!(
        node.next["no"],
        NextRef::Many(vec!["rec_hi_shade".into(), "end".into()])
    );
}

#[rstest]
#[case::reserved_end("end")]
#[case::recommendation_prefix("rec_q")]
fn given_reserved_node_id_when_node_add_then_rejected(harness: Harness, #[case] id: &str) {
    let err = harness
        .run(Commands::Node {
            command: NodeCommands::Add {
                category: "heat-impacts".into(),
                id: Some(id.into()),
                text: "?".into(),
                next: Vec::new(),
            },
        })
        .unwrap_err();

    assert_eq!(err.exit_code(), cribs::exitcode::DATAERR);
}

#[rstest]
fn given_missing_node_when_deleted_then_not_found(harness: Harness) {
    let err = harness
        .run(Commands::Node {
            command: NodeCommands::Delete {
                category: "water-supply".into(),
                id: "ws9".into(),
            },
        })
        .unwrap_err();

    assert!(matches!(err, CliError::NotFound(_)));
    assert_eq!(err.exit_code(), cribs::exitcode::NOINPUT);
}

#[rstest]
fn given_rec_delete_when_run_then_references_repaired_in_saved_copy(harness: Harness) {
    harness
        .run(Commands::Rec {
            command: RecCommands::Delete {
                id: "rec_ws_storage".into(),
            },
        })
        .unwrap();

    let saved = harness.saved().unwrap();
    assert!(saved.recommendation("rec_ws_storage").is_none());
    assert_eq!(
        saved.find_node("water-supply", "ws1").unwrap().next["no"],
        NextRef::end()
    );
    assert_eq!(
        saved.find_node("water-supply", "ws2").unwrap().next["yes"],
        NextRef::Many(vec!["ws3".into()])
    );
}

#[rstest]
fn given_rec_add_without_id_when_run_then_id_derived_from_text(harness: Harness) {
    harness
        .run(Commands::Rec {
            command: RecCommands::Add {
                id: None,
                text: "Paint roofs white".into(),
                icon: Some("🎨".into()),
            },
        })
        .unwrap();

    let saved = harness.saved().unwrap();
    let entry = saved.recommendation("rec_paint_roofs_white").unwrap();
    assert_eq!(entry.icon.as_deref(), Some("🎨"));
}

#[rstest]
fn given_step_when_run_then_succeeds_without_saving(harness: Harness) {
    harness
        .run(Commands::Step {
            category: "water-supply".into(),
            node: "ws1".into(),
            answer: "yes".into(),
            json: true,
        })
        .unwrap();

    let err = harness
        .run(Commands::Step {
            category: "water-supply".into(),
            node: "ws1".into(),
            answer: "maybe".into(),
            json: false,
        })
        .unwrap_err();
    assert!(matches!(err, CliError::NotFound(_)));
    assert!(harness.saved().is_none());
}

#[rstest]
fn given_scripted_answers_when_survey_with_report_then_report_written(harness: Harness) {
    // heat-impacts: hi1 yes -> hi2, hi2 no -> ventilation, hi3 no -> shade
    harness
        .run(Commands::Survey {
            category: "heat-impacts".into(),
            answers: Some(vec!["yes".into(), "no".into(), "no".into()]),
            school: None,
            report: true,
            report_dir: None,
        })
        .unwrap();

    let path = harness
        .dir()
        .join("reports")
        .join("CRIBS_heat_2026-03-07T09-30-15.txt");
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("School: Hillside Primary"));
    assert!(text.contains("Assessment Category: Heat Impacts"));
    assert!(text.contains("1. 🪟"));
    assert!(text.contains("2. 🌳"));
}

#[rstest]
fn given_container_selector_when_survey_then_answers_taken_from_it(harness: Harness) {
    // air-quality: aq1 yes -> cookstove, then aq2 no -> end
    harness
        .run(Commands::Survey {
            category: "air-quality".into(),
            answers: None,
            school: Some("Riverside".into()),
            report: true,
            report_dir: Some(harness.dir()),
        })
        .unwrap();

    let text =
        std::fs::read_to_string(harness.dir().join("CRIBS_air_2026-03-07T09-30-15.txt")).unwrap();
    assert!(text.contains("School: Riverside"));
    assert!(text.contains("Move cooking away from classrooms"));
}

#[rstest]
fn given_export_then_import_when_run_then_saved_copy_matches_file(harness: Harness) {
    harness
        .run(Commands::Export {
            dir: Some(harness.dir()),
            stdout: false,
        })
        .unwrap();
    let file = harness.dir().join("flowchart_data.json");
    assert!(file.exists());

    harness.run(Commands::Import { file }).unwrap();

    assert_eq!(harness.saved().unwrap(), bundled_dataset().unwrap());
}

#[rstest]
fn given_invalid_import_file_when_run_then_data_error_and_nothing_saved(harness: Harness) {
    let file = harness.dir().join("bad.json");
    std::fs::write(&file, r#"{"recommendations": {}}"#).unwrap();

    let err = harness.run(Commands::Import { file }).unwrap_err();

    assert_eq!(err.exit_code(), cribs::exitcode::DATAERR);
    assert!(harness.saved().is_none());
}

#[rstest]
fn given_saved_copy_when_reset_then_cleared(harness: Harness) {
    harness
        .run(Commands::Category {
            command: CategoryCommands::Delete {
                name: "air-quality".into(),
            },
        })
        .unwrap();
    assert!(harness.saved().is_some());

    harness.run(Commands::Reset).unwrap();

    assert!(harness.saved().is_none());
}

#[rstest]
fn given_bundled_dataset_when_check_then_ok(harness: Harness) {
    harness.run(Commands::Check).unwrap();
}

#[rstest]
fn given_dangling_reference_when_check_then_integrity_error(harness: Harness) {
    harness
        .run(Commands::Node {
            command: NodeCommands::Update {
                category: "flood-management".into(),
                id: "fm1".into(),
                text: None,
                next: vec![parse_branch("yes=fm9").unwrap()],
                remove_answer: Vec::new(),
            },
        })
        .unwrap();

    let err = harness.run(Commands::Check).unwrap_err();

    assert!(matches!(err, CliError::Integrity(_)));
}
