//! End-to-end pipeline: fields -> program -> preview / dry-run streaming

use engravekit::cli::LinkArgs;
use engravekit::{commands, Config, SessionStatus};
use std::fs;

fn dry_run() -> LinkArgs {
    LinkArgs {
        port: None,
        dry_run: true,
    }
}

#[test]
fn test_generate_then_preview() {
    let dir = tempfile::tempdir().unwrap();
    let fields = dir.path().join("fields.json");
    fs::write(&fields, r#"{"name": "Ada", "fax": null, "phone": "555"}"#).unwrap();

    let config = Config::default();
    let program_path = dir.path().join("card.nc");
    let program = commands::generate(&config, &fields, &program_path).unwrap();

    let text = fs::read_to_string(&program_path).unwrap();
    assert_eq!(text.lines().count(), program.len());
    assert!(text.starts_with("G21\nG90\nM3 S8000\n"));
    assert!(text.ends_with("G0 Z4\nG0 X0 Y0\nM5"));

    let image_path = dir.path().join("card.png");
    let written = commands::preview(&config, &program_path, &image_path).unwrap();
    assert!(written.canonical.exists());
    assert!(written.mirrored.exists());
}

#[test]
fn test_explicit_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[engraving]\nspindle_speed = 12000\n").unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.engraving.spindle_speed, 12000);
    assert!(commands::load_config(Some(&dir.path().join("absent.toml"))).is_err());
}

#[tokio::test]
async fn test_dry_run_streams_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let program_path = dir.path().join("card.nc");
    fs::write(&program_path, "G21\nG90\nM3 S8000\nG0 Z4\nG0 X0 Y0\nM5\n").unwrap();

    let controller = commands::open_controller(&Config::default(), &dry_run()).unwrap();
    let status = commands::run_file(&controller, &program_path).await.unwrap();
    assert_eq!(status, SessionStatus::Completed);
    assert!(!controller.is_busy());
}

#[test]
fn test_dry_run_immediate_commands() {
    let controller = commands::open_controller(&Config::default(), &dry_run()).unwrap();
    assert_eq!(controller.jog_move_str("Y", 2.5, "-").unwrap(), "ok");
    assert_eq!(controller.control_str("setOrigin").unwrap(), "ok");
    assert!(controller.jog_move_str("W", 2.5, "-").is_err());
    controller.safety_stop().unwrap();
}
