//! Integration tests for the otcure binary.
//!
//! These tests verify end-to-end behavior including:
//! - Catalog listing
//! - One-shot dose checks (text and JSON)
//! - Scripted interactive sessions: profile intake, commits and rejections
//! - Configuration loading and validation

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a config file with the given contents
fn setup_config(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, contents).expect("Failed to write config");
    (temp_dir, path)
}

/// Helper to get the CLI binary with an isolated config
fn cli(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("otcure"));
    cmd.arg("--config").arg(config);
    cmd
}

const PROFILE: &str = "홍길동\n35\nmale\nnone\n";

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("otcure"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Over-the-counter medication dose tracker",
        ));
}

#[test]
fn test_catalog_grouped_by_class() {
    let (_dir, config) = setup_config("");

    cli(&config)
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("해열진통제 (3개)"))
        .stdout(predicate::str::contains("아세트아미노펜: 4000.0 mg"));
}

#[test]
fn test_check_reports_duplicates_and_warnings() {
    let (_dir, config) = setup_config("");

    cli(&config)
        .arg("check")
        .arg("타이레놀 500mg")
        .arg("타이레놀 콜드-에스 정")
        .assert()
        .success()
        .stdout(predicate::str::contains("아세트아미노펜: 800.0 mg (중복 합산됨)"))
        .stdout(predicate::str::contains("중복 성분 경고"))
        .stdout(predicate::str::contains("간 손상 위험"));
}

#[test]
fn test_check_json_class_count_warning() {
    let (_dir, config) = setup_config("");

    let output = cli(&config)
        .arg("check")
        .arg("타이레놀 500mg")
        .arg("부루펜 정 200mg")
        .arg("--json")
        .output()
        .expect("Failed to run otcure");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output is not JSON");
    let warnings = report["warnings"].as_array().unwrap();
    let class_count = warnings
        .iter()
        .find(|w| w["kind"] == "class-type-count")
        .expect("class-type-count warning missing");
    let message = class_count["message"].as_str().unwrap();
    assert!(message.contains("해열진통제"));
    assert!(message.contains('2'));

    assert_eq!(report["totals"]["이부프로펜"], 200.0);
    assert!(report["duplicates"].as_object().unwrap().is_empty());
}

#[test]
fn test_check_refuses_contraindicated_selection() {
    let (_dir, config) = setup_config("");

    cli(&config)
        .arg("check")
        .arg("게보린 정")
        .arg("--pregnancy")
        .arg("pregnant")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pregnancy-contraindicated"));
}

#[test]
fn test_session_commit_and_log() {
    let (_dir, config) = setup_config("");
    let script = format!(
        "{}select 타이레놀 500mg, 타이레놀 콜드-에스 정\ncommit 두통\nlog\ntotals\nquit\n",
        PROFILE
    );

    cli(&config)
        .arg("session")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("홍길동님의 세션을 시작합니다"))
        .stdout(predicate::str::contains("복용 기록 완료"))
        .stdout(predicate::str::contains("두통"))
        .stdout(predicate::str::contains("아세트아미노펜: 800.0 mg / 최대 4000.0 mg"));
}

#[test]
fn test_session_rejects_over_limit_and_keeps_log() {
    let (_dir, config) = setup_config(
        r#"
[limits]
"아세트아미노펜" = 600.0
"#,
    );
    let script = format!(
        "{}select 타이레놀 500mg\ncommit\nselect 타이레놀 500mg\ncommit\ntotals\nquit\n",
        PROFILE
    );

    cli(&config)
        .arg("session")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("1일 최대 복용량을 초과"))
        .stdout(predicate::str::contains("아세트아미노펜: 1000.0 mg / 최대 600.0 mg"))
        .stdout(predicate::str::contains("아세트아미노펜: 500.0 mg / 최대 600.0 mg"));
}

#[test]
fn test_session_reasks_invalid_profile() {
    let (_dir, config) = setup_config("");
    let script = format!("\n35\nmale\nnone\n{}quit\n", PROFILE);

    cli(&config)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: 이름을 입력해주세요."))
        .stdout(predicate::str::contains("홍길동님의 세션을 시작합니다"));
}

#[test]
fn test_session_elderly_cannot_select_cold_medicine() {
    let (_dir, config) = setup_config("");
    let script = "어르신\n72\nfemale\nnone\nlist\nselect 타이레놀 콜드-에스 정\ncommit\nlog\nquit\n";

    cli(&config)
        .arg("session")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[x] 타이레놀 콜드-에스 정 (선택 불가: age-caution)",
        ))
        .stdout(predicate::str::contains("오늘의 복용 기록이 없습니다."));
}

#[test]
fn test_session_exclusion_from_config() {
    let (_dir, config) = setup_config(
        r#"
[session]
excluded_ingredients = ["이부프로펜"]
"#,
    );
    let script = format!("{}list\ninclude 이부프로펜\nlist\nexcluded\nquit\n", PROFILE);

    cli(&config)
        .arg("session")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ 홍길동님의 세션을 시작합니다."))
        .stdout(predicate::str::contains("제외된 성분: 이부프로펜"))
        .stdout(predicate::str::contains(
            "[x] 부루펜 정 200mg (선택 불가: excluded-ingredient)",
        ))
        .stdout(predicate::str::contains("[ ] 부루펜 정 200mg"))
        .stdout(predicate::str::contains("제외된 성분이 없습니다."));
}

#[test]
fn test_config_loaded_from_default_path() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_dir = temp_dir.path().join("otcure");
    fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    fs::write(
        config_dir.join("config.toml"),
        "[limits]\n\"아세트아미노펜\" = 3000.0\n",
    )
    .expect("Failed to write config");

    Command::new(assert_cmd::cargo::cargo_bin!("otcure"))
        .env("XDG_CONFIG_HOME", temp_dir.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("아세트아미노펜: 3000.0 mg"));
}

#[test]
fn test_missing_default_config_uses_builtin_limits() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    Command::new(assert_cmd::cargo::cargo_bin!("otcure"))
        .env("XDG_CONFIG_HOME", temp_dir.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("아세트아미노펜: 4000.0 mg"));
}

#[test]
fn test_unknown_rule_kind_fails_at_startup() {
    let (_dir, config) = setup_config(
        r#"
[[rules]]
id = "mystery"
severity = "error"
message = "?"

[rules.check]
kind = "interaction-matrix"
"#,
    );

    cli(&config).arg("catalog").assert().failure();
}

#[test]
fn test_config_init_writes_loadable_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = temp_dir.path().join("otcure").join("config.toml");

    cli(&config)
        .arg("config")
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let contents = fs::read_to_string(&config).expect("Config not written");
    assert!(contents.contains("class-type-count"));

    cli(&config)
        .arg("check")
        .arg("타이레놀 500mg")
        .assert()
        .success();
}
