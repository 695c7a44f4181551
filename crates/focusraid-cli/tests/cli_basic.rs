//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

use chrono::{Duration, Utc};
use focusraid_core::{BattleSnapshot, Database};
use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusraid"))
        .args(args)
        .env("FOCUSRAID_HOME", home)
        .env_remove("FOCUSRAID_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "command {:?} failed: {}", args, stderr);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_battle_start_and_status() {
    let home = TempDir::new().unwrap();
    let out = run_json(home.path(), &["battle", "start", "Write tests", "--minutes", "30"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["status"]["state"], "fighting");
    assert_eq!(out["status"]["task"], "Write tests");
    assert_eq!(out["status"]["max_hp"], 1800.0);
    assert_eq!(out["status"]["exit_option"], "undo_start");

    let status = run_json(home.path(), &["status"]);
    assert_eq!(status["status"]["state"], "fighting");
    assert_eq!(status["status"]["freeze_tokens_remaining"], 3);
}

#[test]
fn test_freeze_thaw_cycle() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["battle", "start", "Focus", "--minutes", "25"]);

    let frozen = run_json(home.path(), &["battle", "freeze"]);
    assert_eq!(frozen["applied"], true);
    assert_eq!(frozen["status"]["state"], "frozen");
    assert_eq!(frozen["status"]["freeze_tokens_remaining"], 2);

    let again = run_json(home.path(), &["battle", "freeze"]);
    assert_eq!(again["applied"], false);

    let thawed = run_json(home.path(), &["battle", "thaw"]);
    assert_eq!(thawed["status"]["state"], "fighting");
    assert_eq!(thawed["status"]["freeze_history"].as_array().unwrap().len(), 1);
}

#[test]
fn test_complete_records_result() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["battle", "start", "Water plants", "--minutes", "5", "--passive"]);
    let done = run_json(home.path(), &["battle", "complete"]);
    assert_eq!(done["status"]["state"], "victory");
    assert_eq!(done["events"][0]["type"], "session_completed");
    assert_eq!(done["events"][0]["result"]["end_reason"], "forced_complete");

    let stats = run_json(home.path(), &["stats", "today"]);
    assert_eq!(stats["sessions"], 1);
    assert_eq!(stats["victories"], 1);
    assert_eq!(stats["focused_seconds"], 300.0);
}

#[test]
fn test_abort_outside_battle_is_not_applied() {
    let home = TempDir::new().unwrap();
    let out = run_json(home.path(), &["battle", "abort"]);
    assert_eq!(out["applied"], false);
    assert_eq!(out["status"]["state"], "idle");
}

#[test]
fn test_focus_group_flow() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["group", "start", "email", "review"]);
    run_json(home.path(), &["group", "record", "120"]);
    run_json(home.path(), &["group", "switch", "1"]);
    run_json(home.path(), &["group", "record", "60"]);

    let (_, stderr, code) = run_cli(home.path(), &["group", "switch", "7"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("out of range"));

    let summary = run_json(home.path(), &["group", "end"]);
    assert_eq!(summary["total_focused_seconds"], 180.0);
    assert_eq!(summary["allocations"]["email"], 120.0);
    assert_eq!(summary["allocations"]["review"], 60.0);

    let (_, stderr, code) = run_cli(home.path(), &["group", "show"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no focus group"));
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "battle.freeze_tokens_per_battle", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("ok"));

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "battle.freeze_tokens_per_battle"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1");

    run_json(home.path(), &["battle", "start", "Budget", "--minutes", "10"]);
    let frozen = run_json(home.path(), &["battle", "freeze"]);
    assert_eq!(frozen["status"]["freeze_tokens_remaining"], 0);

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "battle.bogus", "1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn test_recover_charges_gap() {
    let home = TempDir::new().unwrap();
    run_json(home.path(), &["battle", "start", "Deep", "--minutes", "1"]);

    // 10 s fought, then the process died for 110 s.
    let now = Utc::now();
    {
        let db = Database::open_at(&home.path().join("focusraid.db")).unwrap();
        let mut snapshot: BattleSnapshot = db.kv_get_json("battle_snapshot").unwrap().unwrap();
        snapshot.start_time = Some(now - Duration::seconds(120));
        snapshot.elapsed_before_last_save = 0.0;
        db.kv_set_json("battle_snapshot", &snapshot).unwrap();
        db.kv_set_json("last_seen_at", &(now - Duration::seconds(110)))
            .unwrap();
    }

    let out = run_json(home.path(), &["recover"]);
    assert_eq!(out["applied"], true);
    assert_eq!(out["status"]["state"], "fighting");
    assert!(out["events"].as_array().unwrap().is_empty());

    let hp = out["status"]["current_hp"].as_f64().unwrap();
    assert!((hp - 50.0).abs() < 5.0, "current_hp was {hp}");
    let wasted = out["status"]["wasted_time"].as_f64().unwrap();
    assert!((wasted - 110.0).abs() < 5.0, "wasted_time was {wasted}");
    assert_eq!(out["status"]["focused_today"], 0.0);
}

#[test]
fn test_invalid_duration_is_rejected() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["battle", "start", "Nothing", "--minutes", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("max_hp"));
}
