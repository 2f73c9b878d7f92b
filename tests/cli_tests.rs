mod common;
use chrono::Duration;
use common::{cli, hours_ago, ldr, presence, session_end, setup_test_db, temp_out, touch};
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;

fn init_db(name: &str) -> String {
    let db_path = setup_test_db(name);
    cli()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));
    db_path
}

fn collect(db_path: &str, sessions: &str) {
    cli()
        .args([
            "--db", db_path, "collect", "--sessions", sessions, "--duration", "15", "--seed", "5",
        ])
        .assert()
        .success()
        .stdout(contains("session(s) stored"));
}

#[test]
fn test_init_creates_store() {
    let db_path = init_db("cli_init");
    assert!(fs::metadata(&db_path).is_ok());
}

#[test]
fn test_collect_then_stats() {
    let db_path = init_db("cli_collect_stats");
    collect(&db_path, "2");

    cli()
        .args(["--db", &db_path, "stats"])
        .assert()
        .success()
        .stdout(contains("TOTEM-001"))
        .stdout(contains("Sessions"));
}

#[test]
fn test_stats_on_empty_store() {
    let db_path = init_db("cli_stats_empty");
    cli()
        .args(["--db", &db_path, "stats"])
        .assert()
        .success()
        .stdout(contains("No totems recorded yet"));
}

#[test]
fn test_ingest_file_and_report_json() {
    let db_path = init_db("cli_ingest");
    let t = hours_ago(1);
    let batch = vec![
        presence("cli-batch", t, 1.0),
        touch("cli-batch", t, Some(0.4)),
        ldr("cli-batch", t, 700.0),
        presence("cli-batch", t + Duration::seconds(1), 1.0),
        touch("cli-batch", t + Duration::seconds(1), Some(1.5)),
        ldr("cli-batch", t + Duration::seconds(1), 720.0),
        session_end("cli-batch", 2.0, t + Duration::seconds(2)),
    ];
    let file = temp_out("cli_ingest_batch", "json");
    fs::write(&file, serde_json::to_string(&batch).unwrap()).unwrap();

    cli()
        .args(["--db", &db_path, "ingest", "--file", &file])
        .assert()
        .success()
        .stdout(contains("Session cli-batch ingested: 6 events, 2 touches"));

    let out = cli()
        .args(["--db", &db_path, "report", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(report["data_period"]["total_records"], 6);
    assert_eq!(report["touch_patterns"]["total_touches"], 2);
    assert_eq!(report["engagement_metrics"]["engagement_rate"], 100.0);

    // The same session cannot be ingested twice.
    cli()
        .args(["--db", &db_path, "ingest", "--file", &file])
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn test_report_without_data() {
    let db_path = init_db("cli_report_empty");

    cli()
        .args(["--db", &db_path, "report", "--json"])
        .assert()
        .success()
        .stdout(contains(r#""error": "no data""#));

    cli()
        .args(["--db", &db_path, "report"])
        .assert()
        .success()
        .stdout(contains("No data in the last 30 days"));
}

#[test]
fn test_clean_and_quality() {
    let db_path = init_db("cli_clean_quality");
    collect(&db_path, "1");

    cli()
        .args(["--db", &db_path, "clean", "--purge", "--retention-days", "90"])
        .assert()
        .success()
        .stdout(contains("Duplicates removed"))
        .stdout(contains("Cleaning completed"));

    cli()
        .args(["--db", &db_path, "quality"])
        .assert()
        .success()
        .stdout(contains("Quality score"));

    let out = cli()
        .args(["--db", &db_path, "quality", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["quality_score"], 100.0);
    assert_eq!(report["records_with_problems"], 0);
}

#[test]
fn test_train_and_predict() {
    let db_path = init_db("cli_train_predict");
    let model = temp_out("cli_model", "json");

    cli()
        .args(["--db", &db_path, "train", "--model", &model, "--seed", "42"])
        .assert()
        .success()
        .stdout(contains("Accuracy"))
        .stdout(contains("Precision"))
        .stdout(contains("weighted avg"))
        .stdout(contains("Model saved"));

    cli()
        .args(["--db", &db_path, "predict", "--duration", "1.9", "--model", &model])
        .assert()
        .success()
        .stdout(contains(r#""predicted_type": "long""#))
        .stdout(contains("confidence"));

    cli()
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("train"));
}

#[test]
fn test_predict_without_model_fails() {
    let db_path = init_db("cli_predict_missing");
    let model = temp_out("cli_missing_model", "json");

    cli()
        .args(["--db", &db_path, "predict", "--duration", "0.5", "--model", &model])
        .assert()
        .failure()
        .stderr(contains("Model artifact not found"));
}

#[test]
fn test_export_csv_and_json() {
    let db_path = init_db("cli_export");
    collect(&db_path, "1");

    let csv = temp_out("cli_export", "csv");
    cli()
        .args(["--db", &db_path, "export", "--format", "csv", "--file", &csv, "--force"])
        .assert()
        .success()
        .stdout(contains("CSV export completed"));
    let content = fs::read_to_string(&csv).unwrap();
    assert!(content.lines().next().unwrap().contains("session_id"));

    let json = temp_out("cli_export", "json");
    cli()
        .args(["--db", &db_path, "export", "--format", "json", "--file", &json, "--force"])
        .assert()
        .success();
    let rows: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert!(rows.as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_export_rejects_relative_path() {
    let db_path = init_db("cli_export_relative");
    cli()
        .args(["--db", &db_path, "export", "--file", "relative.csv"])
        .assert()
        .failure()
        .stderr(contains("must be absolute"));
}

#[test]
fn test_backup_compressed() {
    let db_path = init_db("cli_backup");
    let dest = temp_out("cli_backup", "sqlite");
    let zip = dest.replace(".sqlite", ".zip");
    fs::remove_file(&zip).ok();

    cli()
        .args(["--db", &db_path, "backup", "--file", &dest, "--compress", "--force"])
        .assert()
        .success()
        .stdout(contains("Backup created"))
        .stdout(contains("Compressed"));

    assert!(fs::metadata(&zip).is_ok());
    assert!(fs::metadata(&dest).is_err());
}

#[test]
fn test_log_records_operations() {
    let db_path = init_db("cli_log");
    collect(&db_path, "1");

    cli()
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("init"))
        .stdout(contains("collect"));
}

#[test]
fn test_db_check_and_info() {
    let db_path = init_db("cli_db_check");
    collect(&db_path, "1");

    cli()
        .args(["--db", &db_path, "db", "--check", "--info"])
        .assert()
        .success()
        .stdout(contains("Integrity check passed"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    cli()
        .args(["-q", "-v", "stats"])
        .assert()
        .failure()
        .stderr(contains("cannot be used with").or(contains("conflict")));
}

#[test]
fn test_db_name_env_overrides_config_file() {
    let home = std::env::temp_dir().join("totemlog_cli_db_name_home");
    let conf_dir = home.join(".totemlog");
    fs::create_dir_all(&conf_dir).unwrap();
    fs::write(
        conf_dir.join("totemlog.conf"),
        "database: /tmp/totemlog_from_file.sqlite\n",
    )
    .unwrap();

    cli()
        .env("HOME", &home)
        .env_remove("TOTEMLOG_DB")
        .env_remove("DB_NAME")
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("totemlog_from_file.sqlite"));

    cli()
        .env("HOME", &home)
        .env_remove("TOTEMLOG_DB")
        .env("DB_NAME", "custom_store")
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("custom_store.sqlite"))
        .stdout(contains("totemlog_from_file").not());
}
