//! CLI integration tests
//!
//! Every test runs the built binary in a fresh temporary directory with a
//! small JSON data file, so no state leaks between tests.

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const DATA: &str = r#"{
  "invoices": [
    {
      "key": { "secretary_id": "sec-1", "period": "2026-09" },
      "header": { "recipient_name": "Acme Corp", "period": "2026-09" },
      "line_items": [
        { "owner_id": "co-1", "label": "Kobayashi Ltd", "rank": "A", "minutes": 90, "hourly_rate": "3000" },
        { "owner_id": "co-2", "label": "Endo Works", "rank": "B", "minutes": 30, "hourly_rate": "2000" }
      ],
      "tasks": [
        { "id": "t-1", "secretary_id": "sec-1", "work_minutes": 90, "approved_at": "2026-09-30T10:00:00Z" },
        { "id": "t-2", "secretary_id": "sec-1", "work_minutes": 30, "approved_at": "2026-09-30T10:05:00Z" }
      ]
    },
    {
      "key": { "secretary_id": "sec-2", "period": "2026-09" },
      "line_items": [{ "owner_id": "co-1", "minutes": 60 }],
      "tasks": [{ "id": "t-9", "secretary_id": "sec-2", "work_minutes": 60 }]
    }
  ]
}"#;

fn billsheet(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_billsheet"))
        .current_dir(dir)
        .env_remove("BILLSHEET_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to execute billsheet")
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("invoices.json"), DATA).unwrap();
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// preview / issue
// =============================================================================

#[test]
fn preview_writes_the_workbook_only() {
    let dir = workspace();
    let output = billsheet(
        dir.path(),
        &["preview", "-s", "sec-1", "-p", "2026-09", "-d", "invoices.json", "-o", "out"],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let written = dir.path().join("out").join("【Invoice】Acme Corp_2026-09.xlsx");
    assert!(std::fs::read(&written).unwrap().starts_with(b"PK"));
    assert!(stdout(&output).contains("【Invoice】Acme Corp_2026-09.xlsx"));
    assert!(!dir.path().join("billsheet-summaries.json").exists());
}

#[test]
fn issue_records_a_summary() {
    let dir = workspace();
    let output = billsheet(
        dir.path(),
        &["issue", "-s", "sec-1", "-p", "2026-09", "-d", "invoices.json", "--store", "s.json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("【Invoice】Acme Corp_2026-09.xlsx").exists());

    let listed = billsheet(dir.path(), &["summaries", "--store", "s.json", "--json"]);
    assert!(listed.status.success());
    let summaries: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    let summary = &summaries[0];
    assert_eq!(summary["secretary_id"], "sec-1");
    assert_eq!(summary["period"], "2026-09");
    assert_eq!(summary["total_fee"], "5500");
    assert_eq!(summary["task_count"], 2);
    assert_eq!(summary["total_minutes"], 120);
    assert_eq!(summary["status"], "FINALIZED");
}

#[test]
fn unapproved_tasks_fail_without_output() {
    let dir = workspace();
    let output = billsheet(
        dir.path(),
        &["issue", "-s", "sec-2", "-p", "2026-09", "-d", "invoices.json", "--store", "s.json"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Conflict"));
    assert!(!dir.path().join("s.json").exists());
    assert!(!dir.path().join("【Invoice】secretary_2026-09.xlsx").exists());
}

#[test]
fn unknown_invoice_fails() {
    let dir = workspace();
    let output = billsheet(
        dir.path(),
        &["preview", "-s", "sec-9", "-p", "2026-09", "-d", "invoices.json"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not found"));
}

#[test]
fn bad_period_is_rejected_by_the_parser() {
    let dir = workspace();
    let output = billsheet(dir.path(), &["preview", "-s", "sec-1", "-p", "2026-13", "-d", "invoices.json"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn config_file_supplies_paths() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("billsheet.toml"),
        "data = \"invoices.json\"\nstore = \"kept.json\"\noutput_dir = \"docs\"\n",
    )
    .unwrap();

    let output = billsheet(
        dir.path(),
        &["--config", "billsheet.toml", "issue", "-s", "sec-1", "-p", "2026-09"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("docs").join("【Invoice】Acme Corp_2026-09.xlsx").exists());
    assert!(dir.path().join("kept.json").exists());
}

// =============================================================================
// anchors / summaries
// =============================================================================

#[test]
fn anchors_reports_the_expanded_layout() {
    let dir = workspace();
    let output = billsheet(dir.path(), &["anchors", "-n", "7"]);
    assert!(output.status.success());

    let placement: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(placement["anchors"]["detail_header"]["row"], 15);
    assert_eq!(placement["anchors"]["detail_header"]["origin"], "marker");
    assert_eq!(placement["anchors"]["non_taxable_header"]["row"], 25);
    assert_eq!(placement["expansion"]["extra_rows"], 2);
    assert_eq!(placement["taxable_subtotal_row"], 23);
    assert_eq!(placement["non_taxable_subtotal_row"], 33);
}

#[test]
fn anchors_with_a_template_file() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("t.toml"),
        r#"
name = "Short"

[[rows]]
row = 3
cells = [{ col = "A", text = "Company" }, { col = "B", text = "Rank" }]

[[rows]]
row = 12
cells = [{ col = "A", text = "Non-taxable items" }]
"#,
    )
    .unwrap();

    let output = billsheet(dir.path(), &["--template", "t.toml", "anchors"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let placement: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(placement["anchors"]["detail_header"]["row"], 3);
    assert_eq!(placement["taxable_subtotal_row"], 9);
    assert_eq!(placement["non_taxable_subtotal_row"], 18);
}

#[test]
fn empty_store_lists_nothing() {
    let dir = workspace();
    let output = billsheet(dir.path(), &["summaries", "--store", "none.json"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
}
