// End-to-end tests for the `tally` binary: exit codes, stdout report
// contracts, and stderr diagnostics.
//
// Run with: cargo test -p tally-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn tally() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tally"))
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Source/compare pair with one match, one amount difference and one
/// key missing on each side.
fn setup() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "source.csv",
        "id,customer,amount\nA1,Acme,\"$1,000.00\"\nA2,Globex,250.50\nA3,Initech,75\n",
    );
    write(
        dir.path(),
        "compare.csv",
        "ref,client,total\nA1,ACME,1000\nA2,Globex,250.49\nA4,Hooli,10\n",
    );
    write(
        dir.path(),
        "recon.toml",
        r#"
name = "Demo"

[source]
file = "source.csv"

[compare]
file = "compare.csv"

[settings]
ignore_case = true

[[mapping]]
source = "id"
compare = "ref"
key = true

[[mapping]]
source = "customer"
compare = "client"

[[mapping]]
source = "amount"
compare = "total"
"#,
    );
    dir
}

// ===========================================================================
// tally run
// ===========================================================================

#[test]
fn run_json_reports_every_kind() {
    let dir = setup();
    let output = tally()
        .arg("run")
        .arg(dir.path().join("recon.toml"))
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    let statuses: Vec<&str> = json["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(
        statuses,
        vec!["match", "different", "missing_in_compare", "missing_in_source"]
    );
    assert_eq!(json["rows"][1]["differing_columns"][0], "amount");
    assert_eq!(json["summary"]["matches"], 1);
    assert_eq!(json["meta"]["name"], "Demo");
    assert_eq!(json["meta"]["settings"]["ignore_case"], true);

    assert!(stderr(&output).contains("Demo: 3 source rows, 3 compare rows, 1 matched, 1 different"));
}

#[test]
fn run_clean_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", "id,amt\n1,10.00\n2,5\n");
    write(dir.path(), "b.csv", "id,amt\n2,5.001\n1,10\n");
    let config = write(
        dir.path(),
        "clean.toml",
        "[source]\nfile = \"a.csv\"\n[compare]\nfile = \"b.csv\"\n[[mapping]]\nsource = \"id\"\ncompare = \"id\"\nkey = true\n[[mapping]]\nsource = \"amt\"\ncompare = \"amt\"\n",
    );

    let output = tally().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty(), "no report requested, stdout must stay empty");
}

#[test]
fn run_csv_to_file_with_filter() {
    let dir = setup();
    let report = dir.path().join("report.csv");
    let output = tally()
        .arg("run")
        .arg(dir.path().join("recon.toml"))
        .args(["-f", "csv", "--only", "different,missing_in_source", "-o"])
        .arg(&report)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());

    let csv = std::fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "status,key,source_column,compare_column,source_value,compare_value,is_different");
    assert_eq!(lines[3], "different,a2,amount,total,250.50,250.49,true");
    assert_eq!(lines[4], "missing_in_source,a4,id,ref,,A4,");
    assert_eq!(lines.len(), 7);
}

#[test]
fn run_quiet_prints_nothing_on_stderr() {
    let dir = setup();
    let output = tally()
        .arg("run")
        .arg(dir.path().join("recon.toml"))
        .arg("-q")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).is_empty(), "stderr: {}", stderr(&output));
}

#[test]
fn run_unknown_column_is_invalid_config() {
    let dir = setup();
    let config = write(
        dir.path(),
        "bad.toml",
        "[source]\nfile = \"source.csv\"\n[compare]\nfile = \"compare.csv\"\n[[mapping]]\nsource = \"id\"\ncompare = \"reference\"\n",
    );

    let output = tally().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("compare table: unknown column 'reference'"), "stderr: {err}");
    assert!(err.contains("hint:  compare columns: ref, client, total"), "stderr: {err}");
}

#[test]
fn run_empty_mapping_is_invalid_config() {
    let dir = setup();
    let config = write(
        dir.path(),
        "empty.toml",
        "[source]\nfile = \"source.csv\"\n[compare]\nfile = \"compare.csv\"\n",
    );
    let output = tally().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("column mapping is empty"));
}

#[test]
fn run_missing_input_file() {
    let dir = setup();
    let config = write(
        dir.path(),
        "missing.toml",
        "[source]\nfile = \"nope.csv\"\n[compare]\nfile = \"compare.csv\"\n[[mapping]]\nsource = \"id\"\ncompare = \"ref\"\n",
    );
    let output = tally().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn run_reports_duplicate_keys() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", "id,amt\n1,10\n1,11\n");
    write(dir.path(), "b.csv", "id,amt\n1,11\n");
    let config = write(
        dir.path(),
        "dup.toml",
        "[source]\nfile = \"a.csv\"\n[compare]\nfile = \"b.csv\"\n[[mapping]]\nsource = \"id\"\ncompare = \"id\"\nkey = true\n[[mapping]]\nsource = \"amt\"\ncompare = \"amt\"\n",
    );

    let output = tally().arg("run").arg(&config).arg("--json").output().unwrap();
    assert_eq!(output.status.code(), Some(0), "last row wins, so amounts agree");
    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(json["duplicates"][0]["side"], "source");
    assert_eq!(json["duplicates"][0]["rows"], 2);
    assert!(stderr(&output).contains("1 duplicate keys, 1 rows superseded"));
}

#[test]
fn run_only_alone_prints_filtered_json() {
    let dir = setup();
    let output = tally()
        .arg("run")
        .arg(dir.path().join("recon.toml"))
        .args(["--only", "missing_in_compare"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "missing_in_compare");
    assert_eq!(rows[0]["key"], "a3");
    assert_eq!(json["summary"]["matches"], 1);
}

// ===========================================================================
// tally compare
// ===========================================================================

#[test]
fn compare_without_config() {
    let dir = setup();
    let output = tally()
        .arg("compare")
        .arg(dir.path().join("source.csv"))
        .arg(dir.path().join("compare.csv"))
        .args(["--key", "id=ref", "--map", "amount=total", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(json["meta"]["name"], "source.csv vs compare.csv");
    assert_eq!(json["summary"]["differences"], 1);
    assert_eq!(json["summary"]["missing_in_source"], 1);
}

#[test]
fn compare_precision_flag_widens_tolerance() {
    let dir = setup();
    let output = tally()
        .arg("compare")
        .arg(dir.path().join("source.csv"))
        .arg(dir.path().join("compare.csv"))
        .args(["--key", "id=ref", "--map", "amount=total", "--precision", "1", "--json"])
        .output()
        .unwrap();

    let json: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(json["summary"]["differences"], 0);
    assert_eq!(json["summary"]["matches"], 2);
}

#[test]
fn compare_shared_column_names_and_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", "id;name\n1;Alice\n2;bob\n");
    let b = write(dir.path(), "b.csv", "id;name\n1;alice\n2;BOB\n");

    let output = tally()
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .args(["--key", "id", "--map", "name", "--delimiter", ";", "--ignore-case"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn compare_unknown_column_is_usage_error() {
    let dir = setup();
    let output = tally()
        .arg("compare")
        .arg(dir.path().join("source.csv"))
        .arg(dir.path().join("compare.csv"))
        .args(["--key", "invoice=ref"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("source table: unknown column 'invoice'"));
    assert!(stderr(&output).contains("source columns: id, customer, amount"));
}

#[test]
fn compare_requires_columns() {
    let dir = setup();
    let output = tally()
        .arg("compare")
        .arg(dir.path().join("source.csv"))
        .arg(dir.path().join("compare.csv"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("no columns to compare"));
}

#[test]
fn compare_rejects_unknown_row_kind() {
    let dir = setup();
    let output = tally()
        .arg("compare")
        .arg(dir.path().join("source.csv"))
        .arg(dir.path().join("compare.csv"))
        .args(["--key", "id=ref", "--only", "mismatch"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// tally validate
// ===========================================================================

#[test]
fn validate_ok() {
    let dir = setup();
    let output = tally()
        .arg("validate")
        .arg(dir.path().join("recon.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Demo: ok (3 mapped columns, 1 key columns"));
}

#[test]
fn validate_rejects_bad_toml() {
    let dir = setup();
    let config = write(dir.path(), "broken.toml", "[source\nfile = 1\n");
    let output = tally().arg("validate").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("config parse error"));
}

#[test]
fn validate_rejects_bad_delimiter() {
    let dir = setup();
    let config = write(
        dir.path(),
        "delim.toml",
        "[source]\nfile = \"source.csv\"\ndelimiter = \"\\n\"\n[compare]\nfile = \"compare.csv\"\n[[mapping]]\nsource = \"id\"\ncompare = \"ref\"\n",
    );
    let output = tally().arg("validate").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("delimiter"));
}
