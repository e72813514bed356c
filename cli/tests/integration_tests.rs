use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_note-funnel")
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run note-funnel")
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(bin())
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn note-funnel");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for note-funnel")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[test]
fn analyze_outputs_flow_graph_json() {
    let records = fixture("records.json");
    let output = run(&["analyze", "--input", records.to_str().unwrap()]);
    let json = stdout_json(&output);

    assert_eq!(json["total"], 8);
    assert_eq!(json["summary"]["posted"], 1);
    assert!(json["generated_at"].is_string());
    assert_eq!(json["flow"]["nodes"][0]["name"], "Start");
    let links = json["flow"]["links"].as_array().unwrap();
    assert!(!links.is_empty());
    assert!(links.iter().all(|l| l["value"].as_u64().unwrap() > 0));
    assert_eq!(json["failure_breakdown"].as_array().unwrap().len(), 7);
}

#[test]
fn analyze_config_limit_and_flag_override() {
    let records = fixture("records.json");
    let config = fixture("config.yml");

    let output = run(&[
        "analyze",
        "--input",
        records.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(stdout_json(&output)["total"], 3);

    let output = run(&[
        "analyze",
        "--input",
        records.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--limit",
        "5",
    ]);
    assert_eq!(stdout_json(&output)["total"], 5);
}

#[test]
fn analyze_reads_stdin() {
    let raw = r#"{"records": [
        {"id": "a", "verifiableFact": 0.2},
        {"id": "b", "note": "n", "fullResult": "NO MISSING CONTEXT"}
    ]}"#;
    let output = run_with_stdin(&["analyze", "--input", "-"], raw);
    let json = stdout_json(&output);
    assert_eq!(json["total"], 2);
    assert_eq!(json["results"][0]["failed_at"], "Verifiable Fact Filter");
    assert_eq!(json["results"][1]["failed_at"], "NO MISSING CONTEXT");
}

#[test]
fn analyze_table_format_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("reports").join("funnel.txt");
    let records = fixture("records.json");

    let output = run(&[
        "analyze",
        "--input",
        records.to_str().unwrap(),
        "--format",
        "table",
        "--output",
        out_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Analyzed 8 record(s)"));

    let table = std::fs::read_to_string(&out_path).unwrap();
    assert!(table.starts_with("Records: 8"), "{table}");
}

#[test]
fn analyze_rejects_invalid_records() {
    let output = run_with_stdin(
        &["analyze", "--input", "-"],
        r#"[{"id": "a"}, {"id": "a"}]"#,
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "{stderr}");
    assert!(stderr.contains("duplicate record id"), "{stderr}");
}

#[test]
fn analyze_missing_input_fails() {
    let output = run(&["analyze", "--input", "/nonexistent/records.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn analyze_zero_jobs_rejected() {
    let records = fixture("records.json");
    let output = run(&["analyze", "--input", records.to_str().unwrap(), "--jobs", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--jobs"));
}

// ---------------------------------------------------------------------------
// extract / length
// ---------------------------------------------------------------------------

#[test]
fn extract_labeled_answer_from_file() {
    let answer = fixture("answer.txt");
    let output = run(&["extract", "--input", answer.to_str().unwrap()]);
    let json = stdout_json(&output);

    assert_eq!(json["status"], "CORRECTION WITH TRUSTWORTHY CITATION");
    assert_eq!(json["note"], "Flooding began on May 4, not May 14.");
    assert_eq!(json["url"], "https://weather.example/report/0504");
    assert_eq!(
        json["reasoning"],
        "The post misstates the date the flooding began."
    );
    assert_eq!(json["length"]["valid"], true);
    assert_eq!(json["length"]["character_count"], 36);
}

#[test]
fn extract_legacy_answer_from_stdin() {
    let output = run_with_stdin(
        &["extract"],
        "NO MISSING CONTEXT\nThe figure matches the census.\n",
    );
    let json = stdout_json(&output);
    assert_eq!(json["status"], "NO MISSING CONTEXT");
    assert_eq!(json["note"], "The figure matches the census.");
    assert_eq!(json["url"], "");
    assert!(json.get("reasoning").is_none());
}

#[test]
fn extract_empty_input_fails() {
    let output = run_with_stdin(&["extract"], "   \n");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("empty content"));
}

#[test]
fn length_counts_urls_at_configured_cost() {
    let output = run_with_stdin(
        &["length", "--url-cost", "23", "--limit", "30"],
        "See https://example.org/a/very/long/path\n",
    );
    let json = stdout_json(&output);
    assert_eq!(json["character_count"], 27);
    assert_eq!(json["limit"], 30);
    assert_eq!(json["valid"], true);
}

#[test]
fn length_rejects_out_of_range_url_cost() {
    let answer = fixture("answer.txt");
    let output = run(&[
        "length",
        "--url-cost",
        "18446744073709551615",
        "--input",
        answer.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("length.url_cost"), "{stderr}");
}

// ---------------------------------------------------------------------------
// check-config
// ---------------------------------------------------------------------------

#[test]
fn check_config_prints_effective_values() {
    let config = fixture("config.yml");
    let output = run(&["check-config", "--config", config.to_str().unwrap()]);
    assert!(output.status.success());

    let effective: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(effective["batch"]["limit"], 3);
    assert_eq!(effective["length"]["limit"], 280);
    assert_eq!(effective["evaluation"]["pass_threshold"], 0.5);
}

#[test]
fn check_config_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    std::fs::write(&path, "evaluation:\n  qualifying_status: \"\"\n").unwrap();

    let output = run(&["check-config", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("qualifying_status"));
}
