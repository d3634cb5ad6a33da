mod common;
use common::*;

#[test]
fn test_scenario_summary_from_stdin() {
    let (stdout, stderr, exit_code) = run_digest_with_input(&[], SCENARIO_CSV.as_bytes());
    assert_eq!(exit_code, 0, "stderr: {}", stderr);

    let envelope = parse_envelope(&stdout);
    assert_eq!(envelope["ok"], true);

    let summary = &envelope["summary"];
    assert_eq!(summary["rows_scanned"], 3);
    assert_eq!(summary["incident_count"], 2);
    assert_eq!(summary["resolved_count"], 2);
    assert_eq!(summary["mean_resolution_hours"], 1.5);
    assert_eq!(
        top_pairs(&summary["top_categories"]),
        vec![("net".to_string(), 1), ("disk".to_string(), 1)]
    );
    assert_eq!(
        top_pairs(&summary["top_priorities"]),
        vec![("2 - High".to_string(), 1), ("3 - Moderate".to_string(), 1)]
    );

    let scan = &envelope["scan"];
    assert_eq!(scan["rows_scanned"], 3);
    assert_eq!(scan["entities"], 2);
    assert_eq!(scan["capped"], false);
    assert!(scan["elapsed_ms"].is_u64());
    assert!(envelope.get("metrics").is_none());
}

#[test]
fn test_file_and_stdin_agree() {
    let (from_file, _, code_file) = run_digest_with_file(&[], SCENARIO_CSV);
    let (from_stdin, _, code_stdin) = run_digest_with_input(&["-"], SCENARIO_CSV.as_bytes());
    assert_eq!(code_file, 0);
    assert_eq!(code_stdin, 0);
    assert_eq!(
        parse_envelope(&from_file)["summary"],
        parse_envelope(&from_stdin)["summary"]
    );
}

#[test]
fn test_envelope_field_order() {
    let (stdout, _, _) = run_digest_with_input(&[], SCENARIO_CSV.as_bytes());
    let ok = stdout.find("\"ok\"").unwrap();
    let summary = stdout.find("\"summary\"").unwrap();
    let scan = stdout.find("\"scan\"").unwrap();
    assert!(ok < summary && summary < scan, "{}", stdout);
    assert_eq!(stdout.lines().count(), 1, "envelope is a single line");
}

#[test]
fn test_mean_absent_when_nothing_resolved() {
    let input = "number,category,opened_at,resolved_at\nX,net,2024-01-01 00:00,\nY,net,?,null\n";
    let (stdout, _, exit_code) = run_digest_with_input(&[], input.as_bytes());
    assert_eq!(exit_code, 0);

    let summary = &parse_envelope(&stdout)["summary"];
    assert_eq!(summary["incident_count"], 2);
    assert_eq!(summary["resolved_count"], 0);
    assert!(summary["mean_resolution_hours"].is_null());
    assert_eq!(top_pairs(&summary["top_categories"]), vec![("net".to_string(), 2)]);
}

#[test]
fn test_top_k_flag_and_tie_order() {
    let input = "\
number,category
1,c
2,b
3,a
4,b
5,a
6,d
";
    let (stdout, _, exit_code) = run_digest_with_input(&["-k", "2"], input.as_bytes());
    assert_eq!(exit_code, 0);
    let summary = &parse_envelope(&stdout)["summary"];
    // b and a tie at 2; b was seen first
    assert_eq!(
        top_pairs(&summary["top_categories"]),
        vec![("b".to_string(), 2), ("a".to_string(), 2)]
    );
    assert_eq!(summary["top_priorities"].as_array().unwrap().len(), 0);
}

#[test]
fn test_empty_input_reports_no_data() {
    let (stdout, _, exit_code) = run_digest_with_input(&[], b"");
    assert_eq!(exit_code, 3);
    let envelope = parse_envelope(&stdout);
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["error"], "no rows scanned");
    assert_eq!(envelope["scan"]["rows_scanned"], 0);
    assert!(envelope.get("summary").is_none());
}

#[test]
fn test_header_only_reports_no_data() {
    let (stdout, _, exit_code) =
        run_digest_with_input(&[], b"number,category,opened_at,resolved_at\n");
    assert_eq!(exit_code, 3);
    assert_eq!(parse_envelope(&stdout)["ok"], false);
}

#[test]
fn test_no_data_in_text_mode_goes_to_stderr() {
    let (stdout, stderr, exit_code) = run_digest_with_input(&["-F", "text"], b"");
    assert_eq!(exit_code, 3);
    assert!(stdout.is_empty());
    assert!(stderr.contains("no rows scanned"));
}

#[test]
fn test_missing_input_file_is_general_error() {
    let (stdout, stderr, exit_code) =
        run_digest_with_input(&["/nonexistent/incidents.csv"], b"");
    assert_eq!(exit_code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to open input"), "stderr: {}", stderr);
}

#[test]
fn test_bad_delimiter_is_usage_error() {
    let (_, stderr, exit_code) = run_digest_with_input(&["-d", "::"], SCENARIO_CSV.as_bytes());
    assert_eq!(exit_code, 2);
    assert!(stderr.contains("delimiter"), "stderr: {}", stderr);
}

#[test]
fn test_zero_top_k_is_usage_error() {
    let (_, _, exit_code) = run_digest_with_input(&["--top", "0"], SCENARIO_CSV.as_bytes());
    assert_eq!(exit_code, 2);
}

#[test]
fn test_stats_flag_writes_to_stderr() {
    let (stdout, stderr, exit_code) = run_digest_with_input(&["-s"], SCENARIO_CSV.as_bytes());
    assert_eq!(exit_code, 0);
    assert!(stderr.contains("Rows scanned: 3 (2 incidents)"), "stderr: {}", stderr);
    assert_eq!(parse_envelope(&stdout)["ok"], true);
}

#[test]
fn test_jsonl_logs_stay_on_stderr() {
    let (stdout, stderr, exit_code) = run_digest_with_input(
        &["--log-level", "info", "--log-format", "jsonl"],
        SCENARIO_CSV.as_bytes(),
    );
    assert_eq!(exit_code, 0);
    assert_eq!(parse_envelope(&stdout)["ok"], true);

    let complete = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|event| event["fields"]["message"] == "scan_complete")
        .unwrap_or_else(|| panic!("no scan_complete event in: {}", stderr));
    assert_eq!(complete["fields"]["rows_scanned"], 3);
    assert_eq!(complete["fields"]["incidents"], 2);
}
