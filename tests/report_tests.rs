use job_tracker::extract::record::JobRecord;
use job_tracker::report::console::format_console_report;
use job_tracker::report::report_model::SuiteReport;
use job_tracker::script::script_model::{CheckResult, Expectation, ScriptResult};

// ============================================================================
// Helper builders
// ============================================================================

fn passing_result(name: &str) -> ScriptResult {
    ScriptResult {
        script_name: name.to_string(),
        passed: true,
        steps_run: 4,
        check_results: vec![CheckResult {
            step_index: 3,
            expectation: Expectation::RecordCount { expected: 1 },
            passed: true,
            actual: Some("1".into()),
            message: None,
        }],
        records: vec![JobRecord {
            company: "Acme Corp".into(),
            ..JobRecord::default()
        }],
        error: None,
    }
}

fn failing_result(name: &str) -> ScriptResult {
    ScriptResult {
        script_name: name.to_string(),
        passed: false,
        steps_run: 3,
        check_results: vec![
            CheckResult {
                step_index: 2,
                expectation: Expectation::SnapshotPresent { form: None },
                passed: false,
                actual: Some("jt_form_apply present=false".into()),
                message: Some("no snapshot stored for 'apply'".into()),
            },
            CheckResult {
                step_index: 2,
                expectation: Expectation::UnloadWarning { expected: true },
                passed: true,
                actual: None,
                message: None,
            },
        ],
        records: Vec::new(),
        error: None,
    }
}

fn errored_result(name: &str) -> ScriptResult {
    ScriptResult {
        script_name: name.to_string(),
        passed: false,
        steps_run: 1,
        check_results: Vec::new(),
        records: Vec::new(),
        error: Some("Step 0 failed: element 'middle_name' not found".into()),
    }
}

fn mixed_suite_report() -> SuiteReport {
    SuiteReport::from_results(
        "sessions",
        vec![
            passing_result("greenhouse apply"),
            failing_result("draft survives reload"),
            errored_result("typo"),
        ],
    )
}

// ============================================================================
// Report model
// ============================================================================

#[test]
fn suite_report_counts() {
    let report = mixed_suite_report();
    assert_eq!(report.total, 3);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 2);
    assert!(!report.all_passed());
    assert_eq!(report.record_count(), 1);
    assert_eq!(report.duration_ms, None);
}

#[test]
fn empty_suite_passes() {
    let report = SuiteReport::from_results("empty", Vec::new());
    assert!(report.all_passed());
    assert_eq!(report.total, 0);
}

#[test]
fn suite_report_serializes_without_missing_duration() {
    let json = serde_json::to_value(mixed_suite_report()).unwrap();
    assert!(json.get("duration_ms").is_none());
    assert_eq!(json["script_results"][0]["records"][0]["company"], "Acme Corp");

    let timed = serde_json::to_value(mixed_suite_report().with_duration(42)).unwrap();
    assert_eq!(timed["duration_ms"], 42);
}

// ============================================================================
// Console reporter
// ============================================================================

#[test]
fn console_report_lists_every_script() {
    let output = format_console_report(&mixed_suite_report());

    assert!(output.starts_with("=== Sessions: sessions ===\n"));
    assert!(output.contains("\u{2713} PASS  greenhouse apply (4 steps, 1 checks, 1 record)"));
    assert!(output.contains("\u{2717} FAIL  draft survives reload (3 steps, 2 checks, 0 records)"));
    assert!(output.contains("\u{2717} FAIL  typo (1 steps, 0 checks, 0 records)"));
}

#[test]
fn console_report_shows_only_failed_checks() {
    let output = format_console_report(&mixed_suite_report());

    assert!(output.contains("    [FAIL] Step 2: SnapshotPresent: no snapshot stored for 'apply'\n"));
    assert!(!output.contains("UnloadWarning"));
    assert!(output.contains("    [ERROR] Step 0 failed: element 'middle_name' not found\n"));
}

#[test]
fn console_report_footer_with_and_without_duration() {
    let plain = format_console_report(&mixed_suite_report());
    assert!(plain.ends_with("=== Results: 1 passed, 2 failed (3 total) ===\n"));

    let timed = format_console_report(&mixed_suite_report().with_duration(1500));
    assert!(timed.ends_with("=== Results: 1 passed, 2 failed (3 total) in 1.5s ===\n"));
}
