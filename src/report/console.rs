use crate::report::report_model::SuiteReport;

// ============================================================================
// Console reporter
// ============================================================================

/// Format a suite report for the terminal.
///
/// ```text
/// === Sessions: scripts ===
///
/// ✓ PASS  greenhouse apply (6 steps, 3 checks, 1 record)
/// ✗ FAIL  draft survives reload (4 steps, 2 checks, 0 records)
///     [FAIL] Step 3: SnapshotPresent: no snapshot stored for 'apply'
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Sessions: {} ===\n\n", report.suite_name));

    for result in &report.script_results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };
        let records = result.records.len();

        out.push_str(&format!(
            "{}  {} ({} steps, {} checks, {} {})\n",
            marker,
            result.script_name,
            result.steps_run,
            result.check_results.len(),
            records,
            if records == 1 { "record" } else { "records" }
        ));

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        for check in result.check_results.iter().filter(|c| !c.passed) {
            let detail = check.message.as_deref().unwrap_or("check failed");
            out.push_str(&format!(
                "    [FAIL] Step {}: {}: {}\n",
                check.step_index,
                check.expectation.kind(),
                detail
            ));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");
    out
}
