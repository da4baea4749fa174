use job_tracker::{
    protect::store::{MemoryStore, SnapshotStore},
    script::{
        runner::ScriptRunner,
        script_model::{Expectation, ScriptStep, SessionScript, SinkBehaviour},
    },
};

const PAGE: &str = r#"
  url: https://boards.greenhouse.io/acme/jobs/12345
  title: Senior Engineer
  head:
    - tag: meta
      attrs: { property: "og:title", content: Senior Engineer }
  body:
    - tag: p
      children: ["Remote friendly role."]
    - tag: form
      attrs: { id: application }
      children:
        - tag: label
          attrs: { for: company }
          children: ["Company"]
        - tag: input
          attrs: { id: company, name: company, value: Acme Corp }
        - tag: input
          attrs: { type: text, name: first_name }
        - tag: input
          attrs: { type: email, name: email }
        - tag: input
          attrs: { type: file, name: resume }
        - tag: button
          attrs: { type: submit }
          children: ["Submit Application"]
"#;

fn script(name: &str, extra: &str, steps: &str) -> SessionScript {
    let yaml = format!("name: {}\n{}\npage:{}\nsteps:\n{}", name, extra, PAGE, steps);
    SessionScript::from_yaml(&yaml).unwrap()
}

#[test]
fn script_yaml_parses_steps_and_checks() {
    let parsed = script(
        "parse",
        "sink: { mode: reject }",
        r#"
  - { action: fill, field: first_name, value: Ada }
  - { action: check, field: remote }
  - { action: advance, ms: 10 }
  - action: expect
    checks:
      - { type: record_count, expected: 0 }
"#,
    );

    assert_eq!(parsed.sink, SinkBehaviour::Reject);
    assert_eq!(parsed.steps.len(), 4);
    assert!(matches!(
        &parsed.steps[1],
        ScriptStep::Check { checked: true, value: None, .. }
    ));
    match &parsed.steps[3] {
        ScriptStep::Expect { checks } => {
            assert_eq!(checks[0], Expectation::RecordCount { expected: 0 });
            assert_eq!(checks[0].kind(), "RecordCount");
        }
        other => panic!("unexpected step {:?}", other),
    }
}

#[test]
fn full_application_session_records_and_clears() {
    let session = script(
        "greenhouse apply",
        "today: 2024-03-05",
        r#"
  - { action: fill, field: first_name, value: Ada }
  - { action: attach, field: resume, file: ada_cv.pdf }
  - action: expect
    checks:
      - { type: snapshot_present }
      - { type: unload_warning, expected: true }
      - { type: classified, expected: true, form: application }
  - { action: click, target: Submit Application }
  - action: expect
    checks:
      - { type: record_count, expected: 0 }
  - { action: submit }
  - { action: advance, ms: 10 }
  - action: expect
    checks:
      - { type: record_count, expected: 1 }
      - { type: record_field, field: company, expected: Acme Corp }
      - { type: record_field, field: workMode, expected: Remote }
      - { type: record_field, field: resume, expected: ada_cv.pdf }
      - { type: record_field, field: applicationDate, expected: 03/05/2024 }
      - { type: snapshot_absent }
      - { type: unload_warning, expected: false }
"#,
    );

    let result = ScriptRunner::default().run(&session);
    assert!(result.passed, "{:?}", result.check_results);
    assert_eq!(result.error, None);
    assert_eq!(result.steps_run, 8);
    assert_eq!(result.check_results.len(), 11);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].title, "Senior Engineer");
}

#[test]
fn reload_restores_the_draft() {
    let session = script(
        "draft survives reload",
        "",
        r#"
  - { action: fill, field: first_name, value: Grace }
  - { action: reload }
  - action: expect
    checks:
      - { type: field_value, field: first_name, expected: Grace }
      - { type: snapshot_present, form: application }
      - { type: unload_warning, expected: true }
"#,
    );

    let (result, store) = ScriptRunner::default().run_with_store(&session, Box::new(MemoryStore::new()));
    assert!(result.passed, "{:?}", result.check_results);
    assert_eq!(store.keys().unwrap(), vec!["jt_form_application".to_string()]);
}

#[test]
fn unload_step_captures_the_warning() {
    let session = script(
        "leave with unsaved input",
        "",
        r#"
  - { action: fill, field: email, value: ada@example.com }
  - { action: unload }
  - action: expect
    checks:
      - { type: unload_warning, expected: true }
"#,
    );

    assert!(ScriptRunner::default().run(&session).passed);
}

#[test]
fn rejecting_sink_keeps_the_snapshot() {
    let session = script(
        "sink says no",
        "sink: { mode: reject }",
        r#"
  - { action: fill, field: first_name, value: Ada }
  - { action: submit, form: application }
  - { action: advance, ms: 10 }
  - action: expect
    checks:
      - { type: record_count, expected: 1 }
      - { type: snapshot_present }
"#,
    );

    let result = ScriptRunner::default().run(&session);
    assert!(result.passed, "{:?}", result.check_results);
}

#[test]
fn failed_check_is_reported_with_its_step() {
    let session = script(
        "wrong expectation",
        "",
        r#"
  - { action: advance, ms: 5 }
  - action: expect
    checks:
      - { type: record_count, expected: 3 }
"#,
    );

    let result = ScriptRunner::default().run(&session);
    assert!(!result.passed);
    assert_eq!(result.error, None);
    let check = &result.check_results[0];
    assert_eq!(check.step_index, 1);
    assert_eq!(check.actual.as_deref(), Some("0"));
    assert!(check.message.as_deref().unwrap().contains("expected 3"));
}

#[test]
fn missing_control_stops_the_session() {
    let session = script(
        "typo",
        "",
        r#"
  - { action: fill, field: middle_name, value: X }
  - { action: submit }
"#,
    );

    let result = ScriptRunner::default().run(&session);
    assert!(!result.passed);
    assert_eq!(result.steps_run, 1);
    let error = result.error.unwrap();
    assert!(error.contains("Step 0"), "{}", error);
    assert!(error.contains("middle_name"), "{}", error);
}

#[test]
fn inserted_form_is_classified_and_bound() {
    let session = script(
        "late form",
        "",
        r#"
  - action: insert
    node:
      tag: form
      attrs: { id: late }
      children:
        - tag: input
          attrs: { type: file, name: cv }
        - tag: textarea
          attrs: { name: cover_letter }
        - tag: button
          children: ["Apply"]
  - { action: fill, field: cover_letter, value: Hello }
  - action: expect
    checks:
      - { type: snapshot_present, form: late }
"#,
    );

    let result = ScriptRunner::default().run(&session);
    assert!(result.passed, "{:?}", result.check_results);
}

#[test]
fn bad_today_is_an_error() {
    let session = script("bad date", "today: 15/01/2024", "  - { action: submit }\n");

    let result = ScriptRunner::default().run(&session);
    assert!(!result.passed);
    assert_eq!(result.steps_run, 0);
    assert!(result.error.unwrap().contains("15/01/2024"));
}

#[test]
fn trace_file_receives_tracker_decisions() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("trace.jsonl");
    let session = script(
        "traced",
        "",
        r#"
  - { action: submit }
  - { action: advance, ms: 10 }
"#,
    );

    let runner = ScriptRunner::default().with_trace_file(trace.display().to_string());
    assert!(runner.run(&session).passed);

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&trace)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let events: Vec<&str> = lines.iter().map(|l| l["event"].as_str().unwrap()).collect();
    assert_eq!(events, vec!["bind", "submit", "dispatch"]);
    assert_eq!(lines[1]["decision"], "Accepted");
    assert_eq!(lines[2]["form_id"], "application");
}
