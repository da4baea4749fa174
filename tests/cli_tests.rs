use clap::Parser;
use job_tracker::cli::commands::{classify_page, format_timestamp, load_scripts, resolve_scope};
use job_tracker::cli::config::{
    AppConfig, Cli, Commands, DEFAULT_STORE_DIR, SnapshotAction, load_config, resolve_date_format,
    resolve_settings,
};
use job_tracker::dom::dom_model::Scope;
use job_tracker::dom::page_loader::PageSpec;
use job_tracker::extract::record::DateFormat;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_classify() {
    let cli = Cli::parse_from(["job-tracker", "classify", "--page", "page.yaml", "--form", "apply"]);
    match cli.command {
        Commands::Classify { page, form } => {
            assert_eq!(page, "page.yaml");
            assert_eq!(form.as_deref(), Some("apply"));
        }
        _ => panic!("Expected Classify command"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_parse_extract_defaults() {
    let cli = Cli::parse_from(["job-tracker", "extract", "--page", "page.json"]);
    match cli.command {
        Commands::Extract {
            page,
            form,
            date_format,
            send,
        } => {
            assert_eq!(page, "page.json");
            assert!(form.is_none());
            assert!(date_format.is_none());
            assert!(!send);
        }
        _ => panic!("Expected Extract command"),
    }
}

#[test]
fn cli_parse_extract_send_with_endpoint() {
    let cli = Cli::parse_from([
        "job-tracker",
        "extract",
        "--page",
        "page.json",
        "--date-format",
        "iso",
        "--send",
        "--sink-endpoint",
        "http://localhost:8080/applications",
    ]);
    match cli.command {
        Commands::Extract {
            date_format, send, ..
        } => {
            assert_eq!(date_format.as_deref(), Some("iso"));
            assert!(send);
        }
        _ => panic!("Expected Extract command"),
    }
    assert_eq!(
        cli.sink_endpoint.as_deref(),
        Some("http://localhost:8080/applications")
    );
}

#[test]
fn cli_parse_run_defaults() {
    let cli = Cli::parse_from(["job-tracker", "run", "--script", "sessions/"]);
    match cli.command {
        Commands::Run {
            script,
            format,
            output,
        } => {
            assert_eq!(script, "sessions/");
            assert_eq!(format, "console");
            assert!(output.is_none());
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn cli_parse_run_with_output() {
    let cli = Cli::parse_from([
        "job-tracker",
        "run",
        "--script",
        "a.yaml",
        "--format",
        "json",
        "-o",
        "out.json",
    ]);
    match cli.command {
        Commands::Run { format, output, .. } => {
            assert_eq!(format, "json");
            assert_eq!(output.as_deref(), Some("out.json"));
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn cli_parse_snapshot_actions() {
    let list = Cli::parse_from(["job-tracker", "snapshots", "list"]);
    let clear = Cli::parse_from(["job-tracker", "snapshots", "clear", "jt_form_apply"]);
    let clear_all = Cli::parse_from(["job-tracker", "snapshots", "clear-all"]);

    let action = |cli: Cli| match cli.command {
        Commands::Snapshots { action } => action,
        _ => panic!("Expected Snapshots command"),
    };
    assert_eq!(action(list), SnapshotAction::List);
    assert_eq!(
        action(clear),
        SnapshotAction::Clear {
            key: "jt_form_apply".into()
        }
    );
    assert_eq!(action(clear_all), SnapshotAction::ClearAll);
}

#[test]
fn cli_global_flags_after_subcommand() {
    let cli = Cli::parse_from([
        "job-tracker",
        "snapshots",
        "list",
        "-vv",
        "--store-dir",
        "/tmp/forms",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.store_dir.as_deref(), Some("/tmp/forms"));
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
}

#[test]
fn cli_missing_subcommand_fails() {
    assert!(Cli::try_parse_from(["job-tracker"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_missing_file_gives_defaults() {
    let config = load_config(Some("/nonexistent/job-tracker.yaml"));
    assert_eq!(config.tracker.debounce_ms, 8000);
    assert_eq!(config.store.dir, DEFAULT_STORE_DIR);
    assert!(config.sink.endpoint.is_none());
}

#[test]
fn config_partial_yaml_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job-tracker.yaml");
    std::fs::write(
        &path,
        "tracker:\n  debounce_ms: 5000\n  date_format: iso\n  protection:\n    autosave: false\nsink:\n  endpoint: http://localhost:9000\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.tracker.debounce_ms, 5000);
    assert_eq!(config.tracker.autosave_interval_ms, 3000);
    assert_eq!(config.tracker.date_format, DateFormat::Iso);
    assert!(!config.tracker.protection.autosave);
    assert!(config.tracker.protection.snapshots);
    assert!(!config.tracker.autosave_enabled());
    assert_eq!(config.sink.endpoint.as_deref(), Some("http://localhost:9000"));
    assert_eq!(config.store.dir, DEFAULT_STORE_DIR);
}

#[test]
fn config_malformed_yaml_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "tracker: [not, a, map").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.tracker.debounce_ms, 8000);
}

#[test]
fn cli_flags_override_config_file() {
    let mut config = AppConfig::default();
    config.store.dir = "from-config".into();
    config.sink.endpoint = Some("http://config".into());
    config.trace_file = Some("trace.jsonl".into());

    let cli = Cli::parse_from(["job-tracker", "snapshots", "list", "--store-dir", "from-cli"]);
    let settings = resolve_settings(&cli, &config);
    assert_eq!(settings.store_dir, "from-cli");
    assert_eq!(settings.sink_endpoint.as_deref(), Some("http://config"));
    assert_eq!(settings.trace_file.as_deref(), Some("trace.jsonl"));

    let cli = Cli::parse_from(["job-tracker", "snapshots", "list", "--sink-endpoint", "http://cli"]);
    let settings = resolve_settings(&cli, &config);
    assert_eq!(settings.store_dir, "from-config");
    assert_eq!(settings.sink_endpoint.as_deref(), Some("http://cli"));
}

#[test]
fn date_format_flag_wins() {
    assert_eq!(resolve_date_format(None, DateFormat::Iso), Ok(DateFormat::Iso));
    assert_eq!(resolve_date_format(Some("US"), DateFormat::Iso), Ok(DateFormat::Us));
    assert!(resolve_date_format(Some("european"), DateFormat::Us).is_err());
}

// ============================================================================
// Command helpers
// ============================================================================

const SCRIPT_A: &str = r#"
name: b second
page: { url: "https://example.com/jobs/1" }
steps: []
"#;

const SCRIPT_B: &str = r#"
name: a first
page: { url: "https://example.com/jobs/2" }
steps: []
"#;

#[test]
fn load_scripts_from_directory_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1.yaml"), SCRIPT_A).unwrap();
    std::fs::write(dir.path().join("2.yml"), SCRIPT_B).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let scripts = load_scripts(dir.path().to_str().unwrap()).unwrap();
    let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a first", "b second"]);
}

#[test]
fn load_scripts_single_file_and_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.yaml");
    std::fs::write(&path, SCRIPT_A).unwrap();

    assert_eq!(load_scripts(path.to_str().unwrap()).unwrap().len(), 1);
    assert!(load_scripts("/nonexistent/scripts").is_err());
}

#[test]
fn timestamps_render_as_rfc3339() {
    assert_eq!(format_timestamp(0), "unknown");
    assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14T22:13:20+00:00");
}

#[test]
fn classify_report_for_a_form_and_the_page() {
    let spec = PageSpec::from_yaml(
        r#"
url: https://jobs.lever.co/acme/1
body:
  - tag: form
    attrs: { name: apply }
    children:
      - tag: input
        attrs: { type: file, name: resume }
      - tag: button
        children: ["Submit application"]
"#,
    )
    .unwrap();
    let dom = spec.build();

    let report = classify_page(&dom, Some("apply")).unwrap();
    assert_eq!(report.scope, "form 'apply'");
    assert!(report.signals.resume_input);
    assert!(report.is_job_application);
    assert_eq!(report.signal_count, report.signals.count());

    assert!(matches!(resolve_scope(&dom, None), Ok(Scope::Document)));
    assert!(classify_page(&dom, Some("missing")).is_err());
}
