use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::classifier::{JobSignals, collect_signals};
use crate::cli::config::{ResolvedSettings, SnapshotAction, resolve_date_format};
use crate::dom::dom_model::{Dom, Scope};
use crate::dom::page_loader::PageSpec;
use crate::error::TrackerError;
use crate::extract::extractor::Extractor;
use crate::page::clock::{Clock, SystemClock};
use crate::protect::manager::{clear_all_snapshots, clear_snapshot, list_snapshots};
use crate::protect::store::FileStore;
use crate::report::console::format_console_report;
use crate::report::report_model::SuiteReport;
use crate::script::runner::ScriptRunner;
use crate::script::script_model::SessionScript;
use crate::submit::sink::{HttpSink, RecordSink, SinkMessage};

// ============================================================================
// classify subcommand
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub url: String,
    pub scope: String,
    pub signals: JobSignals,
    pub signal_count: usize,
    pub is_job_application: bool,
}

pub fn classify_page(dom: &Dom, form: Option<&str>) -> Result<ClassifyReport, TrackerError> {
    let scope = resolve_scope(dom, form)?;
    let signals = collect_signals(dom, scope);
    Ok(ClassifyReport {
        url: dom.url().to_string(),
        scope: form.map_or_else(|| "document".to_string(), |f| format!("form '{}'", f)),
        signal_count: signals.count(),
        is_job_application: signals.is_job_application(),
        signals,
    })
}

pub fn cmd_classify(page: &str, form: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let dom = PageSpec::load(Path::new(page))?.build();
    let report = classify_page(&dom, form)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(
    page: &str,
    form: Option<&str>,
    date_format: Option<&str>,
    send: bool,
    settings: &ResolvedSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let dom = PageSpec::load(Path::new(page))?.build();
    let scope = resolve_scope(&dom, form)?;
    let format = resolve_date_format(date_format, settings.tracker.date_format)
        .map_err(TrackerError::InvalidArgument)?;

    let record = Extractor::new(format).extract(&dom, scope, SystemClock.today());

    if !send {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let endpoint = settings.sink_endpoint.as_deref().ok_or_else(|| {
        TrackerError::InvalidArgument("--send needs --sink-endpoint or sink.endpoint".into())
    })?;
    let mut sink = HttpSink::new(endpoint);
    let response = sink.submit(&SinkMessage::job_submitted(record))?;
    info!(endpoint, ok = response.ok, "record sent");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

// ============================================================================
// run subcommand
// ============================================================================

/// Replay session scripts and return whether all passed.
pub fn cmd_run(
    script_path: &str,
    format: &str,
    output: Option<&str>,
    settings: &ResolvedSettings,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scripts = load_scripts(script_path)?;

    if scripts.is_empty() {
        eprintln!("No session scripts found at: {}", script_path);
        return Ok(true);
    }

    info!(count = scripts.len(), "running session scripts");

    let mut runner = ScriptRunner::new(settings.tracker);
    if let Some(path) = &settings.trace_file {
        runner = runner.with_trace_file(path.as_str());
    }

    let start = std::time::Instant::now();
    let results = scripts
        .iter()
        .map(|script| {
            debug!(script = %script.name, "running");
            runner.run(script)
        })
        .collect();
    let duration = start.elapsed().as_millis();

    let report = SuiteReport::from_results(script_path, results).with_duration(duration);
    let all_passed = report.all_passed();

    let output_content = match format {
        "json" => serde_json::to_string_pretty(&report)? + "\n",
        _ => format_console_report(&report),
    };

    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

/// Load scripts from a single YAML file or a directory of YAML files.
pub fn load_scripts(path: &str) -> Result<Vec<SessionScript>, TrackerError> {
    let io_err = |source: std::io::Error| TrackerError::Io {
        path: path.to_string(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(io_err)?;
    if !metadata.is_dir() {
        let content = std::fs::read_to_string(path).map_err(io_err)?;
        return Ok(vec![SessionScript::from_yaml(&content)?]);
    }

    let mut scripts = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let p = entry.map_err(io_err)?.path();
        if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            let content = std::fs::read_to_string(&p).map_err(|source| TrackerError::Io {
                path: p.display().to_string(),
                source,
            })?;
            scripts.push(SessionScript::from_yaml(&content)?);
        }
    }
    // Sort by name for deterministic order
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

// ============================================================================
// snapshots subcommand
// ============================================================================

pub fn cmd_snapshots(
    action: &SnapshotAction,
    settings: &ResolvedSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = FileStore::open(&settings.store_dir)?;

    match action {
        SnapshotAction::List => {
            let forms = list_snapshots(&store)?;
            if forms.is_empty() {
                println!("No saved forms in {}", settings.store_dir);
            }
            for form in &forms {
                let fields = form.snapshot.as_ref().map_or(0, |s| s.data.len());
                println!(
                    "{}  {}  {} fields",
                    form.key,
                    format_timestamp(form.timestamp),
                    fields
                );
            }
        }
        SnapshotAction::Clear { key } => {
            clear_snapshot(&mut store, key)?;
            println!("Cleared {}", key);
        }
        SnapshotAction::ClearAll => {
            let removed = clear_all_snapshots(&mut store)?;
            println!("Cleared {} saved forms", removed);
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// A form by id or name, or the whole document.
pub fn resolve_scope(dom: &Dom, form: Option<&str>) -> Result<Scope, TrackerError> {
    let Some(key) = form else {
        return Ok(Scope::Document);
    };
    dom.forms()
        .into_iter()
        .find(|f| dom.attr(*f, "id") == Some(key) || dom.attr(*f, "name") == Some(key))
        .map(Scope::Form)
        .ok_or_else(|| TrackerError::ElementNotFound {
            key: key.to_string(),
            context: format!("no form with this id or name on {}", dom.url()),
        })
}

/// Milliseconds since the epoch as RFC 3339, or "unknown" for 0.
pub fn format_timestamp(ms: u64) -> String {
    if ms == 0 {
        return "unknown".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}
