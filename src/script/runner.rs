use chrono::NaiveDate;
use tracing::debug;

use crate::classify::classifier::{control_label, is_clickable, is_likely_job_application};
use crate::dom::dom_model::{Dom, NodeId, Scope};
use crate::dom::field::{FieldValue, read_value, write_value};
use crate::dom::page_loader::build_node;
use crate::error::TrackerError;
use crate::page::clock::ManualClock;
use crate::page::runtime::{JobTracker, PageEvent};
use crate::page::tracker_config::TrackerConfig;
use crate::protect::store::{MemoryStore, SnapshotStore};
use crate::script::context::ScriptContext;
use crate::script::script_model::{
    CheckResult, Expectation, ScriptResult, ScriptStep, SessionScript, SinkBehaviour,
};
use crate::submit::sink::{MemorySink, SinkLog};
use crate::trace::logger::TraceLogger;

/// Page time at the start of every session (2023-11-14T22:13:20Z).
pub const DEFAULT_START_MS: u64 = 1_700_000_000_000;

/// Replays session scripts against a fresh tracker with a manual clock.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    config: TrackerConfig,
    start_ms: u64,
    trace_file: Option<String>,
}

impl ScriptRunner {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            start_ms: DEFAULT_START_MS,
            trace_file: None,
        }
    }

    /// Append tracker decisions of every session to a JSONL file.
    pub fn with_trace_file(mut self, path: impl Into<String>) -> Self {
        self.trace_file = Some(path.into());
        self
    }

    /// Run a script against an empty in-memory store.
    pub fn run(&self, script: &SessionScript) -> ScriptResult {
        self.run_with_store(script, Box::new(MemoryStore::new())).0
    }

    /// Run a script against `store` and hand the store back afterwards,
    /// so snapshots left behind can be inspected or kept.
    pub fn run_with_store(
        &self,
        script: &SessionScript,
        store: Box<dyn SnapshotStore>,
    ) -> (ScriptResult, Box<dyn SnapshotStore>) {
        let today = match parse_today(script.today.as_deref()) {
            Ok(today) => today,
            Err(e) => return (failed(script, 0, Vec::new(), Vec::new(), e), store),
        };

        let config = script.tracker.unwrap_or(self.config);
        let clock = ManualClock::new(self.start_ms, today);
        let env = SessionEnv {
            script,
            config,
            trace_file: self.trace_file.as_deref(),
        };
        let mut session = Session::start(env, clock, SinkLog::default(), store);
        let mut ctx = ScriptContext::new();

        for (i, step) in script.steps.iter().enumerate() {
            ctx.current_step = i;
            debug!(script = %script.name, step = i, "replaying step");

            let outcome = match step {
                ScriptStep::Reload => {
                    session = session.reload();
                    Ok(())
                }
                _ => session.execute(step, i, &mut ctx),
            };

            if let Err(e) = outcome {
                let records = session.log.records();
                let store = session.into_store();
                return (
                    failed(script, i + 1, ctx.check_results, records, e),
                    store,
                );
            }
        }

        let result = ScriptResult {
            script_name: script.name.clone(),
            passed: ctx.all_passed(),
            steps_run: script.steps.len(),
            check_results: ctx.check_results,
            records: session.log.records(),
            error: None,
        };
        (result, session.into_store())
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

fn parse_today(today: Option<&str>) -> Result<NaiveDate, TrackerError> {
    match today {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| TrackerError::InvalidArgument(format!("today '{}': {}", text, e))),
        None => NaiveDate::from_ymd_opt(2024, 1, 15)
            .ok_or_else(|| TrackerError::InvalidArgument("default date".into())),
    }
}

fn failed(
    script: &SessionScript,
    steps_run: usize,
    check_results: Vec<CheckResult>,
    records: Vec<crate::extract::record::JobRecord>,
    error: TrackerError,
) -> ScriptResult {
    let error = if steps_run == 0 {
        error.to_string()
    } else {
        format!("Step {} failed: {}", steps_run - 1, error)
    };
    ScriptResult {
        script_name: script.name.clone(),
        passed: false,
        steps_run,
        check_results,
        records,
        error: Some(error),
    }
}

fn make_sink(behaviour: SinkBehaviour, log: SinkLog) -> MemorySink {
    let sink = match behaviour {
        SinkBehaviour::Accept => MemorySink::new(),
        SinkBehaviour::Reject => MemorySink::rejecting("rejected by sink"),
        SinkBehaviour::Unreachable => MemorySink::unreachable(),
    };
    sink.with_log(log)
}

// ============================================================================
// Live session
// ============================================================================

/// What stays fixed across reloads of one session.
#[derive(Clone, Copy)]
struct SessionEnv<'a> {
    script: &'a SessionScript,
    config: TrackerConfig,
    trace_file: Option<&'a str>,
}

struct Session<'a> {
    env: SessionEnv<'a>,
    clock: ManualClock,
    log: SinkLog,
    dom: Dom,
    tracker: JobTracker,
    unloaded: bool,
    unload_warning: Option<String>,
}

impl<'a> Session<'a> {
    fn start(
        env: SessionEnv<'a>,
        clock: ManualClock,
        log: SinkLog,
        store: Box<dyn SnapshotStore>,
    ) -> Self {
        let mut dom = env.script.page.build();
        let sink = make_sink(env.script.sink, log.clone());
        let mut tracker =
            JobTracker::new(env.config, store, Box::new(sink), Box::new(clock.clone()));
        if let Some(path) = env.trace_file {
            tracker = tracker.with_tracer(TraceLogger::new(path));
        }
        tracker.initialize(&mut dom);

        Self {
            env,
            clock,
            log,
            dom,
            tracker,
            unloaded: false,
            unload_warning: None,
        }
    }

    /// Tear the page down and load it again. Only the store survives.
    fn reload(mut self) -> Self {
        self.tracker.unload(&mut self.dom);
        let store = self.tracker.into_store();
        Self::start(self.env, self.clock, self.log, store)
    }

    fn into_store(self) -> Box<dyn SnapshotStore> {
        self.tracker.into_store()
    }

    fn execute(
        &mut self,
        step: &ScriptStep,
        step_index: usize,
        ctx: &mut ScriptContext,
    ) -> Result<(), TrackerError> {
        match step {
            ScriptStep::Fill { field, value, form } => {
                let control = self.control(form.as_deref(), field)?;
                self.dom.set_value(control, value);
                self.tracker
                    .dispatch(&mut self.dom, PageEvent::Input { target: control });
                Ok(())
            }

            ScriptStep::Check {
                field,
                checked,
                value,
                form,
            } => {
                let control = match value {
                    Some(value) => self.radio(form.as_deref(), field, value)?,
                    None => self.control(form.as_deref(), field)?,
                };
                if *checked && self.dom.input_type(control) == "radio" {
                    let root = self.dom.closest(control, "form").unwrap_or(self.dom.root());
                    for other in self.dom.controls_named(root, field) {
                        self.dom.set_checked(other, false);
                    }
                }
                self.dom.set_checked(control, *checked);
                self.tracker
                    .dispatch(&mut self.dom, PageEvent::Change { target: control });
                Ok(())
            }

            ScriptStep::Select {
                field,
                option,
                form,
            } => {
                let control = self.control(form.as_deref(), field)?;
                let known = self.dom.options(control).into_iter().any(|o| {
                    self.dom.option_value(o) == *option || self.dom.normalized_text(o) == *option
                });
                if !known {
                    return Err(TrackerError::ElementNotFound {
                        key: option.clone(),
                        context: format!("no such option in '{}'", field),
                    });
                }
                write_value(&mut self.dom, control, &FieldValue::Text(option.clone()));
                self.tracker
                    .dispatch(&mut self.dom, PageEvent::Change { target: control });
                Ok(())
            }

            ScriptStep::Attach { field, file, form } => {
                let control = self.control(form.as_deref(), field)?;
                self.dom.attach_file(control, file);
                self.tracker
                    .dispatch(&mut self.dom, PageEvent::Change { target: control });
                Ok(())
            }

            ScriptStep::Submit { form } => {
                let form = self.form(form.as_deref())?;
                let outcome = self.tracker.dispatch(&mut self.dom, PageEvent::Submit { form });
                debug!(?outcome, "submit replayed");
                Ok(())
            }

            ScriptStep::Click { target } => {
                let node = self.click_target(target)?;
                let outcome = self
                    .tracker
                    .dispatch(&mut self.dom, PageEvent::Click { target: node });
                debug!(?outcome, "click replayed");
                Ok(())
            }

            ScriptStep::Advance { ms } => {
                self.clock.advance(*ms);
                self.tracker.poll_timers(&mut self.dom);
                Ok(())
            }

            ScriptStep::Insert { parent, node } => {
                let parent = match parent {
                    Some(id) => self.dom.by_id(self.dom.root(), id).ok_or_else(|| {
                        TrackerError::ElementNotFound {
                            key: id.clone(),
                            context: "insert parent".into(),
                        }
                    })?,
                    None => self.dom.body(),
                };
                build_node(&mut self.dom, parent, node);
                self.tracker.rescan(&mut self.dom);
                Ok(())
            }

            // Handled by the run loop, which owns the session.
            ScriptStep::Reload => Ok(()),

            ScriptStep::Unload => {
                self.unload_warning = self.tracker.before_unload().map(str::to_string);
                self.tracker.unload(&mut self.dom);
                self.unloaded = true;
                ctx.last_unload_warning = self.unload_warning.clone();
                Ok(())
            }

            ScriptStep::Expect { checks } => {
                let results = checks
                    .iter()
                    .map(|check| self.evaluate(check, step_index))
                    .collect();
                ctx.record_checks(results);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    fn form(&self, key: Option<&str>) -> Result<NodeId, TrackerError> {
        let forms = self.dom.forms();
        let found = match key {
            None => forms.first().copied(),
            Some(key) => forms.into_iter().find(|f| {
                self.dom.attr(*f, "id") == Some(key) || self.dom.attr(*f, "name") == Some(key)
            }),
        };
        found.ok_or_else(|| TrackerError::ElementNotFound {
            key: key.unwrap_or("form").to_string(),
            context: "no matching form on the page".into(),
        })
    }

    /// A control by name or id, inside `form` or anywhere on the page.
    fn control(&self, form: Option<&str>, field: &str) -> Result<NodeId, TrackerError> {
        let root = match form {
            Some(_) => self.form(form)?,
            None => self.dom.root(),
        };
        self.dom
            .find_control(root, field)
            .ok_or_else(|| TrackerError::ElementNotFound {
                key: field.to_string(),
                context: "no control with this name or id".into(),
            })
    }

    fn radio(&self, form: Option<&str>, field: &str, value: &str) -> Result<NodeId, TrackerError> {
        let root = match form {
            Some(_) => self.form(form)?,
            None => self.dom.root(),
        };
        self.dom
            .controls_named(root, field)
            .into_iter()
            .find(|id| self.dom.control(*id).is_some_and(|c| c.value == value))
            .ok_or_else(|| TrackerError::ElementNotFound {
                key: format!("{}={}", field, value),
                context: "no radio with this value".into(),
            })
    }

    /// An element by id, else the first button or link whose label matches.
    fn click_target(&self, target: &str) -> Result<NodeId, TrackerError> {
        let root = self.dom.root();
        if let Some(id) = self.dom.by_id(root, target) {
            return Ok(id);
        }
        let wanted = target.trim().to_lowercase();
        self.dom
            .descendants(root)
            .into_iter()
            .filter(|id| is_clickable(&self.dom, *id) || self.dom.is_tag(*id, "a"))
            .find(|id| control_label(&self.dom, *id) == wanted)
            .ok_or_else(|| TrackerError::ElementNotFound {
                key: target.to_string(),
                context: "nothing clickable with this id or label".into(),
            })
    }

    // ------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------

    fn evaluate(&mut self, expectation: &Expectation, step_index: usize) -> CheckResult {
        let result = |passed: bool, actual: Option<String>, message: String| CheckResult {
            step_index,
            expectation: expectation.clone(),
            passed,
            actual,
            message: if passed { None } else { Some(message) },
        };

        match expectation {
            Expectation::RecordCount { expected } => {
                let count = self.log.len();
                result(
                    count == *expected,
                    Some(count.to_string()),
                    format!("sink received {} records but expected {}", count, expected),
                )
            }

            Expectation::RecordField {
                field,
                expected,
                index,
            } => {
                let records = self.log.records();
                let record = match index {
                    Some(i) => records.get(*i),
                    None => records.last(),
                };
                let Some(record) = record else {
                    return result(false, None, "no such record".into());
                };
                match record.field(field) {
                    Some(actual) => result(
                        actual == expected.as_str(),
                        Some(actual.to_string()),
                        format!("record {} is '{}', expected '{}'", field, actual, expected),
                    ),
                    None => result(false, None, format!("records have no field '{}'", field)),
                }
            }

            Expectation::SnapshotPresent { form } | Expectation::SnapshotAbsent { form } => {
                let want_present = matches!(expectation, Expectation::SnapshotPresent { .. });
                let node = match self.form(form.as_deref()) {
                    Ok(node) => node,
                    Err(e) => return result(false, None, e.to_string()),
                };
                let identity = self.tracker.identity_of(&self.dom, node);
                let present = self.tracker.protection().load_snapshot(&identity).is_some();
                result(
                    present == want_present,
                    Some(format!("{} present={}", identity.storage_key(), present)),
                    if want_present {
                        format!("no snapshot stored for '{}'", identity)
                    } else {
                        format!("snapshot for '{}' is still stored", identity)
                    },
                )
            }

            Expectation::UnloadWarning { expected } => {
                let warning = if self.unloaded {
                    self.unload_warning.clone()
                } else {
                    self.tracker.before_unload().map(str::to_string)
                };
                let warns = warning.is_some();
                result(
                    warns == *expected,
                    warning,
                    format!("unload warning shown={} but expected {}", warns, expected),
                )
            }

            Expectation::Classified { expected, form } => {
                let scope = match form {
                    Some(_) => match self.form(form.as_deref()) {
                        Ok(node) => Scope::Form(node),
                        Err(e) => return result(false, None, e.to_string()),
                    },
                    None => Scope::Document,
                };
                let verdict = is_likely_job_application(&self.dom, scope);
                result(
                    verdict == *expected,
                    Some(verdict.to_string()),
                    format!("classified as {} but expected {}", verdict, expected),
                )
            }

            Expectation::FieldValue {
                field,
                expected,
                form,
            } => match self.control(form.as_deref(), field) {
                Ok(control) => {
                    let actual = read_value(&self.dom, control);
                    result(
                        actual == *expected,
                        Some(actual.clone()),
                        format!("'{}' shows '{}', expected '{}'", field, actual, expected),
                    )
                }
                Err(e) => result(false, None, e.to_string()),
            },
        }
    }
}
