use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::classify::classifier::{control_label, is_likely_job_application};
use crate::classify::keywords::includes_any;
use crate::dom::dom_model::{Dom, NodeId, Scope};
use crate::extract::extractor::Extractor;
use crate::extract::record::JobRecord;
use crate::page::timers::{TimerKind, TimerQueue};
use crate::protect::identity::FormIdentity;
use crate::protect::manager::ProtectionManager;
use crate::submit::loading::{LoadingState, add_loading_state, remove_loading_state};
use crate::submit::sink::{RecordSink, SinkMessage};

pub const DEBOUNCE_MS: u64 = 8000;
pub const DISPATCH_DELAY_MS: u64 = 10;

const CLICK_PHRASES: &[&str] = &[
    "apply",
    "submit",
    "send application",
    "apply now",
    "submit application",
];

/// Process-wide submission flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub is_submitting: bool,
    pub last_submit_at: Option<u64>,
}

/// Why a submit event did or did not start a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitDecision {
    Accepted,
    NotJobApplication,
    /// Another submission is still in flight; the event's default action
    /// is cancelled.
    InFlight,
    /// Too soon after the last accepted submission.
    Debounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub decision: SubmitDecision,
    pub default_prevented: bool,
}

/// How a dispatched record fared at the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Recorded,
    Rejected(Option<String>),
    Failed(String),
}

/// What a click on the page amounted to. A click never produces a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    /// A submit control inside a form; its submit event does the work.
    DeferredToSubmit,
    /// An apply/submit button that does not submit a form.
    ApplyWithoutForm,
}

#[derive(Debug, Clone)]
struct PendingDispatch {
    form: NodeId,
    identity: FormIdentity,
    record: JobRecord,
    loading: Option<LoadingState>,
}

/// Single-flight submission state machine: `Idle → Submitting → Idle`.
#[derive(Debug)]
pub struct SubmissionCoordinator {
    state: SubmissionState,
    pending: Option<PendingDispatch>,
    debounce_ms: u64,
    dispatch_delay_ms: u64,
    loading_state: bool,
    extractor: Extractor,
}

impl SubmissionCoordinator {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            state: SubmissionState::default(),
            pending: None,
            debounce_ms: DEBOUNCE_MS,
            dispatch_delay_ms: DISPATCH_DELAY_MS,
            loading_state: true,
            extractor,
        }
    }

    pub fn with_timing(mut self, debounce_ms: u64, dispatch_delay_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self.dispatch_delay_ms = dispatch_delay_ms;
        self
    }

    pub fn with_loading_state(mut self, enabled: bool) -> Self {
        self.loading_state = enabled;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting
    }

    /// Record built for the submission currently waiting to be dispatched.
    pub fn pending_record(&self) -> Option<&JobRecord> {
        self.pending.as_ref().map(|p| &p.record)
    }

    /// Run the gates in order: classifier, in-flight, debounce.
    pub fn gate(&self, dom: &Dom, form: NodeId, now_ms: u64) -> SubmitDecision {
        if !is_likely_job_application(dom, Scope::Form(form)) {
            return SubmitDecision::NotJobApplication;
        }
        if self.state.is_submitting {
            return SubmitDecision::InFlight;
        }
        if let Some(last) = self.state.last_submit_at {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return SubmitDecision::Debounced;
            }
        }
        SubmitDecision::Accepted
    }

    /// Handle a genuine submit event on `form`.
    ///
    /// On acceptance the debounce timestamp and loading state are set
    /// before the record is extracted, and dispatch is scheduled after
    /// the fixed settle delay.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_submit(
        &mut self,
        dom: &mut Dom,
        form: NodeId,
        identity: FormIdentity,
        protection: &mut ProtectionManager,
        timers: &mut TimerQueue,
        now_ms: u64,
        today: NaiveDate,
    ) -> SubmitOutcome {
        let decision = self.gate(dom, form, now_ms);
        if decision != SubmitDecision::Accepted {
            debug!(form_id = %identity, ?decision, "submit not accepted");
            return SubmitOutcome {
                decision,
                default_prevented: decision == SubmitDecision::InFlight,
            };
        }

        self.state.last_submit_at = Some(now_ms);
        self.state.is_submitting = true;

        let loading = if self.loading_state {
            add_loading_state(dom, form)
        } else {
            None
        };

        protection.stop_auto_save(timers);

        let record = self.extractor.extract(dom, Scope::Form(form), today);
        info!(form_id = %identity, company = %record.company, title = %record.title, "job application submitted");

        self.pending = Some(PendingDispatch {
            form,
            identity,
            record,
            loading,
        });
        timers.set_timeout(now_ms, self.dispatch_delay_ms, TimerKind::Dispatch);

        SubmitOutcome {
            decision,
            default_prevented: false,
        }
    }

    /// Send the pending record to the sink and return to idle.
    ///
    /// On `{ ok: true }` the form's snapshot is cleared. Whatever the sink
    /// says, the in-flight flag is reset and the submit control restored.
    pub fn dispatch_pending(
        &mut self,
        dom: &mut Dom,
        protection: &mut ProtectionManager,
        sink: &mut dyn RecordSink,
    ) -> Option<(FormIdentity, DispatchOutcome)> {
        let pending = self.pending.take()?;
        let message = SinkMessage::job_submitted(pending.record);

        let outcome = match sink.submit(&message) {
            Ok(resp) if resp.ok => {
                protection.clear_form_data(&pending.identity);
                protection.mark_clean();
                info!(form_id = %pending.identity, "application recorded, form data cleared");
                DispatchOutcome::Recorded
            }
            Ok(resp) => {
                warn!(form_id = %pending.identity, error = ?resp.error, "sink rejected application");
                DispatchOutcome::Rejected(resp.error)
            }
            Err(e) => {
                warn!(form_id = %pending.identity, error = %e, "submission failed");
                DispatchOutcome::Failed(e.to_string())
            }
        };

        self.state.is_submitting = false;
        if let Some(loading) = &pending.loading {
            remove_loading_state(dom, loading);
        }
        debug!(form = pending.form.0, "submission settled");

        Some((pending.identity, outcome))
    }
}

/// Classify a click for the secondary apply-button heuristic.
pub fn classify_click(dom: &Dom, target: NodeId) -> ClickOutcome {
    let label = control_label(dom, target);
    if label.is_empty() || !includes_any(&label, CLICK_PHRASES) {
        return ClickOutcome::Ignored;
    }

    let submits = match dom.tag(target) {
        Some("button") => matches!(dom.input_type(target).as_str(), "submit" | ""),
        Some("input") => dom.input_type(target) == "submit",
        _ => false,
    };
    if submits && dom.closest(target, "form").is_some() {
        return ClickOutcome::DeferredToSubmit;
    }

    info!("apply button clicked, waiting for an actual form submission");
    ClickOutcome::ApplyWithoutForm
}
