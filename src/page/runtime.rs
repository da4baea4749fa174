use tracing::{debug, info};

use crate::classify::classifier::collect_signals;
use crate::dom::dom_model::{Dom, EventType, NodeId, Scope};
use crate::extract::extractor::Extractor;
use crate::page::clock::Clock;
use crate::page::timers::{TimerKind, TimerQueue};
use crate::page::tracker_config::TrackerConfig;
use crate::protect::identity::{FormIdentity, IdentityResolver};
use crate::protect::manager::ProtectionManager;
use crate::protect::store::SnapshotStore;
use crate::submit::coordinator::{
    ClickOutcome, DispatchOutcome, SubmissionCoordinator, SubmissionState, SubmitOutcome,
    classify_click,
};
use crate::submit::sink::RecordSink;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::watch::registry::BindingRegistry;
use crate::watch::watcher::DomWatcher;

/// A user-driven event delivered to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Submit { form: NodeId },
    Click { target: NodeId },
    Input { target: NodeId },
    Change { target: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// No tracker listener applies to this event.
    Unhandled,
    Submit(SubmitOutcome),
    Click(ClickOutcome),
    /// Input on a tracked form marked it dirty; `persisted` tells whether
    /// the immediate save reached the store.
    Changed { form: NodeId, persisted: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    AutoSaved { persisted: bool },
    Dispatched { form_id: FormIdentity, outcome: DispatchOutcome },
}

/// Everything the tracker keeps for one page, from injection to unload.
pub struct JobTracker {
    config: TrackerConfig,
    clock: Box<dyn Clock>,
    identities: IdentityResolver,
    registry: BindingRegistry,
    watcher: DomWatcher,
    protection: ProtectionManager,
    submission: SubmissionCoordinator,
    timers: TimerQueue,
    sink: Box<dyn RecordSink>,
    tracer: TraceLogger,
}

impl JobTracker {
    pub fn new(
        config: TrackerConfig,
        store: Box<dyn SnapshotStore>,
        sink: Box<dyn RecordSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let submission = SubmissionCoordinator::new(Extractor::new(config.date_format))
            .with_timing(config.debounce_ms, config.dispatch_delay_ms)
            .with_loading_state(config.protection.loading_state);

        Self {
            config,
            clock,
            identities: IdentityResolver::new(),
            registry: BindingRegistry::new(),
            watcher: DomWatcher::new(),
            protection: ProtectionManager::with_interval(store, config.autosave_interval_ms),
            submission,
            timers: TimerQueue::new(),
            sink,
            tracer: TraceLogger::disabled(),
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn protection(&self) -> &ProtectionManager {
        &self.protection
    }

    pub fn protection_mut(&mut self) -> &mut ProtectionManager {
        &mut self.protection
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.protection.is_dirty()
    }

    pub fn identity_of(&mut self, dom: &Dom, form: NodeId) -> FormIdentity {
        self.identities.resolve(dom, form)
    }

    /// Tear down the tracker and keep its store, as a reload would.
    pub fn into_store(self) -> Box<dyn SnapshotStore> {
        self.protection.into_store()
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    /// Install document listeners and bind every qualifying form already
    /// on the page. Returns how many forms were bound.
    pub fn initialize(&mut self, dom: &mut Dom) -> usize {
        let root = dom.root();
        dom.add_listener(root, EventType::Click);
        if self.config.protection.snapshots || self.config.protection.unload_guard {
            dom.add_listener(root, EventType::Input);
            dom.add_listener(root, EventType::Change);
        }
        if self.config.protection.unload_guard {
            dom.add_listener(root, EventType::BeforeUnload);
            self.protection.install_unload_guard();
        }

        let forms = self.watcher.initial_forms(dom);
        self.bind_all(dom, forms)
    }

    /// React to DOM insertions since the last scan. Safe to call any
    /// number of times; bound forms stay bound exactly once.
    pub fn rescan(&mut self, dom: &mut Dom) -> usize {
        let forms = self.watcher.rescan(dom);
        debug!(scan = self.watcher.scans(), candidates = forms.len(), "dom rescanned");
        self.bind_all(dom, forms)
    }

    fn bind_all(&mut self, dom: &mut Dom, forms: Vec<NodeId>) -> usize {
        forms
            .into_iter()
            .filter(|form| self.bind_form(dom, *form))
            .count()
    }

    fn bind_form(&mut self, dom: &mut Dom, form: NodeId) -> bool {
        let signals = collect_signals(dom, Scope::Form(form));
        if !signals.is_job_application() {
            debug!(form = form.0, signals = signals.count(), "form is not a job application");
            return false;
        }

        let identity = self.identities.resolve(dom, form);
        if self.registry.contains(&identity) {
            return false;
        }

        let now = self.clock.now_ms();
        let restored =
            self.config.protection.snapshots && self.protection.restore_form_data(dom, form, &identity);
        if self.config.autosave_enabled() {
            self.protection
                .start_auto_save(form, identity.clone(), &mut self.timers, now);
        }

        dom.add_listener(form, EventType::Submit);
        self.registry.register(identity.clone(), form, now);
        info!(form_id = %identity, signals = signals.count(), "job application form bound");
        let mut event = TraceEvent::at(now, "bind")
            .with_form(&identity)
            .with_signal_count(signals.count());
        if restored {
            event = event.with_detail("snapshot restored");
        }
        self.tracer.log(&event);
        true
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn dispatch(&mut self, dom: &mut Dom, event: PageEvent) -> EventOutcome {
        match event {
            PageEvent::Submit { form } => self.on_submit(dom, form),
            PageEvent::Click { target } => {
                if !dom.has_listener(dom.root(), EventType::Click) {
                    return EventOutcome::Unhandled;
                }
                EventOutcome::Click(classify_click(dom, target))
            }
            PageEvent::Input { target } | PageEvent::Change { target } => self.on_input(dom, target),
        }
    }

    fn on_submit(&mut self, dom: &mut Dom, form: NodeId) -> EventOutcome {
        if !dom.has_listener(form, EventType::Submit) {
            return EventOutcome::Unhandled;
        }
        let identity = self.identities.resolve(dom, form);
        let now = self.clock.now_ms();
        let today = self.clock.today();

        let outcome = self.submission.handle_submit(
            dom,
            form,
            identity.clone(),
            &mut self.protection,
            &mut self.timers,
            now,
            today,
        );
        self.tracer.log(
            &TraceEvent::at(now, "submit")
                .with_form(&identity)
                .with_decision(outcome.decision),
        );
        EventOutcome::Submit(outcome)
    }

    fn on_input(&mut self, dom: &mut Dom, target: NodeId) -> EventOutcome {
        if !dom.has_listener(dom.root(), EventType::Input) {
            return EventOutcome::Unhandled;
        }
        let Some(form) = dom.closest(target, "form") else {
            return EventOutcome::Unhandled;
        };
        let Some(identity) = self.registry.identity_of(form).cloned() else {
            return EventOutcome::Unhandled;
        };

        self.protection.mark_dirty();
        let persisted = if self.config.protection.snapshots {
            let now = self.clock.now_ms();
            self.protection.save_form_data(dom, form, &identity, now)
        } else {
            false
        };
        EventOutcome::Changed { form, persisted }
    }

    /// Fire every timer due at the current page time.
    pub fn poll_timers(&mut self, dom: &mut Dom) -> Vec<TimerOutcome> {
        let now = self.clock.now_ms();
        let mut fired = Vec::new();
        while let Some((_, kind)) = self.timers.pop_due(now) {
            match kind {
                TimerKind::AutoSave => {
                    let persisted =
                        self.protection
                            .on_auto_save_tick(dom, self.submission.is_submitting(), now);
                    fired.push(TimerOutcome::AutoSaved { persisted });
                }
                TimerKind::Dispatch => {
                    let result = self.submission.dispatch_pending(
                        dom,
                        &mut self.protection,
                        self.sink.as_mut(),
                    );
                    if let Some((form_id, outcome)) = result {
                        self.tracer.log(
                            &TraceEvent::at(now, "dispatch")
                                .with_form(&form_id)
                                .with_decision(&outcome),
                        );
                        fired.push(TimerOutcome::Dispatched { form_id, outcome });
                    }
                }
            }
        }
        fired
    }

    /// Warning to show if the page is about to unload.
    pub fn before_unload(&self) -> Option<&'static str> {
        self.protection
            .before_unload(self.submission.is_submitting())
    }

    /// Page teardown: stop autosave and drop the unload guard. A
    /// dispatched submission is left to finish.
    pub fn unload(&mut self, dom: &mut Dom) {
        self.protection.stop_auto_save(&mut self.timers);
        self.protection.remove_unload_guard();
        dom.remove_listener(dom.root(), EventType::BeforeUnload);
        debug!("page unloaded");
    }
}
