#![allow(dead_code)]

use chrono::NaiveDate;

use job_tracker::{
    dom::dom_model::{Dom, NodeId},
    page::{
        clock::ManualClock,
        runtime::{EventOutcome, JobTracker, PageEvent, TimerOutcome},
        tracker_config::TrackerConfig,
    },
    protect::store::{MemoryStore, SnapshotStore},
    submit::{
        coordinator::SubmitOutcome,
        sink::{MemorySink, SinkLog},
    },
};

pub const GREENHOUSE_URL: &str = "https://boards.greenhouse.io/acme/jobs/12345";
pub const START_MS: u64 = 1_000_000;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date")
}

// ============================================================================
// Pages
// ============================================================================

/// Greenhouse-hosted application: labelled company field, four other
/// text fields, resume upload, cover letter, checkbox, select and a
/// "Submit Application" button. Returns the page and its form.
pub fn greenhouse_page() -> (Dom, NodeId) {
    let mut dom = Dom::new(GREENHOUSE_URL, "Senior Engineer - Acme");
    let head = dom.head();
    dom.create_element(head, "meta", &[("property", "og:title"), ("content", "Senior Engineer")]);

    let body = dom.body();
    let header = dom.create_element(body, "header", &[]);
    let logo = dom.create_element(header, "div", &[("class", "logo")]);
    dom.create_text(logo, "Acme");
    let h1 = dom.create_element(body, "h1", &[]);
    dom.create_text(h1, "Senior Engineer");
    let location = dom.create_element(body, "div", &[("class", "job-location")]);
    dom.create_text(location, "Berlin");
    let blurb = dom.create_element(body, "p", &[]);
    dom.create_text(blurb, "This role is hybrid, two days a week in the office.");

    let form = dom.create_element(
        body,
        "form",
        &[("id", "application"), ("action", "/acme/jobs/12345/apply")],
    );
    let label = dom.create_element(form, "label", &[("for", "f1")]);
    dom.create_text(label, "Company Name");
    dom.create_element(form, "input", &[("id", "f1"), ("name", "company"), ("value", "Acme Corp")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "first_name")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "last_name")]);
    dom.create_element(form, "input", &[("type", "email"), ("name", "email")]);
    dom.create_element(form, "input", &[("type", "tel"), ("name", "phone")]);
    dom.create_element(form, "input", &[("type", "file"), ("name", "resume"), ("id", "resume")]);
    dom.create_element(form, "textarea", &[("name", "cover_letter")]);
    dom.create_element(form, "input", &[("type", "checkbox"), ("name", "sponsorship")]);

    let select = dom.create_element(form, "select", &[("name", "source")]);
    for (value, text) in [("", "Choose one"), ("linkedin", "LinkedIn"), ("referral", "Referral")] {
        let option = dom.create_element(select, "option", &[("value", value)]);
        dom.create_text(option, text);
    }

    let button = dom.create_element(form, "button", &[("type", "submit"), ("id", "submit")]);
    dom.create_text(button, "Submit Application");

    dom.take_added();
    (dom, form)
}

/// Sign-in form on a careers subdomain: five fields, a submit button
/// and a password field.
pub fn login_page() -> (Dom, NodeId) {
    let mut dom = Dom::new("https://careers.example.com/login", "Sign in");
    let body = dom.body();
    let heading = dom.create_element(body, "h2", &[]);
    dom.create_text(heading, "Sign in");

    let form = dom.create_element(body, "form", &[("id", "login")]);
    dom.create_element(form, "input", &[("type", "email"), ("name", "email")]);
    dom.create_element(form, "input", &[("type", "password"), ("name", "password")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "username")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "otp")]);
    dom.create_element(form, "input", &[("type", "checkbox"), ("name", "remember")]);
    let button = dom.create_element(form, "button", &[("type", "submit")]);
    dom.create_text(button, "Sign In");

    dom.take_added();
    (dom, form)
}

/// One-field newsletter signup on an ordinary page.
pub fn newsletter_page(url: &str) -> (Dom, NodeId) {
    let mut dom = Dom::new(url, "Newsletter");
    let body = dom.body();
    let p = dom.create_element(body, "p", &[]);
    dom.create_text(p, "Subscribe for updates");

    let form = dom.create_element(body, "form", &[("id", "newsletter")]);
    dom.create_element(form, "input", &[("type", "email"), ("name", "email")]);
    let button = dom.create_element(form, "button", &[("type", "submit")]);
    dom.create_text(button, "Subscribe");

    dom.take_added();
    (dom, form)
}

// ============================================================================
// Tracker harness
// ============================================================================

pub struct Harness {
    pub dom: Dom,
    pub tracker: JobTracker,
    pub clock: ManualClock,
    pub log: SinkLog,
}

pub fn harness(dom: Dom, config: TrackerConfig, sink: MemorySink) -> Harness {
    harness_with_store(dom, config, sink, Box::new(MemoryStore::new()))
}

pub fn harness_with_store(
    mut dom: Dom,
    config: TrackerConfig,
    sink: MemorySink,
    store: Box<dyn SnapshotStore>,
) -> Harness {
    let clock = ManualClock::new(START_MS, today());
    let log = sink.log();
    let mut tracker = JobTracker::new(config, store, Box::new(sink), Box::new(clock.clone()));
    tracker.initialize(&mut dom);
    Harness {
        dom,
        tracker,
        clock,
        log,
    }
}

impl Harness {
    pub fn control(&self, name: &str) -> NodeId {
        self.dom
            .find_control(self.dom.root(), name)
            .unwrap_or_else(|| panic!("no control named {}", name))
    }

    /// Type into a control the way a user would: value, then input event.
    pub fn fill(&mut self, name: &str, value: &str) -> EventOutcome {
        let id = self.control(name);
        self.dom.set_value(id, value);
        self.tracker.dispatch(&mut self.dom, PageEvent::Input { target: id })
    }

    pub fn submit(&mut self, form: NodeId) -> EventOutcome {
        self.tracker.dispatch(&mut self.dom, PageEvent::Submit { form })
    }

    /// Submit and unwrap the coordinator's verdict.
    pub fn submit_outcome(&mut self, form: NodeId) -> SubmitOutcome {
        match self.submit(form) {
            EventOutcome::Submit(outcome) => outcome,
            other => panic!("expected a submit outcome, got {:?}", other),
        }
    }

    pub fn click(&mut self, target: NodeId) -> EventOutcome {
        self.tracker.dispatch(&mut self.dom, PageEvent::Click { target })
    }

    pub fn advance(&mut self, ms: u64) -> Vec<TimerOutcome> {
        self.clock.advance(ms);
        self.tracker.poll_timers(&mut self.dom)
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.tracker
            .protection()
            .store()
            .keys()
            .expect("memory store lists keys")
    }
}
