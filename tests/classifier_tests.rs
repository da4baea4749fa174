use job_tracker::{
    classify::classifier::{MIN_SIGNALS, collect_signals, is_likely_job_application},
    dom::dom_model::{Dom, Scope},
};

use crate::common::{greenhouse_page, login_page, newsletter_page};

mod common;

// ============================================================================
// Password veto
// ============================================================================

#[test]
fn password_field_vetoes_an_otherwise_strong_application_form() {
    let (mut dom, form) = greenhouse_page();
    dom.create_element(form, "input", &[("type", "password"), ("name", "account_password")]);

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.has_password);
    assert!(signals.count() >= 5, "other signals still hold: {:?}", signals);
    assert!(!is_likely_job_application(&dom, Scope::Form(form)));
}

#[test]
fn login_form_with_five_fields_is_not_a_job_application() {
    let (dom, form) = login_page();

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.url_likely, "careers subdomain counts as a job URL");
    assert!(signals.field_count_ok);
    assert!(!signals.is_job_application());
}

#[test]
fn password_uppercase_type_still_vetoes() {
    let (mut dom, form) = greenhouse_page();
    dom.create_element(form, "input", &[("TYPE", "PASSWORD"), ("name", "pw")]);

    assert!(!is_likely_job_application(&dom, Scope::Form(form)));
}

// ============================================================================
// Threshold
// ============================================================================

#[test]
fn no_signals_is_not_a_job_application() {
    let (dom, form) = newsletter_page("https://example.com/newsletter");

    let signals = collect_signals(&dom, Scope::Form(form));
    assert_eq!(signals.count(), 0, "{:?}", signals);
    assert!(!is_likely_job_application(&dom, Scope::Form(form)));
}

#[test]
fn a_single_signal_is_below_threshold() {
    let (dom, form) = newsletter_page("https://example.com/careers/newsletter");

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.url_likely);
    assert_eq!(signals.count(), 1, "{:?}", signals);
    assert!(!is_likely_job_application(&dom, Scope::Form(form)));
}

#[test]
fn exactly_two_signals_without_password_passes() {
    let mut dom = Dom::new("https://example.com/contact", "Contact");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "name")]);
    dom.create_element(form, "input", &[("type", "file"), ("name", "attachment")]);
    let button = dom.create_element(form, "button", &[]);
    dom.create_text(button, "Send");

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.resume_input);
    assert!(signals.field_count_ok, "a file input alone satisfies the field count");
    assert_eq!(signals.count(), MIN_SIGNALS, "{:?}", signals);
    assert!(is_likely_job_application(&dom, Scope::Form(form)));
}

// ============================================================================
// Individual signals
// ============================================================================

#[test]
fn greenhouse_application_scores_at_least_four_signals() {
    let (dom, form) = greenhouse_page();

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.url_likely);
    assert!(signals.resume_input);
    assert!(signals.cover_letter_field);
    assert!(signals.apply_button);
    assert!(signals.field_count_ok);
    assert!(signals.count() >= 4);
    assert!(signals.is_job_application());
}

#[test]
fn vendor_match_ignores_url_case() {
    let (dom, form) = newsletter_page("https://ACME.Workable.com/signup");

    assert!(collect_signals(&dom, Scope::Form(form)).url_likely);
}

#[test]
fn submit_input_label_falls_back_to_its_value() {
    let mut dom = Dom::new("https://example.com/form", "");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[]);
    dom.create_element(form, "input", &[("type", "submit"), ("value", "Apply")]);

    assert!(collect_signals(&dom, Scope::Form(form)).apply_button);
}

#[test]
fn role_button_counts_as_clickable() {
    let mut dom = Dom::new("https://example.com/form", "");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[]);
    let div = dom.create_element(form, "div", &[("role", "button")]);
    dom.create_text(div, "Send application");

    assert!(collect_signals(&dom, Scope::Form(form)).apply_button);
}

#[test]
fn cover_letter_detected_from_placeholder() {
    let mut dom = Dom::new("https://example.com/form", "");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[]);
    dom.create_element(form, "textarea", &[("placeholder", "Paste your Cover Letter")]);

    let signals = collect_signals(&dom, Scope::Form(form));
    assert!(signals.cover_letter_field);
    assert!(signals.field_count_ok);
}

#[test]
fn hidden_and_button_inputs_do_not_count_as_fields() {
    let mut dom = Dom::new("https://example.com/form", "");
    let body = dom.body();
    let form = dom.create_element(body, "form", &[]);
    dom.create_element(form, "input", &[("type", "hidden"), ("name", "csrf")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "a")]);
    dom.create_element(form, "input", &[("type", "text"), ("name", "b")]);
    dom.create_element(form, "input", &[("type", "reset")]);

    assert!(!collect_signals(&dom, Scope::Form(form)).field_count_ok);

    dom.create_element(form, "select", &[("name", "c")]);
    assert!(collect_signals(&dom, Scope::Form(form)).field_count_ok);
}

#[test]
fn document_scope_classifies_pages_without_forms() {
    let mut dom = Dom::new("https://example.com/jobs/42", "Open position");
    let body = dom.body();
    let button = dom.create_element(body, "button", &[]);
    dom.create_text(button, "Apply now");

    let signals = collect_signals(&dom, Scope::Document);
    assert!(signals.url_likely);
    assert!(signals.apply_button);
    assert!(is_likely_job_application(&dom, Scope::Document));
}
