use serde::Serialize;

use crate::classify::keywords::{
    APPLY_PHRASES, ATS_VENDORS, COVER_LETTER_TOKENS, JOB_URL_TOKENS, PAGE_JOB_VOCABULARY,
    includes_any,
};
use crate::dom::dom_model::{Dom, NodeId, Scope};

/// Votes needed for a scope to count as a job application.
pub const MIN_SIGNALS: usize = 2;

const NON_FIELD_TYPES: &[&str] = &["hidden", "button", "submit", "reset"];

/// The six independent votes plus the password veto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobSignals {
    pub url_likely: bool,
    pub job_vocabulary: bool,
    pub resume_input: bool,
    pub cover_letter_field: bool,
    pub apply_button: bool,
    pub field_count_ok: bool,
    pub has_password: bool,
}

impl JobSignals {
    pub fn count(&self) -> usize {
        [
            self.url_likely,
            self.job_vocabulary,
            self.resume_input,
            self.cover_letter_field,
            self.apply_button,
            self.field_count_ok,
        ]
        .iter()
        .filter(|s| **s)
        .count()
    }

    pub fn is_job_application(&self) -> bool {
        !self.has_password && self.count() >= MIN_SIGNALS
    }
}

pub fn collect_signals(dom: &Dom, scope: Scope) -> JobSignals {
    let root = dom.scope_root(scope);
    let fields = dom.controls(root);

    let has_password = fields.iter().any(|f| dom.input_type(*f) == "password");

    let url = dom.url().to_lowercase();
    let url_likely = ATS_VENDORS.iter().any(|v| url.contains(v)) || includes_any(&url, JOB_URL_TOKENS);

    let job_vocabulary = includes_any(&dom.body_text(), PAGE_JOB_VOCABULARY);

    let resume_input = fields.iter().any(|f| dom.input_type(*f) == "file");

    let cover_letter_field = fields
        .iter()
        .any(|f| includes_any(&attribute_haystack(dom, *f), COVER_LETTER_TOKENS));

    let apply_button = clickable_controls(dom, root)
        .iter()
        .any(|b| includes_any(&control_label(dom, *b), APPLY_PHRASES));

    let meaningful_fields = fields
        .iter()
        .filter(|f| !NON_FIELD_TYPES.contains(&dom.input_type(**f).as_str()))
        .count();
    let field_count_ok = meaningful_fields >= 3 || resume_input || cover_letter_field;

    JobSignals {
        url_likely,
        job_vocabulary,
        resume_input,
        cover_letter_field,
        apply_button,
        field_count_ok,
        has_password,
    }
}

/// Decide whether `scope` looks like a job application form.
///
/// Any password field vetoes the decision outright; otherwise at least
/// [`MIN_SIGNALS`] of the six signals must hold.
pub fn is_likely_job_application(dom: &Dom, scope: Scope) -> bool {
    collect_signals(dom, scope).is_job_application()
}

/// `name id aria-label placeholder`, lowercased and space-joined.
pub fn attribute_haystack(dom: &Dom, id: NodeId) -> String {
    format!(
        "{} {} {} {}",
        dom.attr_lower(id, "name"),
        dom.attr_lower(id, "id"),
        dom.attr_lower(id, "aria-label"),
        dom.attr_lower(id, "placeholder"),
    )
}

/// `button, input[type=submit], [role=button]`
pub fn clickable_controls(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root)
        .into_iter()
        .filter(|id| is_clickable(dom, *id))
        .collect()
}

pub fn is_clickable(dom: &Dom, id: NodeId) -> bool {
    match dom.tag(id) {
        Some("button") => true,
        Some("input") if dom.input_type(id) == "submit" => true,
        Some(_) => dom.attr_lower(id, "role") == "button",
        None => false,
    }
}

/// Visible label of a button-like control: its text, else its value.
pub fn control_label(dom: &Dom, id: NodeId) -> String {
    let text = dom.normalized_text(id);
    if !text.is_empty() {
        return text.to_lowercase();
    }
    dom.control(id)
        .map(|c| c.value.trim().to_lowercase())
        .unwrap_or_default()
}
