use chrono::NaiveDate;

use crate::classify::classifier::attribute_haystack;
use crate::classify::keywords::{
    COMPANY_KEYWORDS, LOCATION_KEYWORDS, TITLE_KEYWORDS, WORK_MODE_KEYWORDS,
};
use crate::dom::dom_model::{Dom, NodeId, Scope};
use crate::dom::field::{FieldKind, read_value};
use crate::extract::heuristics::page_heuristics;
use crate::extract::record::{DateFormat, JobRecord, WorkMode};

/// Turns an accepted form (or the whole page) into a [`JobRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    pub date_format: DateFormat,
}

impl Extractor {
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// Best-effort extraction. Every field falls back to an empty string.
    ///
    /// Per field the first non-empty hit wins: a `<label>` whose text names
    /// the field, then a control whose attributes do, then page-wide
    /// guesses from meta tags, branding and body text.
    pub fn extract(&self, dom: &Dom, scope: Scope, today: NaiveDate) -> JobRecord {
        let root = dom.scope_root(scope);
        let guess = page_heuristics(dom);

        let company = lookup(dom, root, COMPANY_KEYWORDS).unwrap_or(guess.company);
        let location = lookup(dom, root, LOCATION_KEYWORDS).unwrap_or(guess.location);
        let title = lookup(dom, root, TITLE_KEYWORDS).unwrap_or(guess.title);

        let work_mode = find_by_label(dom, root, WORK_MODE_KEYWORDS, |v| WorkMode::detect(v).is_specified())
            .or_else(|| find_by_attr(dom, root, WORK_MODE_KEYWORDS, |v| WorkMode::detect(v).is_specified()))
            .map(|v| WorkMode::detect(&v))
            .unwrap_or(guess.work_mode);

        JobRecord {
            company,
            location,
            title,
            work_mode,
            application_date: self.date_format.format(today),
            url: dom.url().to_string(),
            resume: find_resume_filename(dom, root),
        }
    }
}

fn lookup(dom: &Dom, root: NodeId, keywords: &[&str]) -> Option<String> {
    find_by_label(dom, root, keywords, |_| true).or_else(|| find_by_attr(dom, root, keywords, |_| true))
}

/// Value of the control behind the first label naming one of `keywords`.
///
/// The control is the label's `for` target, else a control nested in the
/// label. `accept` filters values that are present but unusable.
pub fn find_by_label(
    dom: &Dom,
    root: NodeId,
    keywords: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    for label in dom.descendants_by_tag(root, &["label"]) {
        let text = dom.normalized_text(label).to_lowercase();
        if text.is_empty() || !keywords.iter().any(|k| text.contains(k)) {
            continue;
        }

        if let Some(target) = dom.attr(label, "for").and_then(|f| dom.by_id(root, f)) {
            let v = read_value(dom, target).trim().to_string();
            if !v.is_empty() && accept(&v) {
                return Some(v);
            }
        }

        if let Some(nested) = dom.controls(label).first() {
            let v = read_value(dom, *nested).trim().to_string();
            if !v.is_empty() && accept(&v) {
                return Some(v);
            }
        }
    }
    None
}

/// Value of the first control whose name, id, aria-label or placeholder
/// names one of `keywords`.
pub fn find_by_attr(
    dom: &Dom,
    root: NodeId,
    keywords: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    dom.controls(root).into_iter().find_map(|field| {
        let hay = attribute_haystack(dom, field);
        if !keywords.iter().any(|k| hay.contains(k)) {
            return None;
        }
        let v = read_value(dom, field).trim().to_string();
        (!v.is_empty() && accept(&v)).then_some(v)
    })
}

/// File name attached to the first file input that has one.
pub fn find_resume_filename(dom: &Dom, root: NodeId) -> String {
    dom.controls(root)
        .into_iter()
        .filter(|id| FieldKind::of(dom, *id) == Some(FieldKind::File))
        .map(|id| read_value(dom, id))
        .find(|name| !name.is_empty())
        .unwrap_or_default()
}
