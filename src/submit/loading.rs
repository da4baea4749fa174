use crate::dom::dom_model::{Dom, NodeId};

pub const SUBMITTING_LABEL: &str = "Submitting...";

const DEFAULT_LABEL: &str = "Submit";

/// What the submit control looked like before it was put into its
/// loading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    pub control: NodeId,
    pub original_label: String,
    pub was_disabled: bool,
}

/// `button[type=submit], input[type=submit]`, or an untyped button,
/// which submits its form by default.
pub fn find_submit_control(dom: &Dom, form: NodeId) -> Option<NodeId> {
    dom.descendants(form).into_iter().find(|id| match dom.tag(*id) {
        Some("button") => matches!(dom.input_type(*id).as_str(), "submit" | ""),
        Some("input") => dom.input_type(*id) == "submit",
        _ => false,
    })
}

fn label_of(dom: &Dom, control: NodeId) -> String {
    if dom.is_tag(control, "input") {
        dom.control(control).map(|c| c.value.clone()).unwrap_or_default()
    } else {
        dom.normalized_text(control)
    }
}

fn set_label(dom: &mut Dom, control: NodeId, label: &str) {
    if dom.is_tag(control, "input") {
        dom.set_value(control, label);
    } else {
        dom.set_text_content(control, label);
    }
}

/// Disable the form's submit control and relabel it. `None` when the form
/// has no submit control.
pub fn add_loading_state(dom: &mut Dom, form: NodeId) -> Option<LoadingState> {
    let control = find_submit_control(dom, form)?;
    let label = label_of(dom, control);
    let state = LoadingState {
        control,
        original_label: if label.is_empty() { DEFAULT_LABEL.to_string() } else { label },
        was_disabled: dom.control(control).is_some_and(|c| c.disabled),
    };
    dom.set_disabled(control, true);
    set_label(dom, control, SUBMITTING_LABEL);
    Some(state)
}

pub fn remove_loading_state(dom: &mut Dom, state: &LoadingState) {
    dom.set_disabled(state.control, state.was_disabled);
    set_label(dom, state.control, &state.original_label);
}
