use serde::{Deserialize, Serialize};

use crate::dom::dom_model::{Dom, NodeId};

/// A stored field value: either a string or a boolean, the two shapes a
/// snapshot entry may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Uniform read/write access to one form control.
pub trait FieldAccessor {
    /// Current value as the single string the extractor works with.
    fn read(&self, dom: &Dom, id: NodeId) -> String;

    /// Value to persist in a snapshot, `None` when the control is not
    /// restorable or contributes nothing in its current state.
    fn snapshot(&self, dom: &Dom, id: NodeId) -> Option<FieldValue> {
        Some(FieldValue::Text(self.read(dom, id)))
    }

    fn write(&self, dom: &mut Dom, id: NodeId, value: &FieldValue);
}

pub struct TextAccessor;
pub struct CheckboxAccessor;
pub struct RadioAccessor;
pub struct SelectAccessor;
pub struct FileAccessor;

impl FieldAccessor for TextAccessor {
    fn read(&self, dom: &Dom, id: NodeId) -> String {
        dom.control(id).map(|c| c.value.clone()).unwrap_or_default()
    }

    fn write(&self, dom: &mut Dom, id: NodeId, value: &FieldValue) {
        dom.set_value(id, &value.as_text());
    }
}

impl FieldAccessor for CheckboxAccessor {
    fn read(&self, dom: &Dom, id: NodeId) -> String {
        let checked = dom.control(id).is_some_and(|c| c.checked);
        let label = if checked { "Yes" } else { "No" };
        label.to_string()
    }

    fn write(&self, dom: &mut Dom, id: NodeId, value: &FieldValue) {
        let checked = match value {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => s == "Yes",
        };
        dom.set_checked(id, checked);
    }
}

impl FieldAccessor for RadioAccessor {
    fn read(&self, dom: &Dom, id: NodeId) -> String {
        dom.control(id).map(|c| c.value.clone()).unwrap_or_default()
    }

    fn snapshot(&self, dom: &Dom, id: NodeId) -> Option<FieldValue> {
        let control = dom.control(id)?;
        control
            .checked
            .then(|| FieldValue::Text(control.value.clone()))
    }

    fn write(&self, dom: &mut Dom, id: NodeId, value: &FieldValue) {
        let own = self.read(dom, id);
        dom.set_checked(id, own == value.as_text());
    }
}

impl FieldAccessor for SelectAccessor {
    fn read(&self, dom: &Dom, id: NodeId) -> String {
        match dom.selected_option(id) {
            Some(option) => {
                let text = dom.normalized_text(option);
                if text.is_empty() {
                    dom.option_value(option)
                } else {
                    text
                }
            }
            None => String::new(),
        }
    }

    fn snapshot(&self, dom: &Dom, id: NodeId) -> Option<FieldValue> {
        dom.selected_option(id)
            .map(|option| FieldValue::Text(dom.option_value(option)))
    }

    fn write(&self, dom: &mut Dom, id: NodeId, value: &FieldValue) {
        let wanted = value.as_text();
        let options = dom.options(id);
        let found = options
            .iter()
            .copied()
            .find(|o| dom.option_value(*o) == wanted)
            .or_else(|| {
                options
                    .iter()
                    .copied()
                    .find(|o| dom.normalized_text(*o) == wanted)
            });
        if let Some(option) = found {
            dom.select_option(id, option);
        }
    }
}

impl FieldAccessor for FileAccessor {
    fn read(&self, dom: &Dom, id: NodeId) -> String {
        let Some(control) = dom.control(id) else {
            return String::new();
        };
        if let Some(first) = control.files.first() {
            return first.clone();
        }
        control
            .value
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .to_string()
    }

    fn snapshot(&self, _dom: &Dom, _id: NodeId) -> Option<FieldValue> {
        None
    }

    fn write(&self, _dom: &mut Dom, _id: NodeId, _value: &FieldValue) {}
}

/// Which accessor governs a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    Select,
    File,
}

impl FieldKind {
    /// `None` when `id` is not an input, select or textarea.
    pub fn of(dom: &Dom, id: NodeId) -> Option<FieldKind> {
        match dom.tag(id)? {
            "select" => Some(FieldKind::Select),
            "textarea" => Some(FieldKind::Text),
            "input" => Some(match dom.input_type(id).as_str() {
                "checkbox" => FieldKind::Checkbox,
                "radio" => FieldKind::Radio,
                "file" => FieldKind::File,
                _ => FieldKind::Text,
            }),
            _ => None,
        }
    }

    pub fn accessor(self) -> &'static dyn FieldAccessor {
        match self {
            FieldKind::Text => &TextAccessor,
            FieldKind::Checkbox => &CheckboxAccessor,
            FieldKind::Radio => &RadioAccessor,
            FieldKind::Select => &SelectAccessor,
            FieldKind::File => &FileAccessor,
        }
    }
}

/// Read any control's value; empty for non-controls.
pub fn read_value(dom: &Dom, id: NodeId) -> String {
    FieldKind::of(dom, id)
        .map(|kind| kind.accessor().read(dom, id))
        .unwrap_or_default()
}

pub fn write_value(dom: &mut Dom, id: NodeId, value: &FieldValue) {
    if let Some(kind) = FieldKind::of(dom, id) {
        kind.accessor().write(dom, id, value);
    }
}
