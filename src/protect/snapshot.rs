use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::dom_model::{Dom, NodeId};
use crate::dom::field::{FieldKind, FieldValue};

/// In-progress field values of one form, as persisted under
/// `jt_form_<formId>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub form_id: String,
    pub timestamp: u64,
    pub data: BTreeMap<String, FieldValue>,
}

impl FormSnapshot {
    /// Capture every named, restorable control of `form`.
    pub fn capture(dom: &Dom, form: NodeId, form_id: &str, timestamp: u64) -> Self {
        let mut data = BTreeMap::new();
        for field in dom.controls(form) {
            let Some(name) = dom.attr(field, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let Some(kind) = FieldKind::of(dom, field) else {
                continue;
            };
            if let Some(value) = kind.accessor().snapshot(dom, field) {
                data.insert(name.to_string(), value);
            }
        }
        Self {
            form_id: form_id.to_string(),
            timestamp,
            data,
        }
    }

    /// Write stored values back into the matching named controls.
    /// Returns how many controls were written.
    pub fn apply(&self, dom: &mut Dom, form: NodeId) -> usize {
        let mut written = 0;
        for (name, value) in &self.data {
            for field in dom.controls_named(form, name) {
                if let Some(kind) = FieldKind::of(dom, field) {
                    kind.accessor().write(dom, field, value);
                    written += 1;
                }
            }
        }
        written
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
