use std::collections::BTreeSet;

use crate::dom::dom_model::{Dom, NodeId};

/// Finds forms to consider for binding: all forms at start-up, then the
/// forms touched by each batch of DOM insertions.
#[derive(Debug, Default)]
pub struct DomWatcher {
    scans: u64,
}

impl DomWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scans run so far, start-up included.
    pub fn scans(&self) -> u64 {
        self.scans
    }

    /// Every form on the page. Clears the mutation log, since anything in
    /// it is covered by this full scan.
    pub fn initial_forms(&mut self, dom: &mut Dom) -> Vec<NodeId> {
        self.scans += 1;
        dom.take_added();
        dom.forms()
    }

    /// Forms affected by insertions since the last scan: inserted forms,
    /// forms inside inserted subtrees, and forms that gained fields.
    pub fn rescan(&mut self, dom: &mut Dom) -> Vec<NodeId> {
        self.scans += 1;
        let mut found = BTreeSet::new();
        for node in dom.take_added() {
            if dom.is_tag(node, "form") {
                found.insert(node);
            }
            if dom.element(node).is_some() {
                found.extend(dom.descendants_by_tag(node, &["form"]));
            }
            if let Some(parent) = dom.parent(node) {
                if let Some(form) = dom.closest(parent, "form") {
                    found.insert(form);
                }
            }
        }
        found.into_iter().collect()
    }
}
