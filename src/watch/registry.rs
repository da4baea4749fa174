use std::collections::HashMap;

use crate::dom::dom_model::NodeId;
use crate::protect::identity::FormIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub bound_at: u64,
}

/// Forms already wired with a submit listener, keyed by identity.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bound: HashMap<FormIdentity, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &FormIdentity) -> bool {
        self.bound.contains_key(identity)
    }

    pub fn get(&self, identity: &FormIdentity) -> Option<&Binding> {
        self.bound.get(identity)
    }

    /// Returns `false` when the identity was already registered; the
    /// existing binding is kept.
    pub fn register(&mut self, identity: FormIdentity, node: NodeId, now_ms: u64) -> bool {
        if self.bound.contains_key(&identity) {
            return false;
        }
        self.bound.insert(identity, Binding { node, bound_at: now_ms });
        true
    }

    pub fn is_bound_node(&self, node: NodeId) -> bool {
        self.bound.values().any(|b| b.node == node)
    }

    pub fn identity_of(&self, node: NodeId) -> Option<&FormIdentity> {
        self.bound
            .iter()
            .find(|(_, b)| b.node == node)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
