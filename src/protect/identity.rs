use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::dom::dom_model::{Dom, NodeId};

pub const SNAPSHOT_KEY_PREFIX: &str = "jt_form_";

const TOKEN_LEN: usize = 9;

/// Stable key for one form within a page lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormIdentity(String);

impl FormIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `id` attribute, else the last path segment of the submission
    /// target, else a random token.
    ///
    /// A form without an `action` submits to the page itself, so the page
    /// URL stands in for the target.
    pub fn derive(dom: &Dom, form: NodeId) -> Self {
        if let Some(id) = dom.attr(form, "id").filter(|id| !id.is_empty()) {
            return Self(id.to_string());
        }
        if let Some(segment) = action_segment(dom, form) {
            return Self(segment);
        }
        Self::random()
    }

    pub fn random() -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();
        Self(format!("form_{}", token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the form's snapshot is stored.
    pub fn storage_key(&self) -> String {
        format!("{}{}", SNAPSHOT_KEY_PREFIX, self.0)
    }
}

impl fmt::Display for FormIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn action_segment(dom: &Dom, form: NodeId) -> Option<String> {
    let page = reqwest::Url::parse(dom.url()).ok()?;
    let target = match dom.attr(form, "action").map(str::trim) {
        Some(action) if !action.is_empty() => page.join(action).ok()?,
        _ => page,
    };
    target
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Remembers each form's identity so a random token, once drawn, sticks
/// to its form for the rest of the page lifetime.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    known: HashMap<NodeId, FormIdentity>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, dom: &Dom, form: NodeId) -> FormIdentity {
        self.known
            .entry(form)
            .or_insert_with(|| FormIdentity::derive(dom, form))
            .clone()
    }
}
