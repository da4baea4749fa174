use serde::Serialize;

use crate::protect::identity::FormIdentity;

/// One line of the activity trace: something the tracker decided or did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,

    pub event: String,

    pub form_id: Option<String>,

    pub decision: Option<String>,
    pub detail: Option<String>,

    pub signal_count: Option<usize>,
}

impl TraceEvent {
    pub fn at(timestamp_ms: u64, event: impl ToString) -> Self {
        Self {
            timestamp_ms,
            event: event.to_string(),
            form_id: None,
            decision: None,
            detail: None,
            signal_count: None,
        }
    }

    pub fn with_form(mut self, identity: &FormIdentity) -> Self {
        self.form_id = Some(identity.to_string());
        self
    }

    pub fn with_decision(mut self, decision: impl std::fmt::Debug) -> Self {
        self.decision = Some(format!("{:?}", decision));
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_signal_count(mut self, count: usize) -> Self {
        self.signal_count = Some(count);
        self
    }
}
