use serde::{Deserialize, Serialize};

use crate::dom::page_loader::{NodeSpec, PageSpec};
use crate::error::TrackerError;
use crate::extract::record::JobRecord;
use crate::page::tracker_config::TrackerConfig;

/// A replayable page session: one page, one tracker, a list of user
/// actions and the checks to run between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionScript {
    /// Human-readable name for this session
    pub name: String,

    /// Page the session starts on (rebuilt on `reload`)
    pub page: PageSpec,

    /// Tracker settings; the runner's settings apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker: Option<TrackerConfig>,

    /// Calendar date the page clock reports, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<String>,

    /// How the record sink answers
    #[serde(default)]
    pub sink: SinkBehaviour,

    /// Ordered list of steps to replay
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn from_yaml(yaml: &str) -> Result<Self, TrackerError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SinkBehaviour {
    #[default]
    Accept,
    Reject,
    Unreachable,
}

/// A single step in a session script. `form` selects a form by id or
/// name; without it the first form on the page is used. `field` is a
/// control's name or id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Type into a text-like control
    Fill {
        field: String,
        value: String,
        #[serde(default)]
        form: Option<String>,
    },

    /// Tick or untick a checkbox, or pick a radio by value
    Check {
        field: String,
        #[serde(default = "default_true")]
        checked: bool,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        form: Option<String>,
    },

    /// Choose a select option by value or visible text
    Select {
        field: String,
        option: String,
        #[serde(default)]
        form: Option<String>,
    },

    /// Attach a file to a file input
    Attach {
        field: String,
        file: String,
        #[serde(default)]
        form: Option<String>,
    },

    /// Fire a submit event on a form
    Submit {
        #[serde(default)]
        form: Option<String>,
    },

    /// Click an element by id, or a button/link by its label
    Click { target: String },

    /// Move page time forward and fire due timers
    Advance { ms: u64 },

    /// Insert markup under the element with `parent` id (body when absent)
    Insert {
        #[serde(default)]
        parent: Option<String>,
        node: NodeSpec,
    },

    /// Rebuild the page from scratch, keeping stored snapshots
    Reload,

    /// Leave the page
    Unload,

    /// Run checks against the current session state
    Expect { checks: Vec<Expectation> },
}

/// A single check against the session state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    /// Number of records the sink has received
    RecordCount { expected: usize },

    /// A field of a received record; the latest when `index` is absent
    RecordField {
        field: String,
        expected: String,
        #[serde(default)]
        index: Option<usize>,
    },

    /// A snapshot is stored for the form
    SnapshotPresent {
        #[serde(default)]
        form: Option<String>,
    },

    /// No snapshot is stored for the form
    SnapshotAbsent {
        #[serde(default)]
        form: Option<String>,
    },

    /// Whether leaving the page now would warn
    UnloadWarning { expected: bool },

    /// Classifier verdict for a form, or the whole page without `form`
    Classified {
        expected: bool,
        #[serde(default)]
        form: Option<String>,
    },

    /// Value a field currently shows
    FieldValue {
        field: String,
        expected: String,
        #[serde(default)]
        form: Option<String>,
    },
}

impl Expectation {
    pub fn kind(&self) -> &'static str {
        match self {
            Expectation::RecordCount { .. } => "RecordCount",
            Expectation::RecordField { .. } => "RecordField",
            Expectation::SnapshotPresent { .. } => "SnapshotPresent",
            Expectation::SnapshotAbsent { .. } => "SnapshotAbsent",
            Expectation::UnloadWarning { .. } => "UnloadWarning",
            Expectation::Classified { .. } => "Classified",
            Expectation::FieldValue { .. } => "FieldValue",
        }
    }
}

/// Result of evaluating a single expectation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Which step this check belongs to (0-indexed)
    pub step_index: usize,

    pub expectation: Expectation,

    pub passed: bool,

    /// Actual value found (for debugging failed checks)
    pub actual: Option<String>,

    pub message: Option<String>,
}

/// Result of replaying a complete session script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptResult {
    pub script_name: String,

    /// Whether every step ran and every check passed
    pub passed: bool,

    pub steps_run: usize,

    pub check_results: Vec<CheckResult>,

    /// Records the sink received during the session
    pub records: Vec<JobRecord>,

    /// Error message if a step could not be executed
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}
