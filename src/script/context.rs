use crate::script::script_model::CheckResult;

/// Tracks progress and check results of a running session script.
#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    /// Current step index (0-based)
    pub current_step: usize,

    pub check_results: Vec<CheckResult>,

    /// Warning shown by the last `unload` step, if any
    pub last_unload_warning: Option<String>,
}

impl ScriptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_checks(&mut self, results: Vec<CheckResult>) {
        self.check_results.extend(results);
    }

    pub fn all_passed(&self) -> bool {
        self.check_results.iter().all(|r| r.passed)
    }

    pub fn pass_count(&self) -> usize {
        self.check_results.iter().filter(|r| r.passed).count()
    }

    pub fn fail_count(&self) -> usize {
        self.check_results.iter().filter(|r| !r.passed).count()
    }
}
