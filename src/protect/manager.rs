use tracing::{debug, info, warn};

use crate::dom::dom_model::{Dom, NodeId};
use crate::page::timers::{TimerId, TimerKind, TimerQueue};
use crate::protect::identity::{FormIdentity, SNAPSHOT_KEY_PREFIX};
use crate::protect::snapshot::FormSnapshot;
use crate::protect::store::{SnapshotStore, StoreError};

pub const AUTO_SAVE_INTERVAL_MS: u64 = 3000;

pub const UNLOAD_WARNING: &str = "You have unsaved changes. Are you sure you want to leave?";

#[derive(Debug, Clone)]
struct AutoSave {
    form: NodeId,
    identity: FormIdentity,
    timer: TimerId,
}

/// Keeps a durable copy of in-progress form input.
///
/// Store faults never reach the caller: they are logged and the
/// operation degrades to a no-op for that cycle.
pub struct ProtectionManager {
    store: Box<dyn SnapshotStore>,
    dirty: bool,
    autosave: Option<AutoSave>,
    autosave_interval_ms: u64,
    guard_installed: bool,
}

impl ProtectionManager {
    pub fn new(store: Box<dyn SnapshotStore>) -> Self {
        Self::with_interval(store, AUTO_SAVE_INTERVAL_MS)
    }

    pub fn with_interval(store: Box<dyn SnapshotStore>, autosave_interval_ms: u64) -> Self {
        Self {
            store,
            dirty: false,
            autosave: None,
            autosave_interval_ms,
            guard_installed: false,
        }
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    /// Hand the store back, e.g. to carry it across a page reload.
    pub fn into_store(self) -> Box<dyn SnapshotStore> {
        self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Snapshot lifecycle
    // ------------------------------------------------------------------

    /// Persist the current values of `form`. Returns whether the write
    /// reached the store.
    pub fn save_form_data(&mut self, dom: &Dom, form: NodeId, identity: &FormIdentity, now_ms: u64) -> bool {
        let snapshot = FormSnapshot::capture(dom, form, identity.as_str(), now_ms);
        self.dirty = true;

        let json = match snapshot.to_json() {
            Ok(j) => j,
            Err(e) => {
                warn!(form_id = %identity, error = %e, "failed to serialize form snapshot");
                return false;
            }
        };

        match self.store.set(&identity.storage_key(), &json) {
            Ok(()) => {
                debug!(form_id = %identity, fields = snapshot.data.len(), "form snapshot saved");
                true
            }
            Err(e) => {
                warn!(form_id = %identity, error = %e, "failed to save form data");
                false
            }
        }
    }

    pub fn load_snapshot(&self, identity: &FormIdentity) -> Option<FormSnapshot> {
        let raw = match self.store.get(&identity.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(form_id = %identity, error = %e, "failed to read form snapshot");
                return None;
            }
        };
        match FormSnapshot::from_json(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(form_id = %identity, error = %e, "stored form snapshot is unreadable");
                None
            }
        }
    }

    /// Write a stored snapshot back into `form`. A restored form counts as
    /// dirty, so leaving the page again still warns.
    pub fn restore_form_data(&mut self, dom: &mut Dom, form: NodeId, identity: &FormIdentity) -> bool {
        let Some(snapshot) = self.load_snapshot(identity) else {
            return false;
        };
        let written = snapshot.apply(dom, form);
        self.dirty = true;
        info!(form_id = %identity, fields = written, "form data restored");
        true
    }

    pub fn clear_form_data(&mut self, identity: &FormIdentity) {
        if let Err(e) = self.store.remove(&identity.storage_key()) {
            warn!(form_id = %identity, error = %e, "failed to clear form data");
            return;
        }
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Autosave
    // ------------------------------------------------------------------

    /// Start the repeating save for `form`, replacing any running one.
    pub fn start_auto_save(&mut self, form: NodeId, identity: FormIdentity, timers: &mut TimerQueue, now_ms: u64) {
        self.stop_auto_save(timers);
        let timer = timers.set_interval(now_ms, self.autosave_interval_ms, TimerKind::AutoSave);
        self.autosave = Some(AutoSave {
            form,
            identity,
            timer,
        });
    }

    pub fn stop_auto_save(&mut self, timers: &mut TimerQueue) {
        if let Some(running) = self.autosave.take() {
            timers.cancel(running.timer);
        }
    }

    pub fn auto_save_form(&self) -> Option<NodeId> {
        self.autosave.as_ref().map(|a| a.form)
    }

    /// One autosave tick: saves only while dirty and nothing is in flight.
    pub fn on_auto_save_tick(&mut self, dom: &Dom, submitting: bool, now_ms: u64) -> bool {
        if !self.dirty || submitting {
            return false;
        }
        let Some(running) = self.autosave.clone() else {
            return false;
        };
        self.save_form_data(dom, running.form, &running.identity, now_ms)
    }

    // ------------------------------------------------------------------
    // Unload guard
    // ------------------------------------------------------------------

    pub fn install_unload_guard(&mut self) {
        self.guard_installed = true;
    }

    pub fn remove_unload_guard(&mut self) {
        self.guard_installed = false;
    }

    pub fn unload_guard_installed(&self) -> bool {
        self.guard_installed
    }

    /// Prompt text to show when the page is about to unload, if any.
    pub fn before_unload(&self, submitting: bool) -> Option<&'static str> {
        (self.guard_installed && self.dirty && !submitting).then_some(UNLOAD_WARNING)
    }
}

// ============================================================================
// Saved-form management
// ============================================================================

/// A snapshot entry found in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredForm {
    pub key: String,
    pub timestamp: u64,
    /// `None` when the entry could not be parsed.
    pub snapshot: Option<FormSnapshot>,
}

/// All stored form snapshots, newest first.
pub fn list_snapshots(store: &dyn SnapshotStore) -> Result<Vec<StoredForm>, StoreError> {
    let mut forms = Vec::new();
    for key in store.keys()? {
        if !key.starts_with(SNAPSHOT_KEY_PREFIX) {
            continue;
        }
        let snapshot = store
            .get(&key)?
            .and_then(|raw| FormSnapshot::from_json(&raw).ok());
        forms.push(StoredForm {
            timestamp: snapshot.as_ref().map(|s| s.timestamp).unwrap_or(0),
            key,
            snapshot,
        });
    }
    forms.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(forms)
}

pub fn clear_snapshot(store: &mut dyn SnapshotStore, key: &str) -> Result<(), StoreError> {
    store.remove(key)
}

/// Remove every form snapshot, leaving unrelated keys alone. Returns how
/// many were removed.
pub fn clear_all_snapshots(store: &mut dyn SnapshotStore) -> Result<usize, StoreError> {
    let keys: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|k| k.starts_with(SNAPSHOT_KEY_PREFIX))
        .collect();
    for key in &keys {
        store.remove(key)?;
    }
    Ok(keys.len())
}
