use serde::{Deserialize, Serialize};

use crate::extract::record::DateFormat;
use crate::protect::manager::AUTO_SAVE_INTERVAL_MS;
use crate::submit::coordinator::{DEBOUNCE_MS, DISPATCH_DELAY_MS};

/// Protection features, each of which can be switched off on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionOptions {
    /// Save and restore in-progress input.
    #[serde(default = "default_true")]
    pub snapshots: bool,

    /// Periodic save while the form is dirty. Needs `snapshots`.
    #[serde(default = "default_true")]
    pub autosave: bool,

    /// Warn before leaving a page with unsaved input.
    #[serde(default = "default_true")]
    pub unload_guard: bool,

    /// Disable and relabel the submit control while submitting.
    #[serde(default = "default_true")]
    pub loading_state: bool,
}

impl ProtectionOptions {
    pub fn all() -> Self {
        Self {
            snapshots: true,
            autosave: true,
            unload_guard: true,
            loading_state: true,
        }
    }

    pub fn none() -> Self {
        Self {
            snapshots: false,
            autosave: false,
            unload_guard: false,
            loading_state: false,
        }
    }
}

impl Default for ProtectionOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Per-page tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_ms: u64,

    #[serde(default = "default_dispatch_delay")]
    pub dispatch_delay_ms: u64,

    #[serde(default)]
    pub date_format: DateFormat,

    #[serde(default)]
    pub protection: ProtectionOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            autosave_interval_ms: AUTO_SAVE_INTERVAL_MS,
            dispatch_delay_ms: DISPATCH_DELAY_MS,
            date_format: DateFormat::Us,
            protection: ProtectionOptions::all(),
        }
    }
}

impl TrackerConfig {
    /// Capture only: no snapshots, autosave, unload guard or loading
    /// state, ISO dates.
    pub fn simplified() -> Self {
        Self {
            date_format: DateFormat::Iso,
            protection: ProtectionOptions::none(),
            ..Self::default()
        }
    }

    pub fn autosave_enabled(&self) -> bool {
        self.protection.snapshots && self.protection.autosave
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_debounce() -> u64 { DEBOUNCE_MS }
fn default_autosave_interval() -> u64 { AUTO_SAVE_INTERVAL_MS }
fn default_dispatch_delay() -> u64 { DISPATCH_DELAY_MS }
