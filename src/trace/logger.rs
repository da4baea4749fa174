use std::{fs::OpenOptions, io::Write, sync::Mutex};

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Appends [`TraceEvent`]s to a JSON Lines file.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                warn!(path, error = %e, "could not open trace file");
                Self { file: None }
            }
        }
    }

    /// A logger that drops everything.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn log(&self, event: &TraceEvent) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return,
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "trace logger lock poisoned");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(error = %e, "failed to write trace event");
        }
    }
}
