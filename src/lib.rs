use crate::{
    dom::dom_model::Dom,
    page::{clock::SystemClock, runtime::JobTracker, tracker_config::TrackerConfig},
    protect::store::SnapshotStore,
    submit::sink::RecordSink,
};

pub mod classify;
pub mod cli;
pub mod dom;
pub mod error;
pub mod extract;
pub mod logging;
pub mod page;
pub mod protect;
pub mod report;
pub mod script;
pub mod submit;
pub mod trace;
pub mod watch;

/// Inject a tracker into a loaded page on the system clock: install the
/// document listeners and bind every qualifying form already present.
pub fn inject(
    dom: &mut Dom,
    config: TrackerConfig,
    store: Box<dyn SnapshotStore>,
    sink: Box<dyn RecordSink>,
) -> JobTracker {
    let mut tracker = JobTracker::new(config, store, sink, Box::new(SystemClock));
    let bound = tracker.initialize(dom);
    tracing::debug!(url = dom.url(), bound, "tracker injected");
    tracker
}
