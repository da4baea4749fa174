pub mod clock;
pub mod runtime;
pub mod timers;
pub mod tracker_config;
