//! Platform abstraction for driving the host.
//!
//! The host never runs work on its own: it tells the platform that a cycle
//! is needed and the platform calls [`crate::Host::process_invalid`] when it
//! suits it.

/// Schedules render cycles for a [`crate::Host`].
///
/// Implementations must be safe to use from multiple threads even though the
/// host itself is single-threaded, so a waker can be shared with an event
/// loop.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the platform run a new cycle.
    fn schedule_cycle(&self);
}

/// Scheduler for hosts driven explicitly by their owner.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_cycle(&self) {}
}
