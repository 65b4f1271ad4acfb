//! Standard runtime services backed by Rust's `std` library.
//!
//! [`StdScheduler`] implements [`RuntimeScheduler`] with an atomic request
//! flag and an optional waker, so an event loop on any thread can learn that
//! the host has work. [`StdRuntime`] bundles it with a [`Host`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use arbor_core::{Host, HostError, InstanceId, RuntimeScheduler, VNode};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records cycle requests for a polling event loop.
pub struct StdScheduler {
    cycle_requested: AtomicBool,
    cycle_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            cycle_requested: AtomicBool::new(false),
            cycle_waker: RwLock::new(None),
        }
    }

    /// Returns whether a cycle has been requested since the last call.
    pub fn take_cycle_request(&self) -> bool {
        self.cycle_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a new cycle is scheduled.
    pub fn set_cycle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .cycle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_cycle_waker(&self) {
        *self
            .cycle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .cycle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "cycle_requested",
                &self.cycle_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_cycle(&self) {
        self.cycle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Host driven by a [`StdScheduler`].
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    host: Host,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let host = Host::with_scheduler(scheduler.clone());
        Self { scheduler, host }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn mount(&mut self, root: VNode) -> Result<InstanceId, HostError> {
        let id = self.host.mount(root)?;
        // Mounting already ran the first cycle.
        self.scheduler.take_cycle_request();
        Ok(id)
    }

    pub fn take_cycle_request(&self) -> bool {
        self.scheduler.take_cycle_request()
    }

    pub fn set_cycle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_cycle_waker(waker);
    }

    pub fn clear_cycle_waker(&self) {
        self.scheduler.clear_cycle_waker();
    }

    /// Runs a cycle if one was requested. Returns whether one ran.
    pub fn run_pending(&mut self) -> Result<bool, HostError> {
        let requested = self.scheduler.take_cycle_request();
        if !requested && !self.host.needs_cycle() {
            return Ok(false);
        }
        log::trace!("running requested cycle");
        self.host.process_invalid()?;
        self.scheduler.take_cycle_request();
        Ok(true)
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("root", &self.host.root())
            .finish()
    }
}
