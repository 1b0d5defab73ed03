//! Monitor - the dependency-tracking token threaded through every read
//!
//! A [`Monitor`] is either untracked (the root read context handed to user
//! code) or tracking (created by a derived cell while it computes). Tracking
//! monitors record every cell read through them together with the version that
//! was observed, which is all a derived cell needs to decide whether its cached
//! value is still current.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

thread_local! {
    /// Write clock shared by every cell on this thread.
    static CLOCK: Cell<u64> = const { Cell::new(0) };
}

/// Advance the write clock and return the new tick.
pub(crate) fn tick() -> u64 {
    CLOCK.with(|clock| {
        let next = clock.get() + 1;
        clock.set(next);
        next
    })
}

/// Current value of the write clock.
pub(crate) fn now() -> u64 {
    CLOCK.with(Cell::get)
}

/// Anything a derived cell can depend on.
pub(crate) trait Source {
    /// Bring the source up to date and return its current version.
    fn version(&self) -> u64;
}

/// A cell read during a computation, and the version that read observed.
#[derive(Clone)]
pub(crate) struct Dependency {
    source: Rc<dyn Source>,
    version: u64,
}

impl Dependency {
    /// Whether the source still sits at the observed version.
    pub(crate) fn is_current(&self) -> bool {
        self.source.version() == self.version
    }
}

/// Dependency-tracking token passed to every reactive read.
///
/// User code creates untracked monitors with [`Monitor::new`]. Derived cells
/// create tracking monitors internally while they compute.
pub struct Monitor {
    dependencies: Option<RefCell<Vec<Dependency>>>,
}

impl Monitor {
    /// Create an untracked monitor.
    ///
    /// Reads through an untracked monitor return current values and record
    /// nothing.
    pub fn new() -> Self {
        Self { dependencies: None }
    }

    /// Create a monitor that records every read.
    pub(crate) fn tracking() -> Self {
        Self {
            dependencies: Some(RefCell::new(Vec::new())),
        }
    }

    /// Whether reads through this monitor are being recorded.
    pub fn is_tracking(&self) -> bool {
        self.dependencies.is_some()
    }

    /// Record a read of `source` at `version`.
    pub(crate) fn track(&self, source: Rc<dyn Source>, version: u64) {
        if let Some(dependencies) = &self.dependencies {
            dependencies
                .borrow_mut()
                .push(Dependency { source, version });
        }
    }

    /// Number of reads recorded so far.
    pub fn tracked_reads(&self) -> usize {
        self.dependencies
            .as_ref()
            .map_or(0, |dependencies| dependencies.borrow().len())
    }

    pub(crate) fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
            .map(RefCell::into_inner)
            .unwrap_or_default()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("tracking", &self.is_tracking())
            .field("reads", &self.tracked_reads())
            .finish()
    }
}
