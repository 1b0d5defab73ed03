//! Signal<T> - a writable reactive cell
//!
//! `Signal<T>` stores a value and a version. Every accepted write stamps the
//! signal with a fresh tick of the thread-local write clock; derived cells
//! compare those stamps to decide whether to recompute.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::monitor::{tick, Monitor, Source};

struct SignalInner<T> {
    /// The current value.
    value: RefCell<T>,
    /// Clock tick of the last accepted write (0 before any write).
    version: Cell<u64>,
    /// Writes equal to the current value are dropped.
    equals: Box<dyn Fn(&T, &T) -> bool>,
}

impl<T> Source for SignalInner<T> {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

/// A writable reactive cell.
///
/// `Signal<T>` provides:
/// - `read()`: Read the value and record the read on the monitor
/// - `peek()`: Read the value without recording anything
/// - `write()`: Replace the value unless it compares equal
/// - `update()`: Derive the next value from the current one
///
/// Clones share the same cell.
///
/// # Example
///
/// ```rust
/// use impulse_signal::{Monitor, Signal};
///
/// let name = Signal::new(String::from("a"));
/// assert!(!name.write(String::from("a")));
/// assert!(name.write(String::from("b")));
/// assert_eq!(name.read(&Monitor::new()), "b");
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal compared with `PartialEq`.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equals(value, |left: &T, right: &T| left == right)
    }

    /// Create a signal with a custom equality.
    pub fn with_equals(value: T, equals: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                equals: Box::new(equals),
            }),
        }
    }

    /// Read the current value, recording the read on `monitor`.
    pub fn read(&self, monitor: &Monitor) -> T {
        monitor.track(self.inner.clone(), self.inner.version.get());
        self.peek()
    }

    /// Read the current value without recording a dependency.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value.
    ///
    /// Returns `false` and leaves the signal untouched when `value` compares
    /// equal to the current value.
    pub fn write(&self, value: T) -> bool {
        if (self.inner.equals)(&self.inner.value.borrow(), &value) {
            return false;
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(tick());
        true
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.inner.value.borrow());
        self.write(next)
    }

    /// Clock tick of the last accepted write.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}
