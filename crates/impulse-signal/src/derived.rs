//! Derived<T> - a lazily computed, memoized reactive cell
//!
//! A derived cell caches its value together with the dependencies recorded
//! while computing it. A read first checks the write clock: if nothing was
//! written since the cell was last verified, the cached value is returned
//! directly. Otherwise every recorded dependency is asked for its current
//! version (which recursively settles derived dependencies) and the compute
//! function only runs when one of them moved.
//!
//! When a recomputation produces a value equal to the cached one, the cached
//! value is kept and the cell's version does not change. Downstream cells see
//! no change and skip their own recomputation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::monitor::{now, Dependency, Monitor, Source};

struct Cache<T> {
    value: T,
    /// Bumped only when a recomputation yields an unequal value.
    version: u64,
    dependencies: Vec<Dependency>,
    /// Clock tick at which the dependencies were last known current.
    verified_at: u64,
}

struct DerivedInner<T> {
    compute: Box<dyn Fn(&Monitor) -> T>,
    equals: Box<dyn Fn(&T, &T) -> bool>,
    cache: RefCell<Option<Cache<T>>>,
}

impl<T: 'static> DerivedInner<T> {
    /// Bring the cache up to date and hand it to `visit`.
    fn settle<R>(&self, visit: impl FnOnce(&Cache<T>) -> R) -> R {
        let now = now();

        let dependencies = {
            let cache = self.cache.borrow();
            match cache.as_ref() {
                Some(cache) if cache.verified_at == now => return visit(cache),
                Some(cache) => Some(cache.dependencies.clone()),
                None => None,
            }
        };

        if let Some(dependencies) = dependencies {
            if dependencies.iter().all(Dependency::is_current) {
                let mut cache = self.cache.borrow_mut();
                if let Some(cache) = cache.as_mut() {
                    cache.verified_at = now;
                    return visit(cache);
                }
            }
        }

        let monitor = Monitor::tracking();
        let next = (self.compute)(&monitor);
        let dependencies = monitor.into_dependencies();

        let mut slot = self.cache.borrow_mut();
        let cache = match slot.take() {
            Some(mut cache) => {
                if !(self.equals)(&cache.value, &next) {
                    cache.value = next;
                    cache.version += 1;
                }
                cache.dependencies = dependencies;
                cache.verified_at = now;
                cache
            }
            None => Cache {
                value: next,
                version: 0,
                dependencies,
                verified_at: now,
            },
        };
        visit(slot.insert(cache))
    }
}

impl<T: 'static> Source for DerivedInner<T> {
    fn version(&self) -> u64 {
        self.settle(|cache| cache.version)
    }
}

/// A lazily computed reactive cell.
///
/// The compute function receives a tracking [`Monitor`] and must read every
/// cell it depends on through it. It must be pure: writing to cells from
/// inside a computation is not supported.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use impulse_signal::{Derived, Monitor, Signal};
///
/// let items = Signal::new(vec![1, 2, 3]);
/// let total = Derived::new({
///     let items = items.clone();
///     move |monitor| Rc::new(items.read(monitor).iter().sum::<i32>())
/// });
///
/// let monitor = Monitor::new();
/// let first = total.read(&monitor);
///
/// // Same sum, same allocation.
/// items.write(vec![3, 2, 1]);
/// assert!(Rc::ptr_eq(&first, &total.read(&monitor)));
/// ```
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T: Clone + 'static> Derived<T> {
    /// Create a derived cell compared with `PartialEq`.
    pub fn new(compute: impl Fn(&Monitor) -> T + 'static) -> Self
    where
        T: PartialEq,
    {
        Self::with_equals(compute, |left: &T, right: &T| left == right)
    }

    /// Create a derived cell with a custom equality.
    pub fn with_equals(
        compute: impl Fn(&Monitor) -> T + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(DerivedInner {
                compute: Box::new(compute),
                equals: Box::new(equals),
                cache: RefCell::new(None),
            }),
        }
    }

    /// Read the value, recomputing it if a dependency changed.
    pub fn read(&self, monitor: &Monitor) -> T {
        let (value, version) = self
            .inner
            .settle(|cache| (cache.value.clone(), cache.version));
        monitor.track(self.inner.clone(), version);
        value
    }

    /// Current version, settling the cell first.
    pub fn version(&self) -> u64 {
        self.inner.version()
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.cache.borrow();
        f.debug_struct("Derived")
            .field("value", &cache.as_ref().map(|cache| &cache.value))
            .field("version", &cache.as_ref().map(|cache| cache.version))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signal;
    use std::cell::Cell;

    fn counted<T: Clone + PartialEq + 'static>(
        runs: &Rc<Cell<u32>>,
        compute: impl Fn(&Monitor) -> T + 'static,
    ) -> Derived<T> {
        let runs = runs.clone();
        Derived::new(move |monitor| {
            runs.set(runs.get() + 1);
            compute(monitor)
        })
    }

    #[test]
    fn test_derived_is_lazy() {
        let runs = Rc::new(Cell::new(0));
        let derived = counted(&runs, |_| 1);
        assert_eq!(runs.get(), 0);

        assert_eq!(derived.read(&Monitor::new()), 1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_derived_memoizes_between_writes() {
        let source = Signal::new(2);
        let runs = Rc::new(Cell::new(0));
        let derived = counted(&runs, {
            let source = source.clone();
            move |monitor| source.read(monitor) * 10
        });
        let monitor = Monitor::new();

        assert_eq!(derived.read(&monitor), 20);
        assert_eq!(derived.read(&monitor), 20);
        assert_eq!(runs.get(), 1);

        source.write(3);
        assert_eq!(derived.read(&monitor), 30);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_derived_ignores_unrelated_writes() {
        let used = Signal::new(1);
        let unused = Signal::new(1);
        let runs = Rc::new(Cell::new(0));
        let derived = counted(&runs, {
            let used = used.clone();
            move |monitor| used.read(monitor)
        });
        let monitor = Monitor::new();

        derived.read(&monitor);
        unused.write(2);
        derived.read(&monitor);

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_derived_keeps_equal_value_identity() {
        let source = Signal::new(vec![1, 2]);
        let derived = Derived::new({
            let source = source.clone();
            move |monitor| Rc::new(source.read(monitor).len())
        });
        let monitor = Monitor::new();

        let first = derived.read(&monitor);
        let version = derived.version();
        source.write(vec![3, 4]);

        assert!(Rc::ptr_eq(&first, &derived.read(&monitor)));
        assert_eq!(derived.version(), version);
    }

    #[test]
    fn test_derived_chain_stops_at_equal_value() {
        let source = Signal::new(4);
        let parity = Derived::new({
            let source = source.clone();
            move |monitor| source.read(monitor) % 2
        });
        let runs = Rc::new(Cell::new(0));
        let label = counted(&runs, {
            let parity = parity.clone();
            move |monitor| if parity.read(monitor) == 0 { "even" } else { "odd" }
        });
        let monitor = Monitor::new();

        assert_eq!(label.read(&monitor), "even");
        source.write(6);
        assert_eq!(label.read(&monitor), "even");
        assert_eq!(runs.get(), 1);

        source.write(7);
        assert_eq!(label.read(&monitor), "odd");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_derived_tracks_dynamic_dependencies() {
        let flag = Signal::new(true);
        let left = Signal::new(1);
        let right = Signal::new(2);
        let runs = Rc::new(Cell::new(0));
        let derived = counted(&runs, {
            let (flag, left, right) = (flag.clone(), left.clone(), right.clone());
            move |monitor| {
                if flag.read(monitor) {
                    left.read(monitor)
                } else {
                    right.read(monitor)
                }
            }
        });
        let monitor = Monitor::new();

        assert_eq!(derived.read(&monitor), 1);
        right.write(20);
        assert_eq!(derived.read(&monitor), 1);
        assert_eq!(runs.get(), 1);

        flag.write(false);
        assert_eq!(derived.read(&monitor), 20);
        left.write(10);
        assert_eq!(derived.read(&monitor), 20);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_derived_read_is_tracked() {
        let derived = Derived::new(|_| 5);
        let monitor = Monitor::tracking();
        derived.read(&monitor);
        assert_eq!(monitor.tracked_reads(), 1);
    }

    #[test]
    fn test_derived_custom_equality() {
        let source = Signal::new(10);
        let derived = Derived::with_equals(
            {
                let source = source.clone();
                move |monitor| source.read(monitor)
            },
            |a: &i32, b: &i32| a / 10 == b / 10,
        );
        let monitor = Monitor::new();

        assert_eq!(derived.read(&monitor), 10);
        source.write(15);
        assert_eq!(derived.read(&monitor), 10);
        source.write(21);
        assert_eq!(derived.read(&monitor), 21);
    }
}
