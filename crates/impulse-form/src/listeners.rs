//! Listener registries for focus requests and submissions
//!
//! Registries are append-only lists scoped to the node that owns them.
//! Registration returns an [`Unsubscribe`] handle; dropping the node drops
//! its listeners.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Entries<A, R> = RefCell<Vec<(u64, Rc<dyn Fn(&A) -> R>)>>;

/// A list of callbacks invoked with a borrowed argument.
pub(crate) struct Listeners<A: ?Sized, R = ()> {
    entries: Rc<Entries<A, R>>,
    next_id: Cell<u64>,
}

impl<A: ?Sized + 'static, R: 'static> Listeners<A, R> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Register `listener`.
    pub(crate) fn subscribe(&self, listener: impl Fn(&A) -> R + 'static) -> Unsubscribe {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, Rc::new(listener)));

        let entries: Weak<Entries<A, R>> = Rc::downgrade(&self.entries);
        Unsubscribe::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Call every listener registered at the time of the call.
    ///
    /// Listeners may subscribe or unsubscribe while being called.
    pub(crate) fn emit(&self, argument: &A) -> Vec<R> {
        let snapshot: Vec<_> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        snapshot.iter().map(|listener| listener(argument)).collect()
    }
}

impl<A: ?Sized, R> fmt::Debug for Listeners<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.borrow().len())
            .finish()
    }
}

/// Handle returned by listener registration.
///
/// Call [`Unsubscribe::unsubscribe`] to remove the listener. Dropping the
/// handle keeps the listener registered.
#[must_use = "dropping the handle keeps the listener registered forever"]
pub struct Unsubscribe {
    remove: Box<dyn FnOnce()>,
}

impl Unsubscribe {
    fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Box::new(remove),
        }
    }

    /// Remove the listener.
    pub fn unsubscribe(self) {
        (self.remove)();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}
