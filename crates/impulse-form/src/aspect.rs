//! Derived concise/verbose cells for the per-child aspects of a composite

use std::rc::Rc;

use impulse_signal::{Derived, Monitor};

use crate::form::{Form, FormNode};
use crate::nested::{concise_fields, concise_items, verbose_fields, verbose_items, Agree, Nested};
use crate::setter::{Setter, Spread};
use crate::strategy::ValidateStrategy;
use crate::Value;

/// One of the aspects reported as a concise/verbose pair.
pub(crate) trait Aspect: 'static {
    type Leaf: Spread + PartialEq + Agree + 'static;

    /// Whether a switch consults only its active branch for this aspect.
    const ACTIVE_ONLY: bool = false;

    /// Concise value of a composite without children.
    fn empty() -> Self::Leaf;

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<Self::Leaf>>;

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<Self::Leaf>>;
}

/// An aspect that callers can write.
pub(crate) trait Settable: Aspect {
    fn apply(form: &Form, setter: Setter<Self::Leaf, Nested<Self::Leaf>>);
}

pub(crate) struct Touched;
pub(crate) struct Dirty;
pub(crate) struct Validated;
pub(crate) struct Errors;
pub(crate) struct Strategy;

impl Aspect for Touched {
    type Leaf = bool;

    fn empty() -> bool {
        false
    }

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.touched(monitor)
    }

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.touched_verbose(monitor)
    }
}

impl Settable for Touched {
    fn apply(form: &Form, setter: Setter<bool, Nested<bool>>) {
        form.set_touched(setter);
    }
}

impl Aspect for Dirty {
    type Leaf = bool;

    const ACTIVE_ONLY: bool = true;

    fn empty() -> bool {
        false
    }

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.dirty(monitor)
    }

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.dirty_verbose(monitor)
    }
}

impl Aspect for Validated {
    type Leaf = bool;

    const ACTIVE_ONLY: bool = true;

    fn empty() -> bool {
        false
    }

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.validated(monitor)
    }

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<bool>> {
        form.validated_verbose(monitor)
    }
}

impl Aspect for Errors {
    type Leaf = Option<Value>;

    fn empty() -> Option<Value> {
        None
    }

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        form.error(monitor)
    }

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        form.error_verbose(monitor)
    }
}

impl Settable for Errors {
    fn apply(form: &Form, setter: Setter<Option<Value>, Nested<Option<Value>>>) {
        form.set_error(setter);
    }
}

impl Aspect for Strategy {
    type Leaf = ValidateStrategy;

    fn empty() -> ValidateStrategy {
        ValidateStrategy::OnTouch
    }

    fn concise(form: &Form, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        form.validate_on(monitor)
    }

    fn verbose(form: &Form, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        form.validate_on_verbose(monitor)
    }
}

impl Settable for Strategy {
    fn apply(form: &Form, setter: Setter<ValidateStrategy, Nested<ValidateStrategy>>) {
        form.set_validate_on(setter);
    }
}

/// Unfold function layers of an aspect setter against `form`'s current
/// `(concise, verbose)` trees.
pub(crate) fn resolve<A: Aspect>(
    form: &Form,
    setter: Setter<A::Leaf, Nested<A::Leaf>>,
) -> Setter<A::Leaf, Nested<A::Leaf>> {
    let monitor = Monitor::new();
    setter.unfold(|| (A::concise(form, &monitor), A::verbose(form, &monitor)))
}

// ============================================================================
// Cells
// ============================================================================

/// A memoized concise/verbose pair.
pub(crate) struct Cells<T> {
    concise: Derived<Rc<Nested<T>>>,
    verbose: Derived<Rc<Nested<T>>>,
}

impl<T: Clone + PartialEq + 'static> Cells<T> {
    pub(crate) fn new(
        concise: impl Fn(&Monitor) -> Nested<T> + 'static,
        verbose: impl Fn(&Monitor) -> Nested<T> + 'static,
    ) -> Self {
        Self {
            concise: Derived::new(move |monitor| Rc::new(concise(monitor))),
            verbose: Derived::new(move |monitor| Rc::new(verbose(monitor))),
        }
    }

    /// A single leaf serving as both representations.
    pub(crate) fn leaf(value: impl Fn(&Monitor) -> T + 'static) -> Self {
        let cell = Derived::new(move |monitor| Rc::new(Nested::Leaf(value(monitor))));
        Self {
            concise: cell.clone(),
            verbose: cell,
        }
    }

    pub(crate) fn concise(&self, monitor: &Monitor) -> Rc<Nested<T>> {
        self.concise.read(monitor)
    }

    pub(crate) fn verbose(&self, monitor: &Monitor) -> Rc<Nested<T>> {
        self.verbose.read(monitor)
    }
}

/// Children of a composite as seen by one read.
pub(crate) enum Children {
    Named(Vec<(String, Form)>),
    Indexed(Vec<Form>),
}

pub(crate) type ChildrenFn = Rc<dyn Fn(&Monitor) -> Children>;

fn child_cells<A: Aspect>(children: &ChildrenFn) -> Cells<A::Leaf> {
    let concise = {
        let children = children.clone();
        move |monitor: &Monitor| match children(monitor) {
            Children::Named(named) => concise_fields(
                named
                    .iter()
                    .map(|(name, form)| (name.clone(), A::concise(form, monitor)))
                    .collect(),
                A::empty(),
            ),
            Children::Indexed(items) => concise_items(
                items.iter().map(|form| A::concise(form, monitor)).collect(),
                A::empty(),
            ),
        }
    };
    let verbose = {
        let children = children.clone();
        move |monitor: &Monitor| match children(monitor) {
            Children::Named(named) => verbose_fields(
                named
                    .iter()
                    .map(|(name, form)| (name.clone(), A::verbose(form, monitor)))
                    .collect(),
            ),
            Children::Indexed(items) => {
                verbose_items(items.iter().map(|form| A::verbose(form, monitor)).collect())
            }
        }
    };
    Cells::new(concise, verbose)
}

/// The five concise/verbose pairs of a composite.
pub(crate) struct AspectCells {
    pub(crate) touched: Cells<bool>,
    pub(crate) dirty: Cells<bool>,
    pub(crate) validated: Cells<bool>,
    pub(crate) errors: Cells<Option<Value>>,
    pub(crate) strategy: Cells<ValidateStrategy>,
}

impl AspectCells {
    /// Cells that collapse over `children` with the shared algebra.
    pub(crate) fn over_children(children: ChildrenFn) -> Self {
        Self {
            touched: child_cells::<Touched>(&children),
            dirty: child_cells::<Dirty>(&children),
            validated: child_cells::<Validated>(&children),
            errors: child_cells::<Errors>(&children),
            strategy: child_cells::<Strategy>(&children),
        }
    }
}
