//! # List
//!
//! A composite over a resizable sequence of element forms.
//!
//! ## Identity
//!
//! Every element is tagged with a token assigned when it enters the list.
//! Structural edits through [`List::set_elements`] permute, drop and add
//! tokens; the element states travel with their tokens, so an element keeps
//! its own initial value, flags and listeners wherever it moves.
//!
//! List-level `set_initial` remembers each element's own initial value the
//! first time it overrides it. A resetter resolving to an empty array restores
//! those values and forgets them.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use impulse_signal::{Derived, Monitor, Signal};

use crate::aspect::{resolve, AspectCells, Children, Errors, Settable, Strategy, Touched};
use crate::errors::{FormError, Result};
use crate::form::{focus_composite, Form, FormNode, FormOptions, NodeHeader, WeakForm};
use crate::listeners::{Listeners, Unsubscribe};
use crate::nested::Nested;
use crate::setter::{for_each_indexed, ErrorSetter, FlagSetter, Setter, StrategySetter, ValueSetter};
use crate::strategy::ValidateStrategy;
use crate::Value;

type Token = u64;

#[derive(Clone)]
struct Entry {
    token: Token,
    form: Form,
}

pub(crate) struct ListState {
    header: NodeHeader,
    entries: Signal<Rc<Vec<Entry>>>,
    /// Elements removed from the list, re-adopted with their token when they
    /// come back.
    retired: RefCell<Vec<(Token, WeakForm)>>,
    /// Own initial values of elements whose initial was set through the list.
    inherited: RefCell<HashMap<Token, Rc<Value>>>,
    next_token: Cell<Token>,
    focus: Listeners<Nested<Option<Value>>>,
    elements: Derived<Rc<Vec<Form>>>,
    input: Derived<Rc<Value>>,
    initial: Derived<Rc<Value>>,
    output: Derived<Option<Rc<Value>>>,
    cells: AspectCells,
}

fn same_forms(left: &[Form], right: &[Form]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(left, right)| left.ptr_eq(right))
}

/// A composite over an ordered, resizable sequence of forms.
#[derive(Clone)]
pub struct List {
    pub(crate) state: Rc<ListState>,
}

impl List {
    /// A list of `elements`, each forked into the list.
    pub fn new<F: Into<Form>>(elements: impl IntoIterator<Item = F>) -> Self {
        Self::with_options(elements, FormOptions::default())
    }

    /// A list with construction options.
    pub fn with_options<F: Into<Form>>(elements: impl IntoIterator<Item = F>, options: FormOptions) -> Self {
        let elements: Vec<Form> = elements.into_iter().map(Into::into).collect();
        let list = Self::assemble(&elements);
        options.apply_to(&list);
        list
    }

    fn assemble(elements: &[Form]) -> Self {
        let state = Rc::new_cyclic(|weak| {
            let parent = WeakForm::List(weak.clone());
            let entries: Vec<Entry> = elements
                .iter()
                .zip(0..)
                .map(|(form, token)| Entry {
                    token,
                    form: form.fork(parent.clone()),
                })
                .collect();
            let next_token = entries.len() as Token;

            let entries = Signal::with_equals(
                Rc::new(entries),
                |left: &Rc<Vec<Entry>>, right: &Rc<Vec<Entry>>| {
                    left.len() == right.len()
                        && left.iter().zip(right.iter()).all(|(left, right)| left.token == right.token)
                },
            );
            let elements = Derived::with_equals(
                {
                    let entries = entries.clone();
                    move |monitor| {
                        Rc::new(
                            entries
                                .read(monitor)
                                .iter()
                                .map(|entry| entry.form.clone())
                                .collect::<Vec<_>>(),
                        )
                    }
                },
                |left: &Rc<Vec<Form>>, right: &Rc<Vec<Form>>| same_forms(left, right),
            );

            let input = Derived::new({
                let elements = elements.clone();
                move |monitor| {
                    Rc::new(Value::Array(
                        elements
                            .read(monitor)
                            .iter()
                            .map(|form| Value::clone(&form.input(monitor)))
                            .collect(),
                    ))
                }
            });
            let initial = Derived::new({
                let elements = elements.clone();
                move |monitor| {
                    Rc::new(Value::Array(
                        elements
                            .read(monitor)
                            .iter()
                            .map(|form| Value::clone(&form.initial(monitor)))
                            .collect(),
                    ))
                }
            });
            let output = Derived::new({
                let elements = elements.clone();
                move |monitor| {
                    let mut items = Vec::new();
                    for form in elements.read(monitor).iter() {
                        items.push(Value::clone(&*form.output(monitor)?));
                    }
                    Some(Rc::new(Value::Array(items)))
                }
            });
            let cells = AspectCells::over_children(Rc::new({
                let elements = elements.clone();
                move |monitor: &Monitor| Children::Indexed(elements.read(monitor).to_vec())
            }));

            ListState {
                header: NodeHeader::new(),
                entries,
                retired: RefCell::new(Vec::new()),
                inherited: RefCell::new(HashMap::new()),
                next_token: Cell::new(next_token),
                focus: Listeners::new(),
                elements,
                input,
                initial,
                output,
                cells,
            }
        });
        Self { state }
    }

    /// Current elements.
    ///
    /// The same `Rc` is returned for as long as the elements and their order
    /// are unchanged.
    pub fn elements(&self, monitor: &Monitor) -> Rc<Vec<Form>> {
        self.state.elements.read(monitor)
    }

    /// Number of elements.
    pub fn len(&self, monitor: &Monitor) -> usize {
        self.elements(monitor).len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self, monitor: &Monitor) -> bool {
        self.elements(monitor).is_empty()
    }

    /// The element at `index`, or an error naming the current length.
    pub fn try_element(&self, monitor: &Monitor, index: usize) -> Result<Form> {
        let elements = self.elements(monitor);
        elements
            .get(index)
            .cloned()
            .ok_or_else(|| FormError::index_out_of_bounds(index, elements.len()))
    }

    /// Replace the elements.
    ///
    /// `update` receives the current elements and returns the new sequence.
    /// Returned elements that are current or previously removed elements of
    /// this list keep their state; any other form is forked into the list
    /// and keeps its own initial value. Removed elements become inert.
    pub fn set_elements(&self, update: impl FnOnce(&[Form], &Monitor) -> Vec<Form>) {
        let monitor = Monitor::new();
        let current = self.elements(&monitor);
        let next = update(&current, &monitor);

        let state = &self.state;
        let entries = state.entries.peek();
        let parent = self.downgrade();
        let mut retired = state.retired.borrow_mut();
        let mut kept: HashSet<Token> = HashSet::new();
        let mut added = 0usize;

        let adopted: Vec<Entry> = next
            .into_iter()
            .map(|form| {
                if let Some(entry) = entries
                    .iter()
                    .find(|entry| !kept.contains(&entry.token) && entry.form.ptr_eq(&form))
                {
                    kept.insert(entry.token);
                    return entry.clone();
                }
                let returning = retired.iter().position(|(token, weak)| {
                    !kept.contains(token) && weak.upgrade().is_some_and(|old| old.ptr_eq(&form))
                });
                if let Some(position) = returning {
                    let (token, _) = retired.remove(position);
                    kept.insert(token);
                    form.header().set_parent(Some(parent.clone()));
                    return Entry { token, form };
                }
                let token = state.next_token.get();
                state.next_token.set(token + 1);
                kept.insert(token);
                added += 1;
                Entry {
                    token,
                    form: form.fork(parent.clone()),
                }
            })
            .collect();

        let mut removed = 0usize;
        for entry in entries.iter().filter(|entry| !kept.contains(&entry.token)) {
            entry.form.header().set_parent(None);
            retired.push((entry.token, entry.form.downgrade()));
            removed += 1;
        }
        retired.retain(|(_, weak)| weak.upgrade().is_some());

        let live: HashSet<Token> = adopted
            .iter()
            .map(|entry| entry.token)
            .chain(retired.iter().map(|(token, _)| *token))
            .collect();
        state.inherited.borrow_mut().retain(|token, _| live.contains(token));
        drop(retired);

        let len = adopted.len();
        state.entries.write(Rc::new(adopted));
        tracing::debug!(len, added, removed, "list elements changed");
    }

    /// Register a listener called with the concise error when focus is
    /// requested while the list is invalid.
    pub fn on_focus_when_invalid(
        &self,
        listener: impl Fn(&Nested<Option<Value>>) + 'static,
    ) -> Unsubscribe {
        self.state.focus.subscribe(listener)
    }

    /// Whether both handles alias the same list.
    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        &self.state.header
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm::List(Rc::downgrade(&self.state))
    }

    pub(crate) fn fork(&self) -> Self {
        let elements: Vec<Form> = self
            .state
            .entries
            .peek()
            .iter()
            .map(|entry| entry.form.clone())
            .collect();
        Self::assemble(&elements)
    }

    pub(crate) fn mark_submitted(&self) {
        for entry in self.state.entries.peek().iter() {
            entry.form.mark_submitted();
        }
    }

    fn set_aspect<A: Settable>(&self, setter: Setter<A::Leaf, Nested<A::Leaf>>) {
        let setter = resolve::<A>(&self.to_form(), setter);
        let entries = self.state.entries.peek();
        for_each_indexed(setter, entries.len(), |index, setter| {
            A::apply(&entries[index].form, setter);
        });
    }

    /// Put back the own initial values overridden through the list.
    fn restore_own_initials(&self) {
        let inherited = std::mem::take(&mut *self.state.inherited.borrow_mut());
        for entry in self.state.entries.peek().iter() {
            if let Some(own) = inherited.get(&entry.token) {
                entry.form.set_initial(Value::clone(own));
            }
        }
        tracing::trace!(restored = inherited.len(), "list initials restored");
    }
}

/// Whether a resolved resetter asks to drop every inherited initial.
fn clears_inherited(setter: &ValueSetter) -> bool {
    match setter {
        Setter::Items(items) => items.is_empty(),
        Setter::Value(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

impl FormNode for List {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.input.read(monitor)
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.input(&monitor), self.initial(&monitor)));
        let entries = self.state.entries.peek();
        for_each_indexed(setter, entries.len(), |index, setter| {
            entries[index].form.set_input(setter);
        });
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.initial.read(monitor)
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.initial(&monitor), self.input(&monitor)));
        let entries = self.state.entries.peek();
        for_each_indexed(setter, entries.len(), |index, setter| {
            let entry = &entries[index];
            self.state
                .inherited
                .borrow_mut()
                .entry(entry.token)
                .or_insert_with(|| entry.form.initial(&monitor));
            entry.form.set_initial(setter);
        });
    }

    fn output(&self, monitor: &Monitor) -> Option<Rc<Value>> {
        self.state.output.read(monitor)
    }

    fn error(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.cells.errors.concise(monitor)
    }

    fn error_verbose(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.cells.errors.verbose(monitor)
    }

    fn set_error(&self, setter: impl Into<ErrorSetter>) {
        self.set_aspect::<Errors>(setter.into());
    }

    fn touched(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.touched.concise(monitor)
    }

    fn touched_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.touched.verbose(monitor)
    }

    fn set_touched(&self, setter: impl Into<FlagSetter>) {
        self.set_aspect::<Touched>(setter.into());
    }

    fn dirty(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.dirty.concise(monitor)
    }

    fn dirty_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.dirty.verbose(monitor)
    }

    fn validated(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.validated.concise(monitor)
    }

    fn validated_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.cells.validated.verbose(monitor)
    }

    fn validate_on(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.cells.strategy.concise(monitor)
    }

    fn validate_on_verbose(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.cells.strategy.verbose(monitor)
    }

    fn set_validate_on(&self, setter: impl Into<StrategySetter>) {
        self.set_aspect::<Strategy>(setter.into());
    }

    fn is_invalid(&self, monitor: &Monitor) -> bool {
        self.elements(monitor).iter().any(|form| form.is_invalid(monitor))
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        if let Some(resetter) = resetter {
            let monitor = Monitor::new();
            let resolved = resetter.unfold(|| (self.initial(&monitor), self.input(&monitor)));
            if clears_inherited(&resolved) {
                self.restore_own_initials();
            } else {
                self.set_initial(resolved);
            }
        }
        for entry in self.state.entries.peek().iter() {
            entry.form.reset();
        }
    }

    fn focus_first_invalid_value(&self) -> bool {
        focus_composite(self, &self.state.focus)
    }

    fn to_form(&self) -> Form {
        Form::List(self.clone())
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("len", &self.state.entries.peek().len())
            .field("retired", &self.state.retired.borrow().len())
            .finish()
    }
}
