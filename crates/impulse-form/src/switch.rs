//! # Switch
//!
//! A tagged union of forms. The `active` form's output names the kind of the
//! active branch; `branches` holds one form per kind.
//!
//! ## Active branch
//!
//! The active branch is re-derived on every read: it exists while the active
//! output is a string, number or boolean naming a branch. The output is
//! `{kind, value}` while both the active form and the active branch have
//! outputs, and absent otherwise. Inactive branches never count towards
//! output or validity, but their state stays readable and writable through
//! the `branches` part of the verbose views and setters.
//!
//! ## Concise views
//!
//! Touched, error and validation strategy compare the active form with every
//! branch; dirty and validated only with the active branch. A concise view is
//!
//! - a bare leaf when the active form and every compared branch agree,
//! - otherwise `{active, branch}` where `branch` is the leaf the compared
//!   branches agree on, or the active branch's `{kind, value}` pair, and is
//!   left out when neither exists.
//!
//! Verbose views are always `{active, branches: {kind: ..}}`.
//!
//! ## Setters
//!
//! A setter resolves to a value applied to `active` and every branch, or to a
//! record with any of `active`, `branches` (per-kind) and `branch` (the
//! active branch only). `branch` is applied last, so it wins over `branches`
//! for the active kind. A `{kind, value}` branch setter is ignored unless
//! `kind` is active.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use impulse_signal::{Derived, Monitor};
use serde_json::json;

use crate::aspect::{resolve, Aspect, AspectCells, Cells, Dirty, Errors, Settable, Strategy, Touched, Validated};
use crate::errors::{FormError, Result};
use crate::form::{focus_composite, Form, FormNode, FormOptions, NodeHeader, WeakForm};
use crate::listeners::{Listeners, Unsubscribe};
use crate::nested::{common_leaf, concise_fields, verbose_fields, Agree, Nested};
use crate::setter::{for_each_named, ErrorSetter, FlagSetter, Setter, Spread, StrategySetter, ValueSetter};
use crate::strategy::ValidateStrategy;
use crate::Value;

const ACTIVE: &str = "active";
const BRANCH: &str = "branch";
const BRANCHES: &str = "branches";

/// The branch selected by the active form's output.
#[derive(Clone, Debug)]
pub struct ActiveBranch {
    /// Kind named by the active output
    pub kind: String,
    /// The branch form of that kind
    pub form: Form,
}

impl PartialEq for ActiveBranch {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.form.ptr_eq(&other.form)
    }
}

/// Branch key named by an active output.
fn kind_of(output: &Value) -> Option<String> {
    match output {
        Value::String(kind) => Some(kind.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) struct SwitchState {
    header: NodeHeader,
    active: Form,
    branches: Rc<IndexMap<String, Form>>,
    focus: Listeners<Nested<Option<Value>>>,
    active_branch: Derived<Option<ActiveBranch>>,
    input: Derived<Rc<Value>>,
    initial: Derived<Rc<Value>>,
    output: Derived<Option<Rc<Value>>>,
    cells: AspectCells,
}

fn switch_cells<A: Aspect>(
    active: &Form,
    branches: &Rc<IndexMap<String, Form>>,
    active_branch: &Derived<Option<ActiveBranch>>,
) -> Cells<A::Leaf> {
    let concise = {
        let active = active.clone();
        let branches = branches.clone();
        let active_branch = active_branch.clone();
        move |monitor: &Monitor| {
            let active_concise = A::concise(&active, monitor);
            let current = active_branch.read(monitor);
            let compared: Vec<Rc<Nested<A::Leaf>>> = if A::ACTIVE_ONLY {
                current.iter().map(|branch| A::concise(&branch.form, monitor)).collect()
            } else {
                branches.values().map(|form| A::concise(form, monitor)).collect()
            };
            let agreed = common_leaf(compared.iter().map(|tree| &**tree)).cloned();

            if let Nested::Leaf(leaf) = &*active_concise {
                if compared.is_empty() || agreed.as_ref().is_some_and(|agreed| agreed.agrees(leaf)) {
                    return Nested::Leaf(leaf.clone());
                }
            }

            let branch = match agreed {
                Some(leaf) => Some(Nested::Leaf(leaf)),
                None => current.map(|branch| {
                    let value = A::concise(&branch.form, monitor);
                    Nested::branch(branch.kind, Nested::clone(&value))
                }),
            };
            let mut fields = IndexMap::new();
            fields.insert(ACTIVE.to_string(), Nested::clone(&active_concise));
            if let Some(branch) = branch {
                fields.insert(BRANCH.to_string(), branch);
            }
            Nested::Fields(fields)
        }
    };
    let verbose = {
        let active = active.clone();
        let branches = branches.clone();
        move |monitor: &Monitor| {
            Nested::fields([
                (ACTIVE, Nested::clone(&A::verbose(&active, monitor))),
                (
                    BRANCHES,
                    verbose_fields(
                        branches
                            .iter()
                            .map(|(kind, form)| (kind.clone(), A::verbose(form, monitor)))
                            .collect(),
                    ),
                ),
            ])
        }
    };
    Cells::new(concise, verbose)
}

/// A tagged union of branch forms selected by an active form.
#[derive(Clone)]
pub struct Switch {
    pub(crate) state: Rc<SwitchState>,
}

impl Switch {
    /// A switch over `active` and one branch per kind, all forked into it.
    pub fn new<K, F>(active: impl Into<Form>, branches: impl IntoIterator<Item = (K, F)>) -> Self
    where
        K: Into<String>,
        F: Into<Form>,
    {
        Self::with_options(active, branches, FormOptions::default())
    }

    /// A switch with construction options.
    pub fn with_options<K, F>(
        active: impl Into<Form>,
        branches: impl IntoIterator<Item = (K, F)>,
        options: FormOptions,
    ) -> Self
    where
        K: Into<String>,
        F: Into<Form>,
    {
        let branches: IndexMap<String, Form> = branches
            .into_iter()
            .map(|(kind, form)| (kind.into(), form.into()))
            .collect();
        let switch = Self::assemble(&active.into(), &branches);
        options.apply_to(&switch);
        switch
    }

    fn assemble(active: &Form, branches: &IndexMap<String, Form>) -> Self {
        let state = Rc::new_cyclic(|weak| {
            let parent = WeakForm::Switch(weak.clone());
            let active = active.fork(parent.clone());
            let branches: Rc<IndexMap<String, Form>> = Rc::new(
                branches
                    .iter()
                    .map(|(kind, form)| (kind.clone(), form.fork(parent.clone())))
                    .collect(),
            );

            let active_branch = Derived::new({
                let active = active.clone();
                let branches = branches.clone();
                move |monitor| {
                    let kind = kind_of(&*active.output(monitor)?)?;
                    let form = branches.get(&kind)?.clone();
                    Some(ActiveBranch { kind, form })
                }
            });

            let record = |read: fn(&Form, &Monitor) -> Rc<Value>| {
                let active = active.clone();
                let branches = branches.clone();
                move |monitor: &Monitor| {
                    let branches: serde_json::Map<String, Value> = branches
                        .iter()
                        .map(|(kind, form)| (kind.clone(), Value::clone(&read(form, monitor))))
                        .collect();
                    Rc::new(json!({
                        ACTIVE: Value::clone(&read(&active, monitor)),
                        BRANCHES: branches,
                    }))
                }
            };
            let input = Derived::new(record(|form, monitor| form.input(monitor)));
            let initial = Derived::new(record(|form, monitor| form.initial(monitor)));
            let output = Derived::new({
                let active_branch = active_branch.clone();
                move |monitor| {
                    let branch = active_branch.read(monitor)?;
                    let value = branch.form.output(monitor)?;
                    Some(Rc::new(json!({"kind": branch.kind, "value": Value::clone(&value)})))
                }
            });

            let cells = AspectCells {
                touched: switch_cells::<Touched>(&active, &branches, &active_branch),
                dirty: switch_cells::<Dirty>(&active, &branches, &active_branch),
                validated: switch_cells::<Validated>(&active, &branches, &active_branch),
                errors: switch_cells::<Errors>(&active, &branches, &active_branch),
                strategy: switch_cells::<Strategy>(&active, &branches, &active_branch),
            };

            SwitchState {
                header: NodeHeader::new(),
                active,
                branches,
                focus: Listeners::new(),
                active_branch,
                input,
                initial,
                output,
                cells,
            }
        });
        Self { state }
    }

    /// The embedded active form.
    pub fn active(&self) -> &Form {
        &self.state.active
    }

    /// The embedded branch of `kind`.
    pub fn branch(&self, kind: &str) -> Option<&Form> {
        self.state.branches.get(kind)
    }

    /// The embedded branch of `kind`, or an error naming it.
    pub fn try_branch(&self, kind: &str) -> Result<&Form> {
        self.branch(kind).ok_or_else(|| FormError::unknown_branch(kind))
    }

    /// Every branch with its kind, in declaration order.
    pub fn branches(&self) -> impl Iterator<Item = (&str, &Form)> {
        self.state
            .branches
            .iter()
            .map(|(kind, form)| (kind.as_str(), form))
    }

    /// The branch selected by the active output, if any.
    pub fn active_branch(&self, monitor: &Monitor) -> Option<ActiveBranch> {
        self.state.active_branch.read(monitor)
    }

    /// Register a listener called with the concise error when focus is
    /// requested while the switch is invalid.
    pub fn on_focus_when_invalid(
        &self,
        listener: impl Fn(&Nested<Option<Value>>) + 'static,
    ) -> Unsubscribe {
        self.state.focus.subscribe(listener)
    }

    /// Whether both handles alias the same switch.
    pub fn ptr_eq(&self, other: &Switch) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        &self.state.header
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm::Switch(Rc::downgrade(&self.state))
    }

    pub(crate) fn fork(&self) -> Self {
        Self::assemble(&self.state.active, &self.state.branches)
    }

    pub(crate) fn mark_submitted(&self) {
        self.state.active.mark_submitted();
        self.state.branches.values().for_each(Form::mark_submitted);
    }

    /// The active form, then the active branch.
    pub(crate) fn reachable_children(&self, monitor: &Monitor) -> Vec<Form> {
        let mut children = vec![self.state.active.clone()];
        children.extend(self.active_branch(monitor).map(|branch| branch.form));
        children
    }

    /// Route a resolved setter to the active form and the branches.
    fn route<T: Spread, A>(
        &self,
        setter: Setter<T, A>,
        branches_current: impl Fn() -> (Rc<A>, Rc<A>),
        apply: impl Fn(&Form, Setter<T, A>),
    ) {
        match setter {
            Setter::Value(value) => {
                if let Some(part) = value.field(ACTIVE) {
                    apply(&self.state.active, Setter::Value(part));
                }
                if let Some(part) = value.field(BRANCHES) {
                    self.route_branches(Setter::Value(part), &branches_current, &apply);
                }
            }
            Setter::Fields(mut fields) => {
                if let Some(setter) = fields.shift_remove(ACTIVE) {
                    apply(&self.state.active, setter);
                }
                if let Some(setter) = fields.shift_remove(BRANCHES) {
                    self.route_branches(setter, &branches_current, &apply);
                }
                if let Some(setter) = fields.shift_remove(BRANCH) {
                    self.route_branch(setter, &apply);
                }
                for name in fields.keys() {
                    tracing::trace!(name = %name, "ignoring setter for unknown switch role");
                }
            }
            other => {
                tracing::trace!(variant = other.variant(), "ignoring setter on switch");
            }
        }
    }

    fn route_branches<T: Spread, A>(
        &self,
        setter: Setter<T, A>,
        current: &impl Fn() -> (Rc<A>, Rc<A>),
        apply: &impl Fn(&Form, Setter<T, A>),
    ) {
        let setter = setter.unfold(current);
        let branches = &self.state.branches;
        for_each_named(setter, branches.keys().map(String::as_str), |kind, setter| {
            match branches.get(kind) {
                Some(form) => apply(form, setter),
                None => tracing::trace!(kind, "ignoring setter for unknown branch"),
            }
        });
    }

    fn route_branch<T, A>(&self, setter: Setter<T, A>, apply: &impl Fn(&Form, Setter<T, A>)) {
        let Some(current) = self.active_branch(&Monitor::new()) else {
            tracing::trace!("ignoring branch setter without an active branch");
            return;
        };
        match setter {
            Setter::Branch { kind, value } => {
                if kind == current.kind {
                    apply(&current.form, *value);
                } else {
                    tracing::trace!(expected = %kind, active = %current.kind, "ignoring setter for inactive branch");
                }
            }
            other => apply(&current.form, other),
        }
    }

    /// Current `branches` part of the input or initial value.
    fn branches_value(value: &Value) -> Rc<Value> {
        Rc::new(value.get(BRANCHES).cloned().unwrap_or(Value::Null))
    }

    /// Concise and verbose trees over every branch.
    fn branch_trees<A: Aspect>(&self, monitor: &Monitor) -> (Rc<Nested<A::Leaf>>, Rc<Nested<A::Leaf>>) {
        let branches = &self.state.branches;
        let concise = concise_fields(
            branches
                .iter()
                .map(|(kind, form)| (kind.clone(), A::concise(form, monitor)))
                .collect(),
            A::empty(),
        );
        let verbose = verbose_fields(
            branches
                .iter()
                .map(|(kind, form)| (kind.clone(), A::verbose(form, monitor)))
                .collect(),
        );
        (Rc::new(concise), Rc::new(verbose))
    }

    fn set_aspect<A: Settable>(&self, setter: Setter<A::Leaf, Nested<A::Leaf>>) {
        let setter = resolve::<A>(&self.to_form(), setter);
        let monitor = Monitor::new();
        self.route(
            setter,
            || self.branch_trees::<A>(&monitor),
            |form, setter| A::apply(form, setter),
        );
    }
}

impl FormNode for Switch {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.input.read(monitor)
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.input(&monitor), self.initial(&monitor)));
        self.route(
            setter,
            || {
                (
                    Self::branches_value(&self.input(&monitor)),
                    Self::branches_value(&self.initial(&monitor)),
                )
            },
            |form, setter| form.set_input(setter),
        );
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.initial.read(monitor)
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.initial(&monitor), self.input(&monitor)));
        self.route(
            setter,
            || {
                (
                    Self::branches_value(&self.initial(&monitor)),
                    Self::branches_value(&self.input(&monitor)),
                )
            },
            |form, setter| form.set_initial(setter),
        );
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
        self.state.active.is_invalid(monitor)
            || self
                .active_branch(monitor)
                .is_some_and(|branch| branch.form.is_invalid(monitor))
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        if let Some(resetter) = resetter {
            self.set_initial(resetter);
        }
        self.state.active.reset();
        for form in self.state.branches.values() {
            form.reset();
        }
    }

    fn focus_first_invalid_value(&self) -> bool {
        focus_composite(self, &self.state.focus)
    }

    fn to_form(&self) -> Form {
        Form::Switch(self.clone())
    }
}

impl fmt::Debug for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switch")
            .field("active", &self.state.active)
            .field("kinds", &self.state.branches.keys().collect::<Vec<_>>())
            .finish()
    }
}
