//! # Optional
//!
//! A two-role composite: an `enabled` unit and an `element` form. The element
//! only counts towards the output while the enabled unit's output is `true`.
//! Every other aspect reports both roles regardless of the flag.

use std::fmt;
use std::rc::Rc;

use impulse_signal::{Derived, Monitor};
use serde_json::json;

use crate::aspect::{resolve, AspectCells, Children, Errors, Settable, Strategy, Touched};
use crate::form::{focus_composite, Form, FormNode, FormOptions, NodeHeader, WeakForm};
use crate::listeners::{Listeners, Unsubscribe};
use crate::nested::Nested;
use crate::setter::{for_each_named, ErrorSetter, FlagSetter, Setter, StrategySetter, ValueSetter};
use crate::strategy::ValidateStrategy;
use crate::unit::Unit;
use crate::Value;

const ENABLED: &str = "enabled";
const ELEMENT: &str = "element";

pub(crate) struct OptionalState {
    header: NodeHeader,
    enabled_unit: Unit,
    enabled: Form,
    element: Form,
    focus: Listeners<Nested<Option<Value>>>,
    input: Derived<Rc<Value>>,
    initial: Derived<Rc<Value>>,
    output: Derived<Option<Rc<Value>>>,
    cells: AspectCells,
}

fn is_enabled(enabled: &Form, monitor: &Monitor) -> bool {
    enabled.output(monitor).as_deref() == Some(&Value::Bool(true))
}

/// A form whose element is gated by an enabled flag.
#[derive(Clone)]
pub struct Optional {
    pub(crate) state: Rc<OptionalState>,
}

impl Optional {
    /// An optional over `enabled` and `element`, both forked into it.
    pub fn new(enabled: Unit, element: impl Into<Form>) -> Self {
        Self::with_options(enabled, element, FormOptions::default())
    }

    /// An optional with construction options.
    pub fn with_options(enabled: Unit, element: impl Into<Form>, options: FormOptions) -> Self {
        let optional = Self::assemble(&enabled, &element.into());
        options.apply_to(&optional);
        optional
    }

    fn assemble(enabled: &Unit, element: &Form) -> Self {
        let state = Rc::new_cyclic(|weak| {
            let parent = WeakForm::Optional(weak.clone());
            let enabled_unit = enabled.fork();
            enabled_unit.header().set_parent(Some(parent.clone()));
            let enabled = Form::Unit(enabled_unit.clone());
            let element = element.fork(parent);

            let pair = |read: fn(&Form, &Monitor) -> Rc<Value>| {
                let enabled = enabled.clone();
                let element = element.clone();
                move |monitor: &Monitor| {
                    Rc::new(json!({
                        ENABLED: Value::clone(&read(&enabled, monitor)),
                        ELEMENT: Value::clone(&read(&element, monitor)),
                    }))
                }
            };
            let input = Derived::new(pair(|form, monitor| form.input(monitor)));
            let initial = Derived::new(pair(|form, monitor| form.initial(monitor)));
            let output = Derived::new({
                let enabled = enabled.clone();
                let element = element.clone();
                move |monitor| match &*enabled.output(monitor)? {
                    Value::Bool(true) => element.output(monitor).map(|element| {
                        Rc::new(json!({ ENABLED: true, ELEMENT: Value::clone(&element) }))
                    }),
                    _ => Some(Rc::new(json!({ ENABLED: false }))),
                }
            });
            let cells = AspectCells::over_children(Rc::new({
                let children = vec![
                    (ENABLED.to_string(), enabled.clone()),
                    (ELEMENT.to_string(), element.clone()),
                ];
                move |_: &Monitor| Children::Named(children.clone())
            }));

            OptionalState {
                header: NodeHeader::new(),
                enabled_unit,
                enabled,
                element,
                focus: Listeners::new(),
                input,
                initial,
                output,
                cells,
            }
        });
        Self { state }
    }

    /// The embedded enabled unit.
    pub fn enabled(&self) -> &Unit {
        &self.state.enabled_unit
    }

    /// The embedded element form.
    pub fn element(&self) -> &Form {
        &self.state.element
    }

    /// Whether the enabled unit's output is `true`.
    pub fn is_enabled(&self, monitor: &Monitor) -> bool {
        is_enabled(&self.state.enabled, monitor)
    }

    /// Register a listener called with the concise error when focus is
    /// requested while the optional is invalid.
    pub fn on_focus_when_invalid(
        &self,
        listener: impl Fn(&Nested<Option<Value>>) + 'static,
    ) -> Unsubscribe {
        self.state.focus.subscribe(listener)
    }

    /// Whether both handles alias the same optional.
    pub fn ptr_eq(&self, other: &Optional) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        &self.state.header
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm::Optional(Rc::downgrade(&self.state))
    }

    pub(crate) fn fork(&self) -> Self {
        Self::assemble(&self.state.enabled_unit, &self.state.element)
    }

    pub(crate) fn mark_submitted(&self) {
        self.state.enabled.mark_submitted();
        self.state.element.mark_submitted();
    }

    /// The enabled unit, then the element while enabled.
    pub(crate) fn reachable_children(&self, monitor: &Monitor) -> Vec<Form> {
        let mut children = vec![self.state.enabled.clone()];
        if self.is_enabled(monitor) {
            children.push(self.state.element.clone());
        }
        children
    }

    fn role(&self, name: &str) -> Option<&Form> {
        match name {
            ENABLED => Some(&self.state.enabled),
            ELEMENT => Some(&self.state.element),
            _ => None,
        }
    }

    fn set_values(&self, setter: ValueSetter, apply: impl Fn(&Form, ValueSetter)) {
        for_each_named(setter, [ENABLED, ELEMENT], |name, setter| match self.role(name) {
            Some(form) => apply(form, setter),
            None => tracing::trace!(name, "ignoring setter for unknown optional role"),
        });
    }

    fn set_aspect<A: Settable>(&self, setter: Setter<A::Leaf, Nested<A::Leaf>>) {
        let setter = resolve::<A>(&self.to_form(), setter);
        for_each_named(setter, [ENABLED, ELEMENT], |name, setter| match self.role(name) {
            Some(form) => A::apply(form, setter),
            None => tracing::trace!(name, "ignoring setter for unknown optional role"),
        });
    }
}

impl FormNode for Optional {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.input.read(monitor)
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.input(&monitor), self.initial(&monitor)));
        self.set_values(setter, |form, setter| form.set_input(setter));
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.initial.read(monitor)
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.initial(&monitor), self.input(&monitor)));
        self.set_values(setter, |form, setter| form.set_initial(setter));
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
        self.state.enabled.is_invalid(monitor)
            || (self.is_enabled(monitor) && self.state.element.is_invalid(monitor))
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        if let Some(resetter) = resetter {
            self.set_initial(resetter);
        }
        self.state.enabled.reset();
        self.state.element.reset();
    }

    fn focus_first_invalid_value(&self) -> bool {
        focus_composite(self, &self.state.focus)
    }

    fn to_form(&self) -> Form {
        Form::Optional(self.clone())
    }
}

impl fmt::Debug for Optional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optional")
            .field("enabled", &self.state.enabled)
            .field("element", &self.state.element.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(input: &Value) -> Result<Value, Value> {
        match input.as_str() {
            Some(text) if !text.is_empty() => Ok(input.clone()),
            _ => Err(json!("Required")),
        }
    }

    fn optional(enabled: bool) -> Optional {
        Optional::new(
            Unit::builder(json!(enabled))
                .validate_on(ValidateStrategy::OnInit)
                .build(),
            Unit::builder(json!(""))
                .validate_on(ValidateStrategy::OnInit)
                .validate(required)
                .build(),
        )
    }

    #[test]
    fn test_disabled_ignores_invalid_element() {
        let optional = optional(false);
        let monitor = Monitor::new();

        assert_eq!(optional.output(&monitor).as_deref(), Some(&json!({"enabled": false})));
        assert!(!optional.is_invalid(&monitor));
        // The element's own state is still inspectable.
        assert_eq!(
            *optional.error(&monitor),
            Nested::fields([("enabled", Nested::Leaf(None)), ("element", Nested::Leaf(Some(json!("Required"))))])
        );
    }

    #[test]
    fn test_enabled_requires_element_output() {
        let optional = optional(true);
        let monitor = Monitor::new();
        assert_eq!(optional.output(&monitor), None);
        assert!(optional.is_invalid(&monitor));

        optional.set_input(json!({"element": "x"}));
        assert_eq!(
            optional.output(&monitor).as_deref(),
            Some(&json!({"enabled": true, "element": "x"}))
        );
    }

    #[test]
    fn test_enabled_output_absent_means_no_output() {
        let optional = Optional::new(Unit::new(json!(true)), Unit::new(json!("x")));
        assert_eq!(optional.output(&Monitor::new()), None);
    }

    #[test]
    fn test_concise_collapses_only_when_roles_agree() {
        let optional = optional(false);
        let monitor = Monitor::new();
        assert_eq!(*optional.touched(&monitor), Nested::Leaf(false));

        optional.set_touched(FlagSetter::fields([("element", true)]));
        assert_eq!(
            *optional.touched(&monitor),
            Nested::fields([("enabled", Nested::Leaf(false)), ("element", Nested::Leaf(true))])
        );
    }
}
