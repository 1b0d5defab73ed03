//! # Unit
//!
//! The leaf form node. A unit holds one raw input value next to its initial
//! value, a touched flag, a validation strategy and an optional custom error.
//! Output, error, dirty and validated are derived cells over those signals.
//!
//! ## Validation
//!
//! The configured [`Schema`] runs on every input change. Its result is only
//! exposed once the unit is *validated*:
//!
//! - `onInit`: always
//! - `onTouch`: once touched
//! - `onChange`: once the input differed from the initial value
//! - `onSubmit`: once the form was submitted
//!
//! The validated flag is sticky until the next reset. A reset keeps
//! `onInit` units validated and restarts every other strategy.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use impulse_signal::{Derived, Monitor, Signal};

use crate::aspect::Cells;
use crate::form::{Form, FormNode, NodeHeader, WeakForm};
use crate::listeners::{Listeners, Unsubscribe};
use crate::nested::Nested;
use crate::schema::Schema;
use crate::setter::{ErrorSetter, FlagSetter, Setter, StrategySetter, ValueSetter};
use crate::strategy::ValidateStrategy;
use crate::Value;

type Equality = Rc<dyn Fn(&Value, &Value) -> bool>;
type Transform = Rc<dyn Fn(&Value) -> Value>;

/// Immutable configuration shared by a unit and all of its forks.
struct UnitConfig {
    schema: Option<Rc<dyn Schema>>,
    transform: Option<Transform>,
    input_equals: Equality,
    output_equals: Equality,
    default_touched: bool,
}

impl UnitConfig {
    fn validate(&self, input: &Value) -> Result<Value, Value> {
        let parsed = match &self.schema {
            Some(schema) => schema.parse(input)?,
            None => input.clone(),
        };
        Ok(match &self.transform {
            Some(transform) => transform(&parsed),
            None => parsed,
        })
    }
}

/// Writable state of a unit, copied when forking.
struct UnitValues {
    input: Rc<Value>,
    initial: Rc<Value>,
    touched: bool,
    custom_error: Option<Rc<Value>>,
    validate_on: ValidateStrategy,
    validated: bool,
    submitted: bool,
}

pub(crate) struct UnitState {
    header: NodeHeader,
    config: Rc<UnitConfig>,
    input: Signal<Rc<Value>>,
    initial: Signal<Rc<Value>>,
    touched: Signal<bool>,
    custom_error: Signal<Option<Rc<Value>>>,
    validate_on: Signal<ValidateStrategy>,
    validated_flag: Signal<bool>,
    submitted: Cell<bool>,
    focus: Listeners<Value>,
    output: Derived<Option<Rc<Value>>>,
    error: Derived<Option<Rc<Value>>>,
    touched_cells: Cells<bool>,
    dirty_cells: Cells<bool>,
    validated_cells: Cells<bool>,
    error_cells: Cells<Option<Value>>,
    strategy_cells: Cells<ValidateStrategy>,
}

impl UnitState {
    fn new(config: Rc<UnitConfig>, values: UnitValues) -> Rc<Self> {
        let input_equals = config.input_equals.clone();
        let input = Signal::with_equals(values.input, {
            let input_equals = input_equals.clone();
            move |left: &Rc<Value>, right: &Rc<Value>| input_equals(left, right)
        });
        let initial = Signal::with_equals(values.initial, {
            let input_equals = input_equals.clone();
            move |left: &Rc<Value>, right: &Rc<Value>| input_equals(left, right)
        });
        let touched = Signal::new(values.touched);
        let custom_error = Signal::new(values.custom_error);
        let validate_on = Signal::new(values.validate_on);
        let validated_flag = Signal::new(values.validated);

        let validation = Derived::new({
            let config = config.clone();
            let input = input.clone();
            move |monitor| {
                config
                    .validate(&input.read(monitor))
                    .map(Rc::new)
                    .map_err(Rc::new)
            }
        });
        let validated = Derived::new({
            let validate_on = validate_on.clone();
            let validated_flag = validated_flag.clone();
            move |monitor| {
                validate_on.read(monitor) == ValidateStrategy::OnInit || validated_flag.read(monitor)
            }
        });
        let dirty = Derived::new({
            let input = input.clone();
            let initial = initial.clone();
            move |monitor| !input_equals(&input.read(monitor), &initial.read(monitor))
        });
        let output = Derived::with_equals(
            {
                let validated = validated.clone();
                let custom_error = custom_error.clone();
                let validation = validation.clone();
                move |monitor| {
                    if !validated.read(monitor) || custom_error.read(monitor).is_some() {
                        return None;
                    }
                    validation.read(monitor).ok()
                }
            },
            {
                let output_equals = config.output_equals.clone();
                move |left: &Option<Rc<Value>>, right: &Option<Rc<Value>>| match (left, right) {
                    (Some(left), Some(right)) => Rc::ptr_eq(left, right) || output_equals(left, right),
                    (None, None) => true,
                    _ => false,
                }
            },
        );
        let error = Derived::new({
            let validated = validated.clone();
            let custom_error = custom_error.clone();
            move |monitor| match custom_error.read(monitor) {
                Some(custom) => Some(custom),
                None if validated.read(monitor) => validation.read(monitor).err(),
                None => None,
            }
        });

        let touched_cells = Cells::leaf({
            let touched = touched.clone();
            move |monitor| touched.read(monitor)
        });
        let dirty_cells = Cells::leaf(move |monitor| dirty.read(monitor));
        let validated_cells = Cells::leaf(move |monitor| validated.read(monitor));
        let error_cells = Cells::leaf({
            let error = error.clone();
            move |monitor| error.read(monitor).map(|error| Value::clone(&error))
        });
        let strategy_cells = Cells::leaf({
            let validate_on = validate_on.clone();
            move |monitor| validate_on.read(monitor)
        });

        Rc::new(Self {
            header: NodeHeader::new(),
            config,
            input,
            initial,
            touched,
            custom_error,
            validate_on,
            validated_flag,
            submitted: Cell::new(values.submitted),
            focus: Listeners::new(),
            output,
            error,
            touched_cells,
            dirty_cells,
            validated_cells,
            error_cells,
            strategy_cells,
        })
    }
}

/// A leaf form node.
///
/// # Example
///
/// ```rust
/// use impulse_form::{FormNode, Monitor, Unit, ValidateStrategy};
/// use serde_json::{json, Value};
///
/// let age = Unit::builder(json!(0))
///     .validate_on(ValidateStrategy::OnInit)
///     .validate(|input: &Value| match input.as_i64() {
///         Some(age) if age >= 18 => Ok(input.clone()),
///         _ => Err(json!("too young")),
///     })
///     .build();
///
/// let monitor = Monitor::new();
/// assert_eq!(age.output(&monitor), None);
///
/// age.set_input(json!(21));
/// assert_eq!(age.output(&monitor).as_deref(), Some(&json!(21)));
/// ```
#[derive(Clone)]
pub struct Unit {
    pub(crate) state: Rc<UnitState>,
}

impl Unit {
    /// A unit with default options whose initial value equals `input`.
    pub fn new(input: impl Into<Value>) -> Self {
        Self::builder(input).build()
    }

    /// Start configuring a unit.
    pub fn builder(input: impl Into<Value>) -> UnitBuilder {
        UnitBuilder::new(input.into())
    }

    /// The custom error if set, else the validation error once validated.
    pub fn error_value(&self, monitor: &Monitor) -> Option<Rc<Value>> {
        self.state.error.read(monitor)
    }

    /// Whether the unit is touched.
    pub fn is_touched(&self, monitor: &Monitor) -> bool {
        self.state.touched.read(monitor)
    }

    /// Whether the input differs from the initial value.
    pub fn is_dirty(&self, monitor: &Monitor) -> bool {
        self.state.dirty_cells.concise(monitor).is_any()
    }

    /// Whether the validation result is exposed.
    pub fn is_validated(&self, monitor: &Monitor) -> bool {
        self.state.validated_cells.concise(monitor).is_any()
    }

    /// Register a listener called with the error when focus is requested.
    pub fn on_focus_when_invalid(&self, listener: impl Fn(&Value) + 'static) -> Unsubscribe {
        self.state.focus.subscribe(listener)
    }

    /// Whether both handles alias the same unit.
    pub fn ptr_eq(&self, other: &Unit) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn header(&self) -> &NodeHeader {
        &self.state.header
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm::Unit(Rc::downgrade(&self.state))
    }

    /// A fresh unit with a copy of the current values and the same
    /// configuration.
    pub(crate) fn fork(&self) -> Self {
        let state = &self.state;
        let values = UnitValues {
            input: state.input.peek(),
            initial: state.initial.peek(),
            touched: state.touched.peek(),
            custom_error: state.custom_error.peek(),
            validate_on: state.validate_on.peek(),
            validated: state.validated_flag.peek(),
            submitted: state.submitted.get(),
        };
        Self {
            state: UnitState::new(state.config.clone(), values),
        }
    }

    pub(crate) fn mark_submitted(&self) {
        self.state.submitted.set(true);
        self.sync_validated();
    }

    /// Latch the validated flag if the current strategy's trigger holds.
    fn sync_validated(&self) {
        let state = &self.state;
        let fired = match state.validate_on.peek() {
            ValidateStrategy::OnInit => true,
            ValidateStrategy::OnTouch => state.touched.peek(),
            ValidateStrategy::OnChange => {
                !(state.config.input_equals)(&state.input.peek(), &state.initial.peek())
            }
            ValidateStrategy::OnSubmit => state.submitted.get(),
        };
        if fired {
            state.validated_flag.write(true);
        }
    }
}

/// The plain value a leaf setter resolved to.
fn leaf_value<T, A>(setter: Setter<T, A>, aspect: &'static str) -> Option<T> {
    match setter {
        Setter::Value(value) => Some(value),
        other => {
            tracing::trace!(aspect, variant = other.variant(), "ignoring structured setter on unit");
            None
        }
    }
}

impl FormNode for Unit {
    fn input(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.input.read(monitor)
    }

    fn set_input(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.input(&monitor), self.initial(&monitor)));
        if let Some(input) = leaf_value(setter, "input") {
            self.state.input.write(Rc::new(input));
        }
        self.sync_validated();
    }

    fn initial(&self, monitor: &Monitor) -> Rc<Value> {
        self.state.initial.read(monitor)
    }

    fn set_initial(&self, setter: impl Into<ValueSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.initial(&monitor), self.input(&monitor)));
        if let Some(initial) = leaf_value(setter, "initial") {
            self.state.initial.write(Rc::new(initial));
        }
        self.sync_validated();
    }

    fn output(&self, monitor: &Monitor) -> Option<Rc<Value>> {
        self.state.output.read(monitor)
    }

    fn error(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.error_cells.concise(monitor)
    }

    fn error_verbose(&self, monitor: &Monitor) -> Rc<Nested<Option<Value>>> {
        self.state.error_cells.verbose(monitor)
    }

    fn set_error(&self, setter: impl Into<ErrorSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.error(&monitor), self.error_verbose(&monitor)));
        if let Some(error) = leaf_value(setter, "error") {
            self.state.custom_error.write(error.map(Rc::new));
        }
    }

    fn touched(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.touched_cells.concise(monitor)
    }

    fn touched_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.touched_cells.verbose(monitor)
    }

    fn set_touched(&self, setter: impl Into<FlagSetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.touched(&monitor), self.touched_verbose(&monitor)));
        if let Some(touched) = leaf_value(setter, "touched") {
            self.state.touched.write(touched);
        }
        self.sync_validated();
    }

    fn dirty(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.dirty_cells.concise(monitor)
    }

    fn dirty_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.dirty_cells.verbose(monitor)
    }

    fn validated(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.validated_cells.concise(monitor)
    }

    fn validated_verbose(&self, monitor: &Monitor) -> Rc<Nested<bool>> {
        self.state.validated_cells.verbose(monitor)
    }

    fn validate_on(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.strategy_cells.concise(monitor)
    }

    fn validate_on_verbose(&self, monitor: &Monitor) -> Rc<Nested<ValidateStrategy>> {
        self.state.strategy_cells.verbose(monitor)
    }

    fn set_validate_on(&self, setter: impl Into<StrategySetter>) {
        let monitor = Monitor::new();
        let setter = setter
            .into()
            .unfold(|| (self.validate_on(&monitor), self.validate_on_verbose(&monitor)));
        if let Some(strategy) = leaf_value(setter, "validate_on") {
            self.state.validate_on.write(strategy);
        }
        self.sync_validated();
    }

    fn is_invalid(&self, monitor: &Monitor) -> bool {
        self.error_value(monitor).is_some()
    }

    fn apply_reset(&self, resetter: Option<ValueSetter>) {
        if let Some(resetter) = resetter {
            self.set_initial(resetter);
        }
        let state = &self.state;
        state.input.write(state.initial.peek());
        state.touched.write(state.config.default_touched);
        state.custom_error.write(None);
        state.validated_flag.write(false);
        state.submitted.set(false);
        self.sync_validated();
        tracing::trace!(validate_on = %state.validate_on.peek(), "unit reset");
    }

    fn focus_first_invalid_value(&self) -> bool {
        if self.state.focus.is_empty() {
            return false;
        }
        match self.error_value(&Monitor::new()) {
            Some(error) => {
                tracing::trace!("focusing invalid unit");
                self.state.focus.emit(&error);
                true
            }
            None => false,
        }
    }

    fn to_form(&self) -> Form {
        Form::Unit(self.clone())
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("input", &self.state.input.peek())
            .field("initial", &self.state.initial.peek())
            .field("touched", &self.state.touched.peek())
            .field("validate_on", &self.state.validate_on.peek())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures a [`Unit`] before building it.
#[must_use = "call `build` to create the unit"]
pub struct UnitBuilder {
    input: Value,
    initial: Option<Value>,
    touched: bool,
    validate_on: ValidateStrategy,
    error: Option<Value>,
    schema: Option<Rc<dyn Schema>>,
    transform: Option<Transform>,
    input_equals: Option<Equality>,
    output_equals: Option<Equality>,
}

impl UnitBuilder {
    fn new(input: Value) -> Self {
        Self {
            input,
            initial: None,
            touched: false,
            validate_on: ValidateStrategy::default(),
            error: None,
            schema: None,
            transform: None,
            input_equals: None,
            output_equals: None,
        }
    }

    /// Initial value, defaults to the input.
    pub fn initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    /// Touched flag at construction and after every reset.
    pub fn touched(mut self, touched: bool) -> Self {
        self.touched = touched;
        self
    }

    /// Validation strategy, defaults to `onTouch`.
    pub fn validate_on(mut self, strategy: ValidateStrategy) -> Self {
        self.validate_on = strategy;
        self
    }

    /// Custom error present from construction on.
    pub fn error(mut self, error: impl Into<Value>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Validate through `schema`.
    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Rc::new(schema));
        self
    }

    /// Validate through a function.
    pub fn validate(self, validate: impl Fn(&Value) -> Result<Value, Value> + 'static) -> Self {
        self.schema(validate)
    }

    /// Map the validated value into the output.
    pub fn transform(mut self, transform: impl Fn(&Value) -> Value + 'static) -> Self {
        self.transform = Some(Rc::new(transform));
        self
    }

    /// Equality deciding dirtiness and whether an input write is a change.
    pub fn input_equals(mut self, equals: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        self.input_equals = Some(Rc::new(equals));
        self
    }

    /// Equality deciding whether a recomputed output replaces the old one.
    pub fn output_equals(mut self, equals: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        self.output_equals = Some(Rc::new(equals));
        self
    }

    /// Build the unit.
    pub fn build(self) -> Unit {
        let config = Rc::new(UnitConfig {
            schema: self.schema,
            transform: self.transform,
            input_equals: self
                .input_equals
                .unwrap_or_else(|| Rc::new(|left: &Value, right: &Value| left == right)),
            output_equals: self
                .output_equals
                .unwrap_or_else(|| Rc::new(|left: &Value, right: &Value| left == right)),
            default_touched: self.touched,
        });
        let initial = self.initial.unwrap_or_else(|| self.input.clone());
        let unit = Unit {
            state: UnitState::new(
                config,
                UnitValues {
                    input: Rc::new(self.input),
                    initial: Rc::new(initial),
                    touched: self.touched,
                    custom_error: self.error.map(Rc::new),
                    validate_on: self.validate_on,
                    validated: false,
                    submitted: false,
                },
            ),
        };
        unit.sync_validated();
        unit
    }
}

impl fmt::Debug for UnitBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitBuilder")
            .field("input", &self.input)
            .field("initial", &self.initial)
            .field("touched", &self.touched)
            .field("validate_on", &self.validate_on)
            .field("has_schema", &self.schema.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn min_one(input: &Value) -> Result<Value, Value> {
        match input.as_f64() {
            Some(number) if number >= 1.0 => Ok(input.clone()),
            _ => Err(json!(["Number must be greater than or equal to 1"])),
        }
    }

    #[test]
    fn test_defaults() {
        let unit = Unit::new(json!("a"));
        let monitor = Monitor::new();

        assert_eq!(*unit.initial(&monitor), json!("a"));
        assert!(!unit.is_touched(&monitor));
        assert!(!unit.is_dirty(&monitor));
        assert!(!unit.is_validated(&monitor));
        assert_eq!(*unit.validate_on(&monitor), Nested::Leaf(ValidateStrategy::OnTouch));
        assert_eq!(unit.output(&monitor), None);
    }

    #[test]
    fn test_on_touch_validates_after_touch() {
        let unit = Unit::builder(json!(0)).validate(min_one).build();
        let monitor = Monitor::new();
        assert_eq!(unit.error_value(&monitor), None);

        unit.set_touched(true);
        assert!(unit.is_validated(&monitor));
        assert!(unit.error_value(&monitor).is_some());

        // Validated stays latched until reset.
        unit.set_touched(false);
        assert!(unit.is_validated(&monitor));
    }

    #[test]
    fn test_on_change_validates_when_dirty() {
        let unit = Unit::builder(json!(1))
            .validate_on(ValidateStrategy::OnChange)
            .build();
        let monitor = Monitor::new();
        assert!(!unit.is_validated(&monitor));

        unit.set_input(json!(2));
        assert!(unit.is_validated(&monitor));
        assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(2)));
    }

    #[test]
    fn test_switching_strategy_rechecks_trigger() {
        let unit = Unit::builder(json!(1)).touched(true).validate_on(ValidateStrategy::OnSubmit).build();
        let monitor = Monitor::new();
        assert!(!unit.is_validated(&monitor));

        unit.set_validate_on(ValidateStrategy::OnTouch);
        assert!(unit.is_validated(&monitor));
    }

    #[test]
    fn test_custom_error_blocks_output() {
        let unit = Unit::builder(json!(1)).validate_on(ValidateStrategy::OnInit).build();
        let monitor = Monitor::new();
        assert!(unit.output(&monitor).is_some());

        unit.set_error(json!("taken"));
        assert_eq!(unit.output(&monitor), None);
        assert_eq!(*unit.error(&monitor), Nested::Leaf(Some(json!("taken"))));

        unit.set_error(None);
        assert!(unit.output(&monitor).is_some());
    }

    #[test]
    fn test_transform_maps_output() {
        let unit = Unit::builder(json!(" padded "))
            .validate_on(ValidateStrategy::OnInit)
            .transform(|input| json!(input.as_str().unwrap_or_default().trim()))
            .build();
        assert_eq!(unit.output(&Monitor::new()).as_deref(), Some(&json!("padded")));
    }

    #[test]
    fn test_output_keeps_reference_for_equal_values() {
        let unit = Unit::builder(json!(1))
            .validate_on(ValidateStrategy::OnInit)
            .transform(|input| json!({"value": input}))
            .build();
        let monitor = Monitor::new();
        let first = unit.output(&monitor).unwrap();

        unit.set_input(json!(2));
        unit.set_input(json!(1));
        let second = unit.output(&monitor).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_custom_input_equality_controls_dirty() {
        let unit = Unit::builder(json!("Ab"))
            .input_equals(|left, right| {
                left.as_str().map(str::to_lowercase) == right.as_str().map(str::to_lowercase)
            })
            .build();
        let monitor = Monitor::new();

        unit.set_input(json!("aB"));
        assert!(!unit.is_dirty(&monitor));
        assert_eq!(*unit.input(&monitor), json!("Ab"));
    }

    #[test]
    fn test_function_setters_see_input_and_initial() {
        let unit = Unit::builder(json!(1)).initial(json!(10)).build();
        unit.set_input(Setter::func(|input: &Value, initial: &Value| {
            Setter::Value(json!(input.as_i64().unwrap_or(0) + initial.as_i64().unwrap_or(0)))
        }));
        assert_eq!(*unit.input(&Monitor::new()), json!(11));

        unit.set_initial(Setter::func(|initial: &Value, input: &Value| {
            Setter::Value(json!([initial, input]))
        }));
        assert_eq!(*unit.initial(&Monitor::new()), json!([10, 11]));
    }

    #[test]
    fn test_structured_setters_are_ignored() {
        let unit = Unit::new(json!(1));
        unit.set_touched(FlagSetter::fields([("a", true)]));
        assert!(!unit.is_touched(&Monitor::new()));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let unit = Unit::builder(json!(0)).touched(true).validate(min_one).build();
        let monitor = Monitor::new();
        unit.set_input(json!(5));
        unit.set_touched(false);
        unit.set_error(json!("server"));

        unit.reset();
        assert_eq!(*unit.input(&monitor), json!(0));
        assert!(unit.is_touched(&monitor));
        assert_eq!(*unit.error(&monitor), Nested::Leaf(Some(json!(["Number must be greater than or equal to 1"]))));
    }

    #[test]
    fn test_reset_with_resetter_sees_initial_then_input() {
        let unit = Unit::new(json!(1));
        unit.set_input(json!(7));
        unit.reset_with(Setter::func(|_initial: &Value, input: &Value| Setter::Value(input.clone())));

        let monitor = Monitor::new();
        assert_eq!(*unit.initial(&monitor), json!(7));
        assert_eq!(*unit.input(&monitor), json!(7));
    }

    #[test]
    fn test_on_touch_reset_clears_validated() {
        let unit = Unit::new(json!(1));
        unit.set_touched(true);
        unit.reset();
        assert!(!unit.is_validated(&Monitor::new()));
    }

    #[test]
    fn test_fork_copies_values_but_not_listeners() {
        let unit = Unit::builder(json!(1)).validate(min_one).build();
        let calls = Rc::new(Cell::new(0));
        let _handle = unit.on_focus_when_invalid({
            let calls = calls.clone();
            move |_| calls.set(calls.get() + 1)
        });
        unit.set_input(json!(0));
        unit.set_touched(true);

        let fork = unit.fork();
        let monitor = Monitor::new();
        assert_eq!(*fork.input(&monitor), json!(0));
        assert!(fork.is_validated(&monitor));
        assert!(!fork.ptr_eq(&unit));
        assert!(!fork.focus_first_invalid_value());
        assert!(unit.focus_first_invalid_value());
        assert_eq!(calls.get(), 1);
    }
}
