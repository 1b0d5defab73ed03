//! Unit form behavior
//!
//! Covers validation strategies, schema/transform ordering, custom errors,
//! reset semantics and memoized reads on a standalone unit.

#![allow(clippy::expect_used)]

use std::rc::Rc;

use impulse_form::{
    ErrorSetter, FormNode, Monitor, Nested, Schema, Unit, ValidateStrategy, Value, ValueSetter,
};
use serde_json::json;

/// Schema accepting numbers at or above a bound
struct MinNumber(i64);

impl Schema for MinNumber {
    fn parse(&self, input: &Value) -> Result<Value, Value> {
        match input.as_i64() {
            Some(number) if number >= self.0 => Ok(input.clone()),
            Some(_) => Err(json!(format!(
                "Number must be greater than or equal to {}",
                self.0
            ))),
            None => Err(json!("Expected number")),
        }
    }
}

fn min_one(input: i64) -> Unit {
    Unit::builder(json!(input))
        .schema(MinNumber(1))
        .validate_on(ValidateStrategy::OnInit)
        .build()
}

/// An input below the bound has no output and reports the schema message
#[test]
fn test_output_is_none_while_schema_rejects() {
    let unit = min_one(0);
    let monitor = Monitor::new();

    assert_eq!(unit.output(&monitor), None);
    let error = unit.error_value(&monitor).expect("schema error");
    assert!(error
        .as_str()
        .is_some_and(|message| message.contains("greater than or equal to 1")));

    unit.set_input(json!(1));
    assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(1)));
    assert_eq!(unit.error_value(&monitor), None);
    assert_eq!(*unit.error(&monitor), Nested::Leaf(None));
}

/// An onInit unit stays validated across reset and picks up the initial value
#[test]
fn test_on_init_reset_scenario() {
    let unit = Unit::builder(json!(0))
        .initial(json!(1))
        .schema(MinNumber(1))
        .validate_on(ValidateStrategy::OnInit)
        .build();
    let monitor = Monitor::new();

    assert!(unit.is_validated(&monitor));
    assert_eq!(unit.output(&monitor), None);
    assert!(unit.error_value(&monitor).is_some());

    unit.reset();
    assert_eq!(*unit.input(&monitor), json!(1));
    assert!(unit.is_validated(&monitor));
    assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(1)));
    assert_eq!(unit.error_value(&monitor), None);
}

/// Reset restores the initial value and clears dirtiness
#[test]
fn test_reset_restores_initial_and_clears_dirty() {
    let unit = Unit::new(json!("draft"));
    let monitor = Monitor::new();

    unit.set_input(json!("edited"));
    assert!(unit.is_dirty(&monitor));

    unit.reset();
    assert_eq!(unit.input(&monitor), unit.initial(&monitor));
    assert!(!unit.is_dirty(&monitor));
    assert_eq!(*unit.dirty(&monitor), Nested::Leaf(false));
}

/// `reset_with` receives `(initial, input)` and resets to its result
#[test]
fn test_reset_with_function_resetter() {
    let unit = Unit::new(json!(1));
    unit.set_input(json!(5));

    unit.reset_with(ValueSetter::func(|_initial: &Value, input: &Value| {
        ValueSetter::value(input.clone())
    }));

    let monitor = Monitor::new();
    assert_eq!(*unit.initial(&monitor), json!(5));
    assert_eq!(*unit.input(&monitor), json!(5));
    assert!(!unit.is_dirty(&monitor));
}

/// onTouch units report nothing until touched, then latch validated
#[test]
fn test_on_touch_waits_for_touch() {
    let unit = Unit::builder(json!(0)).schema(MinNumber(1)).build();
    let monitor = Monitor::new();

    assert_eq!(*unit.validate_on(&monitor), Nested::Leaf(ValidateStrategy::OnTouch));
    assert!(!unit.is_validated(&monitor));
    assert_eq!(unit.error_value(&monitor), None);
    assert_eq!(unit.output(&monitor), None);

    unit.set_touched(true);
    assert!(unit.is_validated(&monitor));
    assert!(unit.error_value(&monitor).is_some());

    unit.set_touched(false);
    assert!(unit.is_validated(&monitor), "validated is sticky until reset");

    unit.reset();
    assert!(!unit.is_validated(&monitor));
}

/// onChange units validate once the input moves away from the initial value
#[test]
fn test_on_change_validates_after_change() {
    let unit = Unit::builder(json!(2))
        .schema(MinNumber(1))
        .validate_on(ValidateStrategy::OnChange)
        .build();
    let monitor = Monitor::new();

    assert!(!unit.is_validated(&monitor));
    unit.set_input(json!(0));
    assert!(unit.is_validated(&monitor));

    unit.set_input(json!(2));
    assert!(unit.is_validated(&monitor));
    assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(2)));
}

/// Switching the strategy to onInit validates immediately
#[test]
fn test_strategy_change_revalidates() {
    let unit = Unit::builder(json!(0)).schema(MinNumber(1)).build();
    let monitor = Monitor::new();

    unit.set_validate_on(ValidateStrategy::OnInit);
    assert!(unit.is_validated(&monitor));
    assert!(unit.is_invalid(&monitor));
}

/// The transform runs on the schema's output
#[test]
fn test_transform_runs_after_schema() {
    let unit = Unit::builder(json!(4))
        .schema(MinNumber(1))
        .transform(|value: &Value| json!(value.as_i64().map(|number| number * 10)))
        .validate_on(ValidateStrategy::OnInit)
        .build();
    let monitor = Monitor::new();

    assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(40)));
    unit.set_input(json!(0));
    assert_eq!(unit.output(&monitor), None);
}

/// A custom error hides the output until cleared
#[test]
fn test_custom_error_blocks_output() {
    let unit = Unit::builder(json!(3))
        .validate_on(ValidateStrategy::OnInit)
        .error(json!("Taken"))
        .build();
    let monitor = Monitor::new();

    assert_eq!(unit.output(&monitor), None);
    assert_eq!(*unit.error(&monitor), Nested::Leaf(Some(json!("Taken"))));

    unit.set_error(ErrorSetter::value(None));
    assert_eq!(unit.output(&monitor).as_deref(), Some(&json!(3)));
    assert_eq!(*unit.error(&monitor), Nested::Leaf(None));
}

/// Function input setters receive `(input, initial)`
#[test]
fn test_function_input_setter() {
    let unit = Unit::builder(json!(2)).initial(json!(10)).build();

    unit.set_input(ValueSetter::func(|input: &Value, initial: &Value| {
        let sum = input.as_i64().unwrap_or_default() + initial.as_i64().unwrap_or_default();
        ValueSetter::value(json!(sum))
    }));

    assert_eq!(*unit.input(&Monitor::new()), json!(12));
}

/// Structured setters on a unit are ignored
#[test]
fn test_structured_setter_on_unit_is_ignored() {
    let unit = Unit::new(json!("keep"));
    unit.set_input(ValueSetter::fields([("name", json!("other"))]));
    assert_eq!(*unit.input(&Monitor::new()), json!("keep"));
}

/// A custom input equality drops writes it considers equal
#[test]
fn test_input_equality_drops_equal_writes() {
    let unit = Unit::builder(json!("abc"))
        .input_equals(|left: &Value, right: &Value| {
            left.as_str().map(str::to_lowercase) == right.as_str().map(str::to_lowercase)
        })
        .build();
    let monitor = Monitor::new();
    let before = unit.input(&monitor);

    unit.set_input(json!("ABC"));
    let after = unit.input(&monitor);
    assert!(Rc::ptr_eq(&before, &after));
    assert!(!unit.is_dirty(&monitor));
}

/// Repeated reads without writes return the same allocations
#[test]
fn test_reads_are_memoized() {
    let unit = min_one(0);
    let monitor = Monitor::new();

    assert!(Rc::ptr_eq(&unit.input(&monitor), &unit.input(&monitor)));
    assert!(Rc::ptr_eq(&unit.error(&monitor), &unit.error(&monitor)));
    assert!(Rc::ptr_eq(&unit.touched(&monitor), &unit.touched(&monitor)));

    unit.set_input(json!(5));
    let first = unit.output(&monitor).expect("valid");
    let second = unit.output(&monitor).expect("valid");
    assert!(Rc::ptr_eq(&first, &second));
}

/// The verbose and concise views of a unit are the same leaf
#[test]
fn test_unit_views_are_leaves() {
    let unit = Unit::builder(json!(0)).touched(true).build();
    let monitor = Monitor::new();

    assert_eq!(*unit.touched(&monitor), Nested::Leaf(true));
    assert_eq!(unit.touched(&monitor), unit.touched_verbose(&monitor));
}
