//! Optional form behavior
//!
//! The enabled flag gates the element's output and validity; every other
//! aspect reports both roles.

#![allow(clippy::expect_used)]

use impulse_form::{
    FlagSetter, Form, FormNode, FormOptions, Monitor, Nested, Optional, Shape, Unit,
    ValidateStrategy, Value,
};
use serde_json::json;

fn required(value: &Value) -> Result<Value, Value> {
    match value.as_str() {
        Some("") | None => Err(json!("Required")),
        Some(_) => Ok(value.clone()),
    }
}

fn nickname(enabled: bool, value: &str) -> Optional {
    Optional::with_options(
        Unit::new(enabled),
        Unit::builder(value).validate(required).build(),
        FormOptions::new().validate_on(ValidateStrategy::OnInit),
    )
}

/// A disabled optional is valid regardless of its element
#[test]
fn test_disabled_output() {
    let optional = nickname(false, "");
    let monitor = Monitor::new();

    assert!(!optional.is_enabled(&monitor));
    assert_eq!(optional.output(&monitor).as_deref(), Some(&json!({"enabled": false})));
    assert!(!optional.is_invalid(&monitor));
    assert_eq!(
        *optional.error_verbose(&monitor),
        Nested::fields([("enabled", Nested::Leaf(None)), ("element", Nested::Leaf(Some(json!("Required"))))])
    );
}

/// Enabling makes the element's output and errors count
#[test]
fn test_enabled_output_follows_element() {
    let optional = nickname(false, "");
    let monitor = Monitor::new();

    optional.set_input(json!({"enabled": true}));
    assert!(optional.is_enabled(&monitor));
    assert_eq!(optional.output(&monitor), None);
    assert!(optional.is_invalid(&monitor));

    optional.set_input(json!({"element": "Ace"}));
    assert_eq!(
        optional.output(&monitor).as_deref(),
        Some(&json!({"enabled": true, "element": "Ace"}))
    );
}

/// Input and initial report both roles
#[test]
fn test_input_pairs_both_roles() {
    let optional = nickname(true, "Ace");
    let monitor = Monitor::new();

    assert_eq!(*optional.input(&monitor), json!({"enabled": true, "element": "Ace"}));
    optional.enabled().set_input(json!(false));
    assert_eq!(*optional.input(&monitor), json!({"enabled": false, "element": "Ace"}));
    assert_eq!(
        *optional.dirty(&monitor),
        Nested::fields([("enabled", Nested::Leaf(true)), ("element", Nested::Leaf(false))])
    );
}

/// Flag setters address roles by name or broadcast
#[test]
fn test_flag_setters_on_roles() {
    let optional = nickname(true, "Ace");
    let monitor = Monitor::new();

    optional.set_touched(FlagSetter::fields([("element", true)]));
    assert_eq!(
        *optional.touched(&monitor),
        Nested::fields([("enabled", Nested::Leaf(false)), ("element", Nested::Leaf(true))])
    );

    optional.set_touched(true);
    assert_eq!(*optional.touched(&monitor), Nested::Leaf(true));
}

/// Reset restores both roles
#[test]
fn test_reset_restores_roles() {
    let optional = nickname(false, "Ace");
    let monitor = Monitor::new();

    optional.set_input(json!({"enabled": true, "element": "Bee"}));
    optional.reset();
    assert_eq!(*optional.input(&monitor), json!({"enabled": false, "element": "Ace"}));
}

/// An optional nests inside a shape like any other form
#[test]
fn test_optional_inside_shape() {
    let shape = Shape::with_options(
        [
            ("name", Form::from(Unit::new("Ada"))),
            ("nickname", Form::from(nickname(false, ""))),
        ],
        FormOptions::new().validate_on(ValidateStrategy::OnInit),
    );
    let monitor = Monitor::new();

    assert_eq!(
        shape.output(&monitor).as_deref(),
        Some(&json!({"name": "Ada", "nickname": {"enabled": false}}))
    );

    shape.set_input(json!({"nickname": {"enabled": true}}));
    assert_eq!(shape.output(&monitor), None);

    let nested = shape
        .field("nickname")
        .and_then(Form::as_optional)
        .expect("optional field");
    assert!(nested.is_enabled(&monitor));
}
