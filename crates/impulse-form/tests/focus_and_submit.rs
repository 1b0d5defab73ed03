//! Focus dispatch and submission
//!
//! Submission always runs from the root form. Invalid submissions focus the
//! first invalid value in pre-order; valid ones run every submit listener and
//! resolve once all listener futures resolved.

#![allow(clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::block_on;
use impulse_form::{
    Form, FormNode, FormOptions, List, Monitor, Nested, Shape, Unit, ValidateStrategy, Value,
};
use serde_json::json;

fn required(value: &Value) -> Result<Value, Value> {
    match value.as_str() {
        Some("") | None => Err(json!("Required")),
        Some(_) => Ok(value.clone()),
    }
}

fn signup(name: &str, email: &str) -> Shape {
    Shape::with_options(
        [
            ("name", Unit::builder(name).validate(required).build()),
            ("email", Unit::builder(email).validate(required).build()),
        ],
        FormOptions::new().validate_on(ValidateStrategy::OnSubmit),
    )
}

fn unit_field(shape: &Shape, name: &str) -> Unit {
    shape
        .field(name)
        .and_then(Form::as_unit)
        .cloned()
        .expect("unit field")
}

type Log = Rc<RefCell<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn record_focus(unit: &Unit, label: &'static str, log: &Log) -> impulse_form::Unsubscribe {
    let log = log.clone();
    unit.on_focus_when_invalid(move |_| log.borrow_mut().push(label.to_string()))
}

/// An invalid submission focuses only the first invalid value
#[test]
fn test_invalid_submit_focuses_first_invalid() {
    init_tracing();
    let form = signup("", "");
    let log: Log = Rc::default();
    let _name = record_focus(&unit_field(&form, "name"), "name", &log);
    let _email = record_focus(&unit_field(&form, "email"), "email", &log);
    let submitted: Log = Rc::default();
    let _submit = form.on_submit({
        let submitted = submitted.clone();
        move |output: &Value| {
            submitted.borrow_mut().push(output.to_string());
            async {}
        }
    });

    block_on(form.submit());

    let monitor = Monitor::new();
    assert_eq!(*log.borrow(), vec!["name".to_string()]);
    assert!(submitted.borrow().is_empty());
    assert_eq!(form.submit_count(&monitor), 1);
    assert!(!form.is_submitting(&monitor));
}

/// Submitting validates onSubmit fields
#[test]
fn test_submit_validates_on_submit_fields() {
    let form = signup("", "a@b.c");
    let monitor = Monitor::new();

    assert_eq!(*form.validated(&monitor), Nested::Leaf(false));
    assert_eq!(*form.error(&monitor), Nested::Leaf(None));

    block_on(form.submit());

    assert_eq!(*form.validated(&monitor), Nested::Leaf(true));
    assert_eq!(
        serde_json::to_value(&*form.error(&monitor)).expect("serialize"),
        json!({"name": "Required", "email": null})
    );
}

/// A valid submission calls every listener with its own node's output
#[test]
fn test_valid_submit_runs_listeners() {
    init_tracing();
    let form = signup("Ada", "ada@example.com");
    let calls: Log = Rc::default();

    let _root = form.on_submit({
        let calls = calls.clone();
        move |output: &Value| {
            let calls = calls.clone();
            let output = output.clone();
            async move { calls.borrow_mut().push(format!("root {output}")) }
        }
    });
    let _name = unit_field(&form, "name").on_submit({
        let calls = calls.clone();
        move |output: &Value| {
            let calls = calls.clone();
            let output = output.clone();
            async move { calls.borrow_mut().push(format!("name {output}")) }
        }
    });

    let monitor = Monitor::new();
    let pending = form.submit();
    assert!(form.is_submitting(&monitor));
    block_on(pending);
    assert!(!form.is_submitting(&monitor));

    let calls = calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&r#"root {"name":"Ada","email":"ada@example.com"}"#.to_string()));
    assert!(calls.contains(&r#"name "Ada""#.to_string()));
}

/// Submitting a child submits the whole form
#[test]
fn test_child_submit_runs_from_root() {
    let form = signup("Ada", "");
    let name = unit_field(&form, "name");
    let monitor = Monitor::new();

    block_on(name.submit());

    assert_eq!(form.submit_count(&monitor), 1);
    assert_eq!(name.submit_count(&monitor), 1);
    assert_eq!(form.output(&monitor), None);
    assert!(unit_field(&form, "email").is_validated(&monitor));
}

/// A composite's own focus listener is called before its children's
#[test]
fn test_composite_focus_listener_comes_first() {
    let form = signup("", "");
    form.set_validate_on(ValidateStrategy::OnInit);
    let log: Log = Rc::default();
    let _child = record_focus(&unit_field(&form, "name"), "name", &log);
    let _own = form.on_focus_when_invalid({
        let log = log.clone();
        move |error: &Nested<Option<Value>>| {
            log.borrow_mut()
                .push(serde_json::to_string(error).unwrap_or_default())
        }
    });

    assert!(form.focus_first_invalid_value());
    assert_eq!(*log.borrow(), vec![r#""Required""#.to_string()]);
}

/// Focus skips valid elements and reaches into nested lists
#[test]
fn test_focus_reaches_nested_list_elements() {
    let list = List::with_options(
        [
            Unit::builder("ok").validate(required).build(),
            Unit::builder("").validate(required).build(),
        ],
        FormOptions::new().validate_on(ValidateStrategy::OnInit),
    );
    let log: Log = Rc::default();
    let monitor = Monitor::new();
    let elements = list.elements(&monitor);
    let _subscriptions: Vec<_> = elements
        .iter()
        .zip(["first", "second"])
        .map(|(element, label)| {
            record_focus(element.as_unit().expect("unit element"), label, &log)
        })
        .collect();

    assert!(list.focus_first_invalid_value());
    assert_eq!(*log.borrow(), vec!["second".to_string()]);
}

/// Unsubscribed listeners are not called
#[test]
fn test_unsubscribed_listener_is_silent() {
    let form = signup("Ada", "ada@example.com");
    let calls: Log = Rc::default();
    let subscription = form.on_submit({
        let calls = calls.clone();
        move |_: &Value| {
            calls.borrow_mut().push("called".to_string());
            async {}
        }
    });

    subscription.unsubscribe();
    block_on(form.submit());
    assert!(calls.borrow().is_empty());
    assert_eq!(form.submit_count(&Monitor::new()), 1);
}

/// Reset restarts onSubmit validation
#[test]
fn test_reset_after_submit() {
    let form = signup("", "");
    let monitor = Monitor::new();

    block_on(form.submit());
    assert_eq!(*form.validated(&monitor), Nested::Leaf(true));

    form.reset();
    assert_eq!(*form.validated(&monitor), Nested::Leaf(false));
}

/// Dropping a pending submission releases the submitting state
#[test]
fn test_dropped_submit_releases_submitting() {
    let form = signup("Ada", "ada@example.com");
    let _root = form.on_submit(|_: &Value| async {});
    let monitor = Monitor::new();

    let pending = form.submit();
    assert!(form.is_submitting(&monitor));
    drop(pending);

    assert!(!form.is_submitting(&monitor));
    assert_eq!(form.submit_count(&monitor), 1);
}
