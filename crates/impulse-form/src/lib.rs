//! # Composable Form State
//!
//! Validated form state assembled from five node kinds that nest freely:
//!
//! - [`Unit`]: a leaf wrapping one raw value with an optional validator.
//! - [`Shape`]: a fixed record of named children.
//! - [`List`]: an ordered, resizable sequence of children with stable
//!   identities across inserts, removals and reorders.
//! - [`Optional`]: an `enabled` unit gating an `element` form.
//! - [`Switch`]: an `active` form selecting one of several `branches`.
//!
//! ## Reading state
//!
//! Every getter takes a [`Monitor`] and returns an `Rc`. Reads are memoized on
//! top of `impulse-signal` cells: reading twice without an intervening write
//! returns the same `Rc`, and so does a recompute that yields an equal value.
//!
//! Per-child aspects (touched, dirty, validated, error, validation strategy)
//! come in two representations. The verbose one always mirrors the form tree.
//! The concise one collapses to a single [`Nested::Leaf`] whenever all
//! children agree.
//!
//! ## Writing state
//!
//! Writes go through [`Setter`]s: a plain value, a partial per-child record or
//! list, a switch branch setter, or a function of the current state. Setters
//! that address children a node does not have are ignored.
//!
//! ## Usage
//!
//! ```rust
//! use impulse_form::{FormNode, FormOptions, Monitor, Shape, Unit, ValidateStrategy, Value};
//!
//! let required = |value: &Value| match value.as_str() {
//!     Some("") | None => Err(Value::from("Required")),
//!     Some(_) => Ok(value.clone()),
//! };
//! let form = Shape::with_options(
//!     [
//!         ("name", Unit::builder("").validate(required).build()),
//!         ("nickname", Unit::new("")),
//!     ],
//!     FormOptions::new().validate_on(ValidateStrategy::OnInit),
//! );
//!
//! let monitor = Monitor::new();
//! assert!(form.output(&monitor).is_none());
//!
//! form.set_input(serde_json::json!({"name": "Ada"}));
//! assert_eq!(
//!     *form.output(&monitor).expect("valid"),
//!     serde_json::json!({"name": "Ada", "nickname": ""})
//! );
//! ```

#![forbid(unsafe_code)]

mod aspect;
mod errors;
mod form;
mod list;
mod listeners;
mod nested;
mod optional;
mod schema;
mod setter;
mod shape;
mod strategy;
mod switch;
mod unit;

pub use errors::{FormError, Result};
pub use form::{Form, FormExt, FormKind, FormNode, FormOptions};
pub use list::List;
pub use listeners::Unsubscribe;
pub use nested::Nested;
pub use optional::Optional;
pub use schema::Schema;
pub use setter::{ErrorSetter, FlagSetter, Setter, SetterFn, StrategySetter, ValueSetter};
pub use shape::{Shape, ShapeBuilder};
pub use strategy::ValidateStrategy;
pub use switch::{ActiveBranch, Switch};
pub use unit::{Unit, UnitBuilder};

pub use impulse_signal::Monitor;
pub use serde_json::Value;
