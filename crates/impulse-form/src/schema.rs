//! Validation adapters
//!
//! A unit validates its input through a [`Schema`]: a black box turning the
//! raw input into either an output or an error value. Closures of the shape
//! `Fn(&Value) -> Result<Value, Value>` are schemas.

use crate::Value;

/// Parses raw input into a validated output or a validation error.
pub trait Schema {
    /// Parse `input`.
    ///
    /// `Ok` carries the output, `Err` the validation error. The error is data
    /// reported through the unit's error aspect, never a failure of the
    /// library.
    fn parse(&self, input: &Value) -> Result<Value, Value>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<Value, Value>,
{
    fn parse(&self, input: &Value) -> Result<Value, Value> {
        self(input)
    }
}
