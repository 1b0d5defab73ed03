//! # Setters
//!
//! Every mutable aspect of a form is written through a [`Setter`], a tagged
//! union of the ways a caller can describe the next state:
//!
//! - [`Setter::Value`]: a plain value. For touched/error/validate-strategy it
//!   is a scalar applied uniformly to every child. For input/initial it is
//!   structural data split by field name or index.
//! - [`Setter::Fields`]: a partial record, one setter per named child. Names
//!   that are absent leave that child unchanged.
//! - [`Setter::Items`]: a positional list. `None` entries leave that element
//!   unchanged, missing trailing entries too, and excess entries are ignored.
//! - [`Setter::Branch`]: a switch branch setter that asserts which kind it
//!   expects to be active.
//! - [`Setter::Func`]: a function of the current state returning another
//!   setter, which is resolved again.
//!
//! For input/initial setters the function receives `(current, other)`:
//! `(input, initial)` when setting input, `(initial, input)` when setting the
//! initial value or resetting. For the other aspects it receives
//! `(concise, verbose)`.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::nested::Nested;
use crate::strategy::ValidateStrategy;
use crate::Value;

/// Function form of a setter.
pub type SetterFn<T, A> = Rc<dyn Fn(&A, &A) -> Setter<T, A>>;

/// Description of the next state of one aspect of a form.
pub enum Setter<T, A> {
    /// A whole value
    Value(T),
    /// Partial per-name setters
    Fields(IndexMap<String, Setter<T, A>>),
    /// Positional setters, `None` skips an element
    Items(Vec<Option<Setter<T, A>>>),
    /// Setter for a switch's active branch, ignored unless `kind` is active
    Branch {
        /// Kind the caller expects to be active
        kind: String,
        /// Setter applied to that branch
        value: Box<Setter<T, A>>,
    },
    /// A function of the current state
    Func(SetterFn<T, A>),
}

/// Setter for input and initial values, and resetter for `reset_with`.
pub type ValueSetter = Setter<Value, Value>;

/// Setter for touched flags.
pub type FlagSetter = Setter<bool, Nested<bool>>;

/// Setter for custom errors. `Value(None)` clears every error.
pub type ErrorSetter = Setter<Option<Value>, Nested<Option<Value>>>;

/// Setter for validation strategies.
pub type StrategySetter = Setter<ValidateStrategy, Nested<ValidateStrategy>>;

impl<T, A> Setter<T, A> {
    /// A plain value.
    pub fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// A function of the current state.
    pub fn func(f: impl Fn(&A, &A) -> Setter<T, A> + 'static) -> Self {
        Self::Func(Rc::new(f))
    }

    /// Partial per-name setters.
    pub fn fields<K, S>(entries: impl IntoIterator<Item = (K, S)>) -> Self
    where
        K: Into<String>,
        S: Into<Setter<T, A>>,
    {
        Self::Fields(
            entries
                .into_iter()
                .map(|(name, setter)| (name.into(), setter.into()))
                .collect(),
        )
    }

    /// Positional setters.
    pub fn items<S>(items: impl IntoIterator<Item = Option<S>>) -> Self
    where
        S: Into<Setter<T, A>>,
    {
        Self::Items(items.into_iter().map(|item| item.map(Into::into)).collect())
    }

    /// Setter for the switch branch of `kind`, applied only while it is active.
    pub fn branch(kind: impl Into<String>, setter: impl Into<Setter<T, A>>) -> Self {
        Self::Branch {
            kind: kind.into(),
            value: Box::new(setter.into()),
        }
    }

    /// Resolve function layers against the current state.
    ///
    /// `current` is only called when a function layer is actually present.
    pub(crate) fn unfold(self, current: impl Fn() -> (Rc<A>, Rc<A>)) -> Self {
        let mut setter = self;
        loop {
            match setter {
                Self::Func(f) => {
                    let (first, second) = current();
                    setter = f(&first, &second);
                }
                resolved => return resolved,
            }
        }
    }

    /// Variant name for diagnostics.
    pub(crate) fn variant(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Fields(_) => "fields",
            Self::Items(_) => "items",
            Self::Branch { .. } => "branch",
            Self::Func(_) => "func",
        }
    }
}

impl<T: Clone, A> Clone for Setter<T, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Fields(fields) => Self::Fields(fields.clone()),
            Self::Items(items) => Self::Items(items.clone()),
            Self::Branch { kind, value } => Self::Branch {
                kind: kind.clone(),
                value: value.clone(),
            },
            Self::Func(f) => Self::Func(f.clone()),
        }
    }
}

impl<T: fmt::Debug, A> fmt::Debug for Setter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::Items(items) => f.debug_tuple("Items").field(items).finish(),
            Self::Branch { kind, value } => f
                .debug_struct("Branch")
                .field("kind", kind)
                .field("value", value)
                .finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<Value> for ValueSetter {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<bool> for FlagSetter {
    fn from(value: bool) -> Self {
        Self::Value(value)
    }
}

impl From<ValidateStrategy> for StrategySetter {
    fn from(value: ValidateStrategy) -> Self {
        Self::Value(value)
    }
}

impl From<Option<Value>> for ErrorSetter {
    fn from(value: Option<Value>) -> Self {
        Self::Value(value)
    }
}

impl From<Value> for ErrorSetter {
    fn from(value: Value) -> Self {
        Self::Value(Some(value))
    }
}

impl<T> From<Nested<T>> for Setter<T, Nested<T>> {
    fn from(tree: Nested<T>) -> Self {
        match tree {
            Nested::Leaf(value) => Self::Value(value),
            Nested::Fields(fields) => Self::Fields(
                fields
                    .into_iter()
                    .map(|(name, child)| (name, child.into()))
                    .collect(),
            ),
            Nested::Items(items) => {
                Self::Items(items.into_iter().map(|child| Some(child.into())).collect())
            }
            Nested::Branch { kind, value } => Self::Branch {
                kind,
                value: Box::new((*value).into()),
            },
        }
    }
}

// ============================================================================
// Routing resolved setters to children
// ============================================================================

/// How a [`Setter::Value`] is split across children.
pub(crate) trait Spread: Clone {
    /// The part addressed to the child called `name`.
    fn field(&self, name: &str) -> Option<Self>;
    /// The part addressed to the element at `index`.
    fn item(&self, index: usize) -> Option<Self>;
}

impl Spread for Value {
    fn field(&self, name: &str) -> Option<Self> {
        self.as_object().and_then(|object| object.get(name)).cloned()
    }

    fn item(&self, index: usize) -> Option<Self> {
        self.as_array().and_then(|array| array.get(index)).cloned()
    }
}

macro_rules! broadcast {
    ($($ty:ty),* $(,)?) => {$(
        impl Spread for $ty {
            fn field(&self, _name: &str) -> Option<Self> {
                Some(self.clone())
            }

            fn item(&self, _index: usize) -> Option<Self> {
                Some(self.clone())
            }
        }
    )*};
}

broadcast!(bool, ValidateStrategy, Option<Value>);

/// Route a resolved setter to named children.
///
/// `apply` receives every addressed name, including names the composite does
/// not have; callers ignore those.
pub(crate) fn for_each_named<'n, T: Spread, A>(
    setter: Setter<T, A>,
    names: impl IntoIterator<Item = &'n str>,
    mut apply: impl FnMut(&str, Setter<T, A>),
) {
    match setter {
        Setter::Value(value) => {
            for name in names {
                if let Some(part) = value.field(name) {
                    apply(name, Setter::Value(part));
                }
            }
        }
        Setter::Fields(fields) => {
            for (name, setter) in fields {
                apply(&name, setter);
            }
        }
        other => {
            tracing::trace!(variant = other.variant(), "ignoring setter on named children");
        }
    }
}

/// Route a resolved setter to the first `len` positional children.
pub(crate) fn for_each_indexed<T: Spread, A>(
    setter: Setter<T, A>,
    len: usize,
    mut apply: impl FnMut(usize, Setter<T, A>),
) {
    match setter {
        Setter::Value(value) => {
            for index in 0..len {
                if let Some(part) = value.item(index) {
                    apply(index, Setter::Value(part));
                }
            }
        }
        Setter::Items(items) => {
            for (index, item) in items.into_iter().enumerate().take(len) {
                if let Some(setter) = item {
                    apply(index, setter);
                }
            }
        }
        other => {
            tracing::trace!(variant = other.variant(), "ignoring setter on list elements");
        }
    }
}
