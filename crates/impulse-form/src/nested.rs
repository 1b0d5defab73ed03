//! # Concise/Verbose Trees
//!
//! Every composite reports its touched, dirty, validated, error and
//! validate-strategy aspects in two representations:
//!
//! - **verbose**: the fully expanded per-child tree, never collapsed.
//! - **concise**: a bare [`Nested::Leaf`] when every child's concise value is
//!   the same leaf, otherwise the per-child tree of concise values.
//!
//! The collapse rule is applied bottom-up, so a concise tree collapses as far
//! up as agreement reaches. Empty composites report a fixed default leaf.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::strategy::ValidateStrategy;
use crate::Value;

/// A per-aspect tree mirroring the structure of a form.
///
/// Serializes untagged, so a tree renders as the plain JSON shape of the form:
/// a leaf as its value, fields as an object, items as an array and a switch
/// branch as `{"kind": .., "value": ..}`. Deserialization tries the variants
/// in that order, so a leaf type that accepts objects or arrays always reads
/// back as a leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nested<T> {
    /// A single value standing for the whole subtree
    Leaf(T),
    /// Named children (shape fields, optional roles, switch parts)
    Fields(IndexMap<String, Nested<T>>),
    /// Positional children (list elements)
    Items(Vec<Nested<T>>),
    /// The active branch of a switch and its own value
    Branch {
        /// Kind of the active branch
        kind: String,
        /// The branch's value for this aspect
        value: Box<Nested<T>>,
    },
}

impl<T> Nested<T> {
    /// Build a [`Nested::Fields`] tree.
    pub fn fields<K: Into<String>>(entries: impl IntoIterator<Item = (K, Nested<T>)>) -> Self {
        Self::Fields(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Build a [`Nested::Items`] tree.
    pub fn items(items: impl IntoIterator<Item = Nested<T>>) -> Self {
        Self::Items(items.into_iter().collect())
    }

    /// Build a [`Nested::Branch`] tree.
    pub fn branch(kind: impl Into<String>, value: Nested<T>) -> Self {
        Self::Branch {
            kind: kind.into(),
            value: Box::new(value),
        }
    }

    /// The leaf value, if this tree is a leaf.
    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Self::Leaf(value) => Some(value),
            _ => None,
        }
    }

    /// A named child of a [`Nested::Fields`] tree.
    pub fn get(&self, name: &str) -> Option<&Nested<T>> {
        match self {
            Self::Fields(fields) => fields.get(name),
            _ => None,
        }
    }

    /// A positional child of a [`Nested::Items`] tree.
    pub fn at(&self, index: usize) -> Option<&Nested<T>> {
        match self {
            Self::Items(items) => items.get(index),
            _ => None,
        }
    }

    /// Whether any leaf satisfies `predicate`.
    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.any_dyn(&predicate)
    }

    /// Whether every leaf satisfies `predicate`.
    ///
    /// Vacuously true for trees without leaves.
    pub fn all(&self, predicate: impl Fn(&T) -> bool) -> bool {
        !self.any_dyn(&|value| !predicate(value))
    }

    fn any_dyn(&self, predicate: &dyn Fn(&T) -> bool) -> bool {
        match self {
            Self::Leaf(value) => predicate(value),
            Self::Fields(fields) => fields.values().any(|child| child.any_dyn(predicate)),
            Self::Items(items) => items.iter().any(|child| child.any_dyn(predicate)),
            Self::Branch { value, .. } => value.any_dyn(predicate),
        }
    }

    /// Apply `f` to every leaf, keeping the structure.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Nested<U> {
        self.map_dyn(&f)
    }

    fn map_dyn<U>(&self, f: &dyn Fn(&T) -> U) -> Nested<U> {
        match self {
            Self::Leaf(value) => Nested::Leaf(f(value)),
            Self::Fields(fields) => Nested::Fields(
                fields
                    .iter()
                    .map(|(name, child)| (name.clone(), child.map_dyn(f)))
                    .collect(),
            ),
            Self::Items(items) => Nested::Items(items.iter().map(|child| child.map_dyn(f)).collect()),
            Self::Branch { kind, value } => Nested::Branch {
                kind: kind.clone(),
                value: Box::new(value.map_dyn(f)),
            },
        }
    }
}

impl Nested<bool> {
    /// Whether any leaf is `true`.
    pub fn is_any(&self) -> bool {
        self.any(|flag| *flag)
    }

    /// Whether every leaf is `true`.
    pub fn is_all(&self) -> bool {
        self.all(|flag| *flag)
    }
}

impl<T: Default> Default for Nested<T> {
    fn default() -> Self {
        Self::Leaf(T::default())
    }
}

// ============================================================================
// Collapse algebra
// ============================================================================

/// Agreement between leaves reported by different children.
pub(crate) trait Agree {
    fn agrees(&self, other: &Self) -> bool;
}

impl Agree for bool {
    fn agrees(&self, other: &Self) -> bool {
        self == other
    }
}

impl Agree for ValidateStrategy {
    fn agrees(&self, other: &Self) -> bool {
        self == other
    }
}

/// Errors agree when both are absent or both are the same primitive.
///
/// Arrays and objects coming from different children are distinct errors even
/// when their contents match, so they never collapse.
impl Agree for Option<Value> {
    fn agrees(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(Value::Array(_) | Value::Object(_)), _) => false,
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }
}

/// The leaf every tree agrees on.
///
/// `None` when there are no trees, when any tree is not a leaf, or when two
/// leaves disagree. A single leaf always agrees with itself.
pub(crate) fn common_leaf<'a, T: Agree + 'a>(
    trees: impl IntoIterator<Item = &'a Nested<T>>,
) -> Option<&'a T> {
    let mut trees = trees.into_iter();
    let first = trees.next()?.as_leaf()?;
    trees
        .all(|tree| tree.as_leaf().is_some_and(|leaf| first.agrees(leaf)))
        .then_some(first)
}

/// Concise tree over named children.
pub(crate) fn concise_fields<T: Clone + Agree>(
    children: Vec<(String, Rc<Nested<T>>)>,
    empty: T,
) -> Nested<T> {
    if children.is_empty() {
        return Nested::Leaf(empty);
    }
    if let Some(leaf) = common_leaf(children.iter().map(|(_, child)| &**child)) {
        return Nested::Leaf(leaf.clone());
    }
    verbose_fields(children)
}

/// Verbose tree over named children.
pub(crate) fn verbose_fields<T: Clone>(children: Vec<(String, Rc<Nested<T>>)>) -> Nested<T> {
    Nested::Fields(
        children
            .into_iter()
            .map(|(name, child)| (name, Nested::clone(&child)))
            .collect(),
    )
}

/// Concise tree over positional children.
pub(crate) fn concise_items<T: Clone + Agree>(children: Vec<Rc<Nested<T>>>, empty: T) -> Nested<T> {
    if children.is_empty() {
        return Nested::Leaf(empty);
    }
    if let Some(leaf) = common_leaf(children.iter().map(|child| &**child)) {
        return Nested::Leaf(leaf.clone());
    }
    verbose_items(children)
}

/// Verbose tree over positional children.
pub(crate) fn verbose_items<T: Clone>(children: Vec<Rc<Nested<T>>>) -> Nested<T> {
    Nested::Items(children.iter().map(|child| Nested::clone(child)).collect())
}
