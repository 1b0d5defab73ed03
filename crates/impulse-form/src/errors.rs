//! Error type for form API misuse
//!
//! Validation failures are data, not errors: they live in the error aspect of
//! a form and never surface as a `Result`. [`FormError`] only covers lookups
//! and conversions a caller can get wrong, and only for the fallible `try_*`
//! entry points. Setters stay permissive and ignore unknown targets.

use crate::form::FormKind;

/// Error returned by fallible form lookups and conversions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// A form handle was converted into the wrong variant
    #[error("Expected a {expected} form, found a {found} form")]
    VariantMismatch {
        /// Variant the caller asked for
        expected: FormKind,
        /// Variant the handle actually holds
        found: FormKind,
    },

    /// A shape has no form-valued field with this name
    #[error("Unknown field: {name}")]
    UnknownField {
        /// Field name that was looked up
        name: String,
    },

    /// A switch has no branch for this kind
    #[error("Unknown branch: {kind}")]
    UnknownBranch {
        /// Branch kind that was looked up
        kind: String,
    },

    /// A list index past the current element count
    #[error("Index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Current element count
        len: usize,
    },
}

impl FormError {
    /// Create a variant mismatch error
    pub fn variant_mismatch(expected: FormKind, found: FormKind) -> Self {
        Self::VariantMismatch { expected, found }
    }

    /// Create an unknown field error
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Create an unknown branch error
    pub fn unknown_branch(kind: impl Into<String>) -> Self {
        Self::UnknownBranch { kind: kind.into() }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}

/// Standard Result type for form lookups
pub type Result<T> = std::result::Result<T, FormError>;
