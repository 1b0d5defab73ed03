//! Validation trigger strategies

use serde::{Deserialize, Serialize};

/// When a unit starts exposing its validation result.
///
/// A unit is *validated* once the trigger condition has fired since the last
/// reset. Until then its output is absent and its error is hidden.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidateStrategy {
    /// Validated from construction on
    OnInit,
    /// Validated once the unit has been touched
    #[default]
    OnTouch,
    /// Validated once the input differs from the initial value
    OnChange,
    /// Validated once the form has been submitted
    OnSubmit,
}

impl ValidateStrategy {
    /// Get all strategies in order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::OnInit, Self::OnTouch, Self::OnChange, Self::OnSubmit]
    }

    /// Wire name of the strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnInit => "onInit",
            Self::OnTouch => "onTouch",
            Self::OnChange => "onChange",
            Self::OnSubmit => "onSubmit",
        }
    }
}

impl std::fmt::Display for ValidateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
