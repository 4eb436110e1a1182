//! The closed set of states an evaluated alert instance can be in.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one alert instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum EvalState {
    /// The condition is not met.
    #[default]
    Normal,
    /// The condition is met and has been for long enough to fire.
    Alerting,
    /// The condition is met but has not yet held for the pending period.
    Pending,
    /// The query returned no data.
    NoData,
    /// Evaluation failed.
    Error,
}

impl EvalState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Alerting,
        Self::Pending,
        Self::NoData,
        Self::Error,
    ];

    /// Lower-cased state name, used as the metrics label value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Alerting => "alerting",
            Self::Pending => "pending",
            Self::NoData => "nodata",
            Self::Error => "error",
        }
    }
}

impl core::fmt::Display for EvalState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Normal => "Normal",
            Self::Alerting => "Alerting",
            Self::Pending => "Pending",
            Self::NoData => "NoData",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_lower_cased_display_names() {
        for state in EvalState::ALL {
            assert_eq!(state.as_str(), state.to_string().to_lowercase());
        }
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(EvalState::default(), EvalState::Normal);
    }
}
