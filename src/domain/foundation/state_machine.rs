//! State machine trait for status enums.
//!
//! Gives lifecycle statuses (payment status today) one shared way of
//! declaring and validating transitions.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors declare the legal edges; validated transitions and
/// terminal detection come for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for PaymentStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Pending, Verified) | (Pending, Failed) /* ... */)
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Verified, Failed, Expired],
///             // ...
///         }
///     }
/// }
///
/// let next = current.transition_to(PaymentStatus::Verified)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Off,
    }

    impl StateMachine for Light {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Red => vec![Light::Green, Light::Off],
                Light::Green => vec![Light::Red, Light::Off],
                Light::Off => vec![],
            }
        }
    }

    #[test]
    fn transition_to_returns_target_when_allowed() {
        assert_eq!(Light::Red.transition_to(Light::Green), Ok(Light::Green));
    }

    #[test]
    fn transition_to_rejects_disallowed_edge() {
        let err = Light::Off.transition_to(Light::Red).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Off to Red"));
    }

    #[test]
    fn is_terminal_only_without_outgoing_edges() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Red.is_terminal());
    }
}
