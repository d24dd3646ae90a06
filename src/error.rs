//! Error taxonomy shared by every module of the engine.
//!
//! Errors fall into four families:
//!
//! - **Configuration**: malformed pipeline wiring or property values,
//!   detected before the first generation runs.
//! - **Evaluation**: a [`Function`](crate::representation::Function) failed.
//!   The algorithm terminates the run with a failure outcome.
//! - **Dimensionality**: two vectors that must agree in length do not.
//! - **InvalidReference**: a hypervolume reference point does not bound the
//!   set it is applied to.
//!
//! Numerically degenerate interpolation and kernel inputs never produce an
//! error; they fall back to documented values instead.

use thiserror::Error;

/// Errors produced by the optimization engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoeaError {
    /// Missing or malformed pipeline wiring, problem formulation or
    /// property value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A function raised a failure while being evaluated.
    #[error("evaluation of `{function}` failed: {message}")]
    Evaluation {
        /// Name of the failing function.
        function: String,
        /// Failure description reported by the function.
        message: String,
    },

    /// Two vectors that must have the same length do not.
    #[error("dimensionality mismatch in {context}: expected {expected}, found {found}")]
    Dimensionality {
        /// Where the mismatch was detected.
        context: String,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// The hypervolume reference point does not dominate every member.
    #[error("reference point {reference:?} does not bound every point of the set")]
    InvalidReference {
        /// The rejected reference point.
        reference: Vec<f64>,
    },

    /// A registry or property lookup used an identifier nobody registered.
    #[error("unknown {kind} `{id}`")]
    UnknownIdentifier {
        /// What was looked up (function, property, ...).
        kind: &'static str,
        /// The identifier that was not found.
        id: String,
    },
}

impl MoeaError {
    /// Shorthand for [`MoeaError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        MoeaError::Configuration(message.into())
    }

    /// Shorthand for [`MoeaError::Evaluation`].
    pub fn evaluation(function: impl Into<String>, message: impl Into<String>) -> Self {
        MoeaError::Evaluation {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`MoeaError::Dimensionality`].
    pub fn dimensionality(context: impl Into<String>, expected: usize, found: usize) -> Self {
        MoeaError::Dimensionality {
            context: context.into(),
            expected,
            found,
        }
    }

    /// Returns an error if `found != expected`.
    pub fn check_len(context: &str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::dimensionality(context, expected, found))
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MoeaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = MoeaError::dimensionality("pareto comparison", 2, 3);
        assert_eq!(
            e.to_string(),
            "dimensionality mismatch in pareto comparison: expected 2, found 3"
        );

        let e = MoeaError::evaluation("ZDT1", "division by zero");
        assert_eq!(e.to_string(), "evaluation of `ZDT1` failed: division by zero");
    }

    #[test]
    fn test_check_len() {
        assert!(MoeaError::check_len("x", 2, 2).is_ok());
        assert_eq!(
            MoeaError::check_len("x", 2, 1),
            Err(MoeaError::dimensionality("x", 2, 1))
        );
    }
}
