//! Objective and constraint functions.

use super::element::{Element, ElementProperties};
use crate::error::{MoeaError, Result};

/// A pure mapping from input elements to output elements.
///
/// Implementors provide the raw numeric mapping in [`compute`](Function::compute)
/// plus input/output declarations. The provided [`evaluate`](Function::evaluate)
/// validates arity against the declarations and wraps the raw outputs into
/// newly created [`Element`]s; caller-owned inputs are never modified.
///
/// # Implementing
///
/// ```
/// use u_moea::error::Result;
/// use u_moea::representation::{Bounds, Element, ElementProperties, Function};
///
/// struct Square {
///     inputs: Vec<ElementProperties>,
///     outputs: Vec<ElementProperties>,
/// }
///
/// impl Function for Square {
///     fn name(&self) -> &str { "square" }
///     fn inputs(&self) -> &[ElementProperties] { &self.inputs }
///     fn outputs(&self) -> &[ElementProperties] { &self.outputs }
///     fn compute(&self, x: &[f64]) -> Result<Vec<f64>> { Ok(vec![x[0] * x[0]]) }
/// }
///
/// let f = Square {
///     inputs: vec![ElementProperties::new("x").with_bounds(Bounds::new(-2.0, 2.0).unwrap())],
///     outputs: vec![ElementProperties::new("y").minimize()],
/// };
/// let out = f.evaluate(&[Element::real(1.5)]).unwrap();
/// assert_eq!(out[0].value(), 2.25);
/// assert!(f.evaluate(&[]).is_err());
/// ```
pub trait Function: Send + Sync {
    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Input declarations, in argument order.
    fn inputs(&self) -> &[ElementProperties];

    /// Output declarations, in result order.
    fn outputs(&self) -> &[ElementProperties];

    /// Computes raw outputs from raw inputs.
    ///
    /// `inputs` always has exactly `self.inputs().len()` values. Returning an
    /// error surfaces as [`MoeaError::Evaluation`].
    fn compute(&self, inputs: &[f64]) -> Result<Vec<f64>>;

    /// Validates arity, computes, and wraps the outputs.
    fn evaluate(&self, inputs: &[Element]) -> Result<Vec<Element>> {
        let context = format!("inputs of `{}`", self.name());
        MoeaError::check_len(&context, self.inputs().len(), inputs.len())?;

        let raw: Vec<f64> = inputs.iter().map(Element::value).collect();
        let out = self.compute(&raw).map_err(|e| match e {
            MoeaError::Evaluation { .. } => e,
            other => MoeaError::evaluation(self.name(), other.to_string()),
        })?;

        let context = format!("outputs of `{}`", self.name());
        MoeaError::check_len(&context, self.outputs().len(), out.len())?;

        Ok(self
            .outputs()
            .iter()
            .zip(out)
            .map(|(p, v)| p.element(v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BadArity {
        inputs: Vec<ElementProperties>,
        outputs: Vec<ElementProperties>,
    }

    impl Function for BadArity {
        fn name(&self) -> &str {
            "bad"
        }
        fn inputs(&self) -> &[ElementProperties] {
            &self.inputs
        }
        fn outputs(&self) -> &[ElementProperties] {
            &self.outputs
        }
        fn compute(&self, _inputs: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![1.0, 2.0])
        }
    }

    #[test]
    fn test_output_arity_checked() {
        let f = BadArity {
            inputs: vec![ElementProperties::new("x")],
            outputs: vec![ElementProperties::new("y").minimize()],
        };
        let err = f.evaluate(&[Element::real(0.0)]).unwrap_err();
        assert!(matches!(
            err,
            MoeaError::Dimensionality {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_inputs_untouched() {
        let f = BadArity {
            inputs: vec![ElementProperties::new("x")],
            outputs: vec![
                ElementProperties::new("a").minimize(),
                ElementProperties::new("b").minimize(),
            ],
        };
        let input = vec![Element::real(4.0)];
        let out = f.evaluate(&input).unwrap();
        assert_eq!(input[0].value(), 4.0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].value(), 2.0);
    }
}
