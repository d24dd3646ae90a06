//! Problem formulation.
//!
//! A [`Problem`] aggregates one or more [`Function`]s. Inputs declared under
//! the same name by several functions become one shared decision variable.
//! Outputs with a minimize/maximize role become objectives, outputs named in
//! [`ProblemBuilder::constraint`] become constraints. Once built, the problem
//! is sealed: its dimensionality never changes.
//!
//! All objective values handed to the rest of the engine live in
//! minimization space: maximized outputs are negated.

use super::element::{Element, ElementProperties, OptimizationType};
use super::function::Function;
use crate::error::{MoeaError, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct OutputSlot {
    function: usize,
    output: usize,
    name: String,
    role: OptimizationType,
}

#[derive(Debug, Clone)]
struct ConstraintSlot {
    function: usize,
    output: usize,
    name: String,
    threshold: f64,
}

/// One function call made while evaluating a decision vector.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Function name.
    pub function: String,
    /// Inputs passed to the function.
    pub inputs: Vec<Element>,
    /// Outputs it returned.
    pub outputs: Vec<Element>,
}

/// Result of evaluating one decision vector.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Objective values in minimization space.
    pub objectives: Vec<f64>,
    /// Raw constraint output values.
    pub constraints: Vec<f64>,
    /// Sum of constraint excesses over their thresholds (0 when feasible).
    pub violation: f64,
    /// Per-function call records, in function order.
    pub calls: Vec<FunctionCall>,
}

/// A sealed optimization problem.
///
/// # Examples
///
/// ```
/// use u_moea::functions::Zdt;
/// use u_moea::representation::Problem;
///
/// let problem = Problem::builder().function(Zdt::zdt1(4).unwrap()).build().unwrap();
/// assert_eq!(problem.decision_dim(), 4);
/// assert_eq!(problem.objective_dim(), 2);
/// assert_eq!(problem.constraint_dim(), 0);
/// ```
#[derive(Clone)]
pub struct Problem {
    functions: Vec<Arc<dyn Function>>,
    decision: Vec<ElementProperties>,
    input_maps: Vec<Vec<usize>>,
    objectives: Vec<OutputSlot>,
    constraints: Vec<ConstraintSlot>,
}

impl Problem {
    /// Starts building a problem.
    pub fn builder() -> ProblemBuilder {
        ProblemBuilder::default()
    }

    /// Number of decision variables.
    pub fn decision_dim(&self) -> usize {
        self.decision.len()
    }

    /// Number of objectives.
    pub fn objective_dim(&self) -> usize {
        self.objectives.len()
    }

    /// Number of constraints.
    pub fn constraint_dim(&self) -> usize {
        self.constraints.len()
    }

    /// Merged decision-variable declarations.
    pub fn decision_properties(&self) -> &[ElementProperties] {
        &self.decision
    }

    /// Objective names, in objective order.
    pub fn objective_names(&self) -> Vec<&str> {
        self.objectives.iter().map(|o| o.name.as_str()).collect()
    }

    /// Objective roles, in objective order.
    pub fn objective_roles(&self) -> Vec<OptimizationType> {
        self.objectives.iter().map(|o| o.role).collect()
    }

    /// Constraint names and thresholds.
    pub fn constraints(&self) -> Vec<(&str, f64)> {
        self.constraints
            .iter()
            .map(|c| (c.name.as_str(), c.threshold))
            .collect()
    }

    /// The functions making up the problem.
    pub fn functions(&self) -> &[Arc<dyn Function>] {
        &self.functions
    }

    /// Builds a decision vector from raw values, applying each variable's
    /// rounding and clamping policy.
    pub fn decision_from_values(&self, values: &[f64]) -> Result<Vec<Element>> {
        MoeaError::check_len("decision vector", self.decision_dim(), values.len())?;
        Ok(self
            .decision
            .iter()
            .zip(values)
            .map(|(p, &v)| p.element(v))
            .collect())
    }

    /// Evaluates a decision vector through every function.
    pub fn evaluate(&self, decision: &[Element]) -> Result<Evaluation> {
        MoeaError::check_len("decision vector", self.decision_dim(), decision.len())?;

        let mut calls = Vec::with_capacity(self.functions.len());
        for (function, map) in self.functions.iter().zip(&self.input_maps) {
            let inputs: Vec<Element> = map.iter().map(|&i| decision[i].clone()).collect();
            let outputs = function.evaluate(&inputs)?;
            calls.push(FunctionCall {
                function: function.name().to_string(),
                inputs,
                outputs,
            });
        }

        let objectives = self
            .objectives
            .iter()
            .map(|slot| {
                let v = calls[slot.function].outputs[slot.output].value();
                match slot.role {
                    OptimizationType::Maximize => -v,
                    _ => v,
                }
            })
            .collect();

        let constraints: Vec<f64> = self
            .constraints
            .iter()
            .map(|slot| calls[slot.function].outputs[slot.output].value())
            .collect();
        let violation = self
            .constraints
            .iter()
            .zip(&constraints)
            .map(|(slot, &v)| (v - slot.threshold).max(0.0))
            .sum();

        Ok(Evaluation {
            objectives,
            constraints,
            violation,
            calls,
        })
    }

    /// Converts minimization-space objectives back to the declared senses.
    pub fn to_declared(&self, objectives: &[f64]) -> Result<Vec<f64>> {
        MoeaError::check_len("objective vector", self.objective_dim(), objectives.len())?;
        Ok(self
            .objectives
            .iter()
            .zip(objectives)
            .map(|(slot, &v)| match slot.role {
                OptimizationType::Maximize => -v,
                _ => v,
            })
            .collect())
    }

    /// Component-wise minimum of objective vectors of this problem.
    pub fn ideal(&self, points: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.check_points(points)?;
        Ok(ideal_point(points).unwrap_or_else(|| vec![f64::INFINITY; self.objective_dim()]))
    }

    /// Component-wise maximum of objective vectors of this problem.
    pub fn nadir(&self, points: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.check_points(points)?;
        Ok(nadir_point(points).unwrap_or_else(|| vec![f64::NEG_INFINITY; self.objective_dim()]))
    }

    fn check_points(&self, points: &[Vec<f64>]) -> Result<()> {
        for p in points {
            MoeaError::check_len("objective vector", self.objective_dim(), p.len())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field(
                "functions",
                &self.functions.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .field("decision", &self.decision.len())
            .field("objectives", &self.objective_names())
            .field("constraints", &self.constraints())
            .finish()
    }
}

/// Component-wise minimum, `None` for an empty slice.
pub fn ideal_point(points: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = points.first()?;
    let mut out = first.clone();
    for p in &points[1..] {
        for (o, &v) in out.iter_mut().zip(p) {
            *o = o.min(v);
        }
    }
    Some(out)
}

/// Component-wise maximum, `None` for an empty slice.
pub fn nadir_point(points: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = points.first()?;
    let mut out = first.clone();
    for p in &points[1..] {
        for (o, &v) in out.iter_mut().zip(p) {
            *o = o.max(v);
        }
    }
    Some(out)
}

/// Builder sealing a [`Problem`].
#[derive(Default)]
pub struct ProblemBuilder {
    functions: Vec<Arc<dyn Function>>,
    constraints: Vec<(String, f64)>,
}

impl ProblemBuilder {
    /// Adds a function.
    pub fn function(mut self, function: impl Function + 'static) -> Self {
        self.functions.push(Arc::new(function));
        self
    }

    /// Adds a shared function instance.
    pub fn shared_function(mut self, function: Arc<dyn Function>) -> Self {
        self.functions.push(function);
        self
    }

    /// Declares the output `name` a constraint, feasible iff `value <= threshold`.
    pub fn constraint(mut self, name: impl Into<String>, threshold: f64) -> Self {
        self.constraints.push((name.into(), threshold));
        self
    }

    /// Merges declarations and seals the problem.
    pub fn build(self) -> Result<Problem> {
        if self.functions.is_empty() {
            return Err(MoeaError::configuration("a problem needs at least one function"));
        }

        let mut decision: Vec<ElementProperties> = Vec::new();
        let mut input_maps = Vec::with_capacity(self.functions.len());
        for function in &self.functions {
            let mut map = Vec::with_capacity(function.inputs().len());
            for input in function.inputs() {
                match decision.iter().position(|d| d.name() == input.name()) {
                    Some(i) if decision[i].is_compatible(input) => map.push(i),
                    Some(_) => {
                        return Err(MoeaError::configuration(format!(
                            "input `{}` of `{}` conflicts with an earlier declaration",
                            input.name(),
                            function.name()
                        )))
                    }
                    None => {
                        map.push(decision.len());
                        decision.push(input.clone());
                    }
                }
            }
            input_maps.push(map);
        }

        let mut outputs: Vec<(usize, usize, &ElementProperties)> = Vec::new();
        for (fi, function) in self.functions.iter().enumerate() {
            for (oi, output) in function.outputs().iter().enumerate() {
                if outputs.iter().any(|(_, _, p)| p.name() == output.name()) {
                    return Err(MoeaError::configuration(format!(
                        "output `{}` is declared more than once",
                        output.name()
                    )));
                }
                outputs.push((fi, oi, output));
            }
        }

        let mut constraints = Vec::with_capacity(self.constraints.len());
        for (name, threshold) in &self.constraints {
            let (fi, oi, _) = outputs
                .iter()
                .find(|(_, _, p)| p.name() == name)
                .ok_or_else(|| MoeaError::UnknownIdentifier {
                    kind: "output",
                    id: name.clone(),
                })?;
            constraints.push(ConstraintSlot {
                function: *fi,
                output: *oi,
                name: name.clone(),
                threshold: *threshold,
            });
        }

        let objectives: Vec<OutputSlot> = outputs
            .iter()
            .filter(|(_, _, p)| p.role() != OptimizationType::None)
            .filter(|(_, _, p)| !constraints.iter().any(|c| c.name == p.name()))
            .map(|(fi, oi, p)| OutputSlot {
                function: *fi,
                output: *oi,
                name: p.name().to_string(),
                role: p.role(),
            })
            .collect();
        if objectives.is_empty() {
            return Err(MoeaError::configuration("a problem needs at least one objective"));
        }

        Ok(Problem {
            functions: self.functions,
            decision,
            input_maps,
            objectives,
            constraints,
        })
    }
}
