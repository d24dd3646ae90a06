//! Objective evaluation.

use crate::error::Result;
use crate::log::EvaluationEntry;
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::Configurable;
use crate::representation::{Element, Evaluation, Problem, SolutionId, SolutionSet, Tag};

/// Fills the objective vectors of pending solutions.
///
/// Already evaluated members pass through untouched. With parallel
/// evaluation enabled, function calls are spread over the rayon pool and
/// the results are written back in set order, so runs stay reproducible.
/// The first failing call aborts the node with its error.
///
/// Every function call is logged as an
/// [`EvaluationEntry`](crate::log::EvaluationEntry) carrying the solution id
/// in its `solution` field.
///
/// Reads: `for-evaluation`. Publishes: `evaluated`.
#[derive(Debug, Clone)]
pub struct Evaluator {
    name: String,
}

impl Evaluator {
    /// Creates the evaluator.
    pub fn new() -> Self {
        Self {
            name: "evaluation".into(),
        }
    }

    /// Renames the node.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "parallel")]
fn evaluate_all(problem: &Problem, decisions: &[Vec<Element>], parallel: bool) -> Vec<Result<Evaluation>> {
    use rayon::prelude::*;

    if parallel {
        decisions.par_iter().map(|d| problem.evaluate(d)).collect()
    } else {
        decisions.iter().map(|d| problem.evaluate(d)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all(problem: &Problem, decisions: &[Vec<Element>], _parallel: bool) -> Vec<Result<Evaluation>> {
    decisions.iter().map(|d| problem.evaluate(d)).collect()
}

impl Configurable for Evaluator {}

impl Operator for Evaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Evaluator
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::FOR_EVALUATION]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::EVALUATED]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = super::collect(ctx, &Tag::FOR_EVALUATION);
        let pending: Vec<SolutionId> = ids
            .iter()
            .copied()
            .filter(|&id| !ctx.store.get(id).is_evaluated())
            .collect();
        let decisions: Vec<Vec<Element>> = pending
            .iter()
            .map(|&id| ctx.store.get(id).decision().to_vec())
            .collect();

        let results = evaluate_all(ctx.problem, &decisions, ctx.parallel);

        for (id, result) in pending.into_iter().zip(results) {
            let evaluation = result?;
            *ctx.evaluations += 1;
            if ctx.log.logs_evaluations() {
                for call in &evaluation.calls {
                    ctx.log.log_evaluation(
                        EvaluationEntry::new(
                            call.function.clone(),
                            ctx.generation,
                            call.inputs.clone(),
                            call.outputs.clone(),
                        )
                        .with_field("solution", id.get() as i64),
                    );
                }
            }
            let Evaluation {
                objectives,
                constraints,
                violation,
                ..
            } = evaluation;
            ctx.store
                .get_mut(id)
                .set_evaluation(objectives, constraints, violation);
        }

        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::EVALUATED));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
