//! Element, function, problem and solution model.
//!
//! - [`Element`]: typed scalar with kind, bounds, unit and optimization role
//! - [`Function`]: pure mapping from input elements to output elements
//! - [`Problem`]: sealed aggregate of functions with fixed dimensionality
//! - [`Solution`] / [`SolutionStore`]: candidates owned by the running algorithm
//! - [`SolutionSet`] / [`Tag`]: ordered, unique, role-tagged collections

mod element;
mod function;
mod problem;
mod set;
mod solution;

pub use element::{Bounds, Element, ElementProperties, ElementType, OptimizationType};
pub use function::Function;
pub use problem::{
    ideal_point, nadir_point, Evaluation, FunctionCall, Problem, ProblemBuilder,
};
pub use set::{merge_ids, SolutionSet, Tag};
pub use solution::{Fitness, Solution, SolutionId, SolutionStore};
