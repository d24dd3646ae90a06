//! Operator graph.
//!
//! An algorithm is a chain of [`Operator`] nodes. Nodes exchange
//! [`SolutionSet`](crate::representation::SolutionSet)s through a
//! [`SetBoard`], addressing them by [`Tag`]:
//!
//! ```text
//! RandomInit ──for-evaluation──▶ Evaluator ──evaluated──▶ Ranking ──ranked──▶ ...
//!     ▲                                                                       │
//!     └──────────────────────── for-next-iteration (feedback) ◀───────────────┘
//! ```
//!
//! - [`Operator`]: the node capability (declared tags, `evaluate_node`)
//! - [`Pipeline`]: wiring validation, execution and introspection
//! - [`Composite`]: a sub-pipeline packaged as one node

mod board;
mod composite;
mod graph;
mod node;

pub use crate::representation::Tag;
pub use board::SetBoard;
pub use composite::Composite;
pub use graph::{NodeDescriptor, Pipeline};
pub use node::{NodeContext, NodeKind, Operator, RunEnv};

#[cfg(test)]
pub(crate) use graph::tests::Stub;
