//! Validated chains of operator nodes.

use super::board::SetBoard;
use super::node::{NodeContext, NodeKind, Operator, RunEnv};
use crate::error::{MoeaError, Result};
use crate::representation::{Problem, SolutionId, SolutionSet, Tag};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::trace;

/// Read-only view of one node, for external rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeDescriptor {
    /// Position in execution order.
    pub index: usize,
    /// Node name.
    pub name: String,
    /// Node role.
    pub kind: NodeKind,
    /// Tags read in the current generation.
    pub inputs: Vec<String>,
    /// Tags published.
    pub outputs: Vec<String>,
    /// Tags read from the previous generation.
    pub feedback: Vec<String>,
    /// Indices of the nodes producing this node's inputs and feedback.
    pub upstream: Vec<usize>,
    /// Nodes of the wrapped sub-pipeline, for composites.
    pub children: Vec<NodeDescriptor>,
}

/// An ordered chain of operator nodes sharing a [`SetBoard`].
///
/// Construction validates the wiring:
///
/// - node names are unique
/// - every tag has exactly one producer
/// - every input tag is produced by an earlier node or supplied from outside
/// - every feedback tag is produced somewhere in the chain
///
/// Each generation runs the nodes once, in order.
///
/// # Examples
///
/// ```
/// use u_moea::operators::{Evaluator, RandomInit};
/// use u_moea::pipeline::Pipeline;
///
/// let pipeline = Pipeline::new(vec![
///     Box::new(RandomInit::new(10)),
///     Box::new(Evaluator::new()),
/// ])
/// .unwrap();
/// assert_eq!(pipeline.describe().len(), 2);
/// assert_eq!(pipeline.describe()[1].upstream, vec![0]);
/// ```
pub struct Pipeline {
    nodes: Vec<Box<dyn Operator>>,
    external: Vec<Tag>,
    producers: BTreeMap<Tag, usize>,
    board: SetBoard,
}

impl Pipeline {
    /// Validates and builds a self-contained pipeline.
    pub fn new(nodes: Vec<Box<dyn Operator>>) -> Result<Self> {
        Self::with_external(nodes, Vec::new())
    }

    /// Validates and builds a pipeline whose `external` tags are filled by
    /// the caller before each run.
    pub fn with_external(nodes: Vec<Box<dyn Operator>>, external: Vec<Tag>) -> Result<Self> {
        let mut names = BTreeSet::new();
        let mut producers: BTreeMap<Tag, usize> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            if !names.insert(node.name().to_string()) {
                return Err(MoeaError::configuration(format!(
                    "duplicate node name `{}`",
                    node.name()
                )));
            }
            for tag in node.output_tags() {
                if external.contains(&tag) {
                    return Err(MoeaError::configuration(format!(
                        "tag `{tag}` is supplied externally and also produced by `{}`",
                        node.name()
                    )));
                }
                if let Some(&other) = producers.get(&tag) {
                    return Err(MoeaError::configuration(format!(
                        "tag `{tag}` has two producers: `{}` and `{}`",
                        nodes[other].name(),
                        node.name()
                    )));
                }
                producers.insert(tag, index);
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            for tag in node.input_tags() {
                match producers.get(&tag) {
                    Some(&p) if p < index => {}
                    Some(_) => {
                        return Err(MoeaError::configuration(format!(
                            "node `{}` reads `{tag}` before its producer runs",
                            node.name()
                        )))
                    }
                    None if external.contains(&tag) => {}
                    None => {
                        return Err(MoeaError::configuration(format!(
                            "node `{}` reads `{tag}` which no node produces",
                            node.name()
                        )))
                    }
                }
            }
            for tag in node.feedback_tags() {
                if !producers.contains_key(&tag) {
                    return Err(MoeaError::configuration(format!(
                        "node `{}` feeds back `{tag}` which no node produces",
                        node.name()
                    )));
                }
            }
        }

        Ok(Self {
            nodes,
            external,
            producers,
            board: SetBoard::new(),
        })
    }

    /// Binds every node to `problem`.
    pub fn attach(&mut self, problem: &Problem) -> Result<()> {
        for node in &mut self.nodes {
            node.attach(problem)?;
        }
        Ok(())
    }

    /// Runs every node once, in order.
    pub fn run_generation(&mut self, env: &mut RunEnv<'_>) -> Result<()> {
        for node in &mut self.nodes {
            trace!(node = node.name(), generation = env.generation, "evaluating node");
            let outputs = {
                let mut ctx = NodeContext::new(env, &self.board);
                node.evaluate_node(&mut ctx)?;
                ctx.into_outputs()
            };
            self.board.accept(node.name(), &node.output_tags(), outputs)?;
        }
        Ok(())
    }

    /// Supplies the sets of an external tag.
    pub fn supply(&mut self, tag: &Tag, sets: Vec<SolutionSet>) -> Result<()> {
        if !self.external.contains(tag) {
            return Err(MoeaError::configuration(format!(
                "tag `{tag}` is not an external input of this pipeline"
            )));
        }
        self.board.insert(tag.clone(), sets);
        Ok(())
    }

    /// Sets currently published under `tag`.
    pub fn sets(&self, tag: &Tag) -> Option<&[SolutionSet]> {
        self.board.get(tag)
    }

    /// Whether some node of this pipeline produces `tag`.
    pub fn produces(&self, tag: &Tag) -> bool {
        self.producers.contains_key(tag)
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pipeline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds a node by name, searching sub-pipelines too.
    pub fn node(&self, name: &str) -> Option<&dyn Operator> {
        if let Some(node) = self.nodes.iter().find(|n| n.name() == name) {
            return Some(node.as_ref());
        }
        self.nodes
            .iter()
            .find_map(|n| n.sub_pipeline().and_then(|p| p.node(name)))
    }

    /// Mutable lookup by name, searching sub-pipelines too.
    pub fn node_mut(&mut self, name: &str) -> Option<&mut dyn Operator> {
        if let Some(pos) = self.nodes.iter().position(|n| n.name() == name) {
            return Some(self.nodes[pos].as_mut());
        }
        self.nodes
            .iter_mut()
            .find_map(|n| n.sub_pipeline_mut().and_then(|p| p.node_mut(name)))
    }

    /// Ordered node descriptors.
    pub fn describe(&self) -> Vec<NodeDescriptor> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let inputs = node.input_tags();
                let feedback = node.feedback_tags();
                let mut upstream: Vec<usize> = inputs
                    .iter()
                    .chain(&feedback)
                    .filter_map(|t| self.producers.get(t).copied())
                    .collect();
                upstream.sort_unstable();
                upstream.dedup();
                NodeDescriptor {
                    index,
                    name: node.name().to_string(),
                    kind: node.kind(),
                    inputs: inputs.iter().map(Tag::to_string).collect(),
                    outputs: node.output_tags().iter().map(Tag::to_string).collect(),
                    feedback: feedback.iter().map(Tag::to_string).collect(),
                    upstream,
                    children: node.sub_pipeline().map(Pipeline::describe).unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Ids referenced by any published set, sub-pipelines included.
    pub fn referenced_ids(&self) -> BTreeSet<SolutionId> {
        let mut ids = self.board.referenced_ids();
        for node in &self.nodes {
            if let Some(sub) = node.sub_pipeline() {
                ids.extend(sub.referenced_ids());
            }
        }
        ids
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("nodes", &self.nodes.iter().map(|n| n.name()).collect::<Vec<_>>())
            .field("external", &self.external)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::property::Configurable;

    /// Minimal node with configurable wiring.
    pub(crate) struct Stub {
        pub name: &'static str,
        pub inputs: Vec<Tag>,
        pub outputs: Vec<Tag>,
        pub feedback: Vec<Tag>,
    }

    impl Stub {
        pub fn new(name: &'static str, inputs: &[Tag], outputs: &[Tag]) -> Box<dyn Operator> {
            Self::with_feedback(name, inputs, outputs, &[])
        }

        pub fn with_feedback(
            name: &'static str,
            inputs: &[Tag],
            outputs: &[Tag],
            feedback: &[Tag],
        ) -> Box<dyn Operator> {
            Box::new(Self {
                name,
                inputs: inputs.to_vec(),
                outputs: outputs.to_vec(),
                feedback: feedback.to_vec(),
            })
        }
    }

    impl Configurable for Stub {}

    impl Operator for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn kind(&self) -> NodeKind {
            NodeKind::Filtration
        }
        fn input_tags(&self) -> Vec<Tag> {
            self.inputs.clone()
        }
        fn output_tags(&self) -> Vec<Tag> {
            self.outputs.clone()
        }
        fn feedback_tags(&self) -> Vec<Tag> {
            self.feedback.clone()
        }
        fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
            let mut ids = Vec::new();
            for tag in &self.inputs {
                for set in ctx.input(tag) {
                    ids.extend(set.iter());
                }
            }
            if ids.is_empty() {
                ids.push(ctx.store.create(Vec::new(), ctx.generation));
            }
            for tag in &self.outputs {
                ctx.publish(SolutionSet::from_ids(self.name, ids.clone()).with_tag(tag.clone()));
            }
            Ok(())
        }
    }

    fn err_text(r: Result<Pipeline>) -> String {
        match r {
            Err(MoeaError::Configuration(msg)) => msg,
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_valid_chain() {
        let a = Tag::new("a");
        let b = Tag::new("b");
        let p = Pipeline::new(vec![
            Stub::new("first", &[], &[a.clone()]),
            Stub::new("second", &[a.clone()], &[b.clone()]),
        ])
        .unwrap();
        let d = p.describe();
        assert_eq!(d[0].outputs, vec!["a".to_string()]);
        assert_eq!(d[1].upstream, vec![0]);
        assert!(p.produces(&b));
        assert!(p.node("second").is_some());
        assert!(p.node("third").is_none());
    }

    #[test]
    fn test_missing_producer() {
        let msg = err_text(Pipeline::new(vec![Stub::new("x", &[Tag::RANKED], &[])]));
        assert!(msg.contains("no node produces"), "{msg}");
    }

    #[test]
    fn test_two_producers() {
        let msg = err_text(Pipeline::new(vec![
            Stub::new("x", &[], &[Tag::ELITE]),
            Stub::new("y", &[], &[Tag::ELITE]),
        ]));
        assert!(msg.contains("two producers"), "{msg}");
    }

    #[test]
    fn test_consumer_before_producer() {
        let msg = err_text(Pipeline::new(vec![
            Stub::new("x", &[Tag::ELITE], &[]),
            Stub::new("y", &[], &[Tag::ELITE]),
        ]));
        assert!(msg.contains("before its producer"), "{msg}");
    }

    #[test]
    fn test_feedback_may_come_later() {
        let p = Pipeline::new(vec![
            Stub::with_feedback("x", &[], &[Tag::FOR_EVALUATION], &[Tag::FOR_NEXT_ITERATION]),
            Stub::new("y", &[Tag::FOR_EVALUATION], &[Tag::FOR_NEXT_ITERATION]),
        ])
        .unwrap();
        assert_eq!(p.describe()[0].upstream, vec![1]);
    }

    #[test]
    fn test_duplicate_names() {
        let msg = err_text(Pipeline::new(vec![
            Stub::new("x", &[], &[Tag::ELITE]),
            Stub::new("x", &[], &[Tag::RANKED]),
        ]));
        assert!(msg.contains("duplicate"), "{msg}");
    }

    #[test]
    fn test_external_inputs() {
        let p = Pipeline::with_external(
            vec![Stub::new("x", &[Tag::MATING_POOL], &[Tag::OFFSPRING])],
            vec![Tag::MATING_POOL],
        );
        let mut p = p.unwrap();
        assert!(p.supply(&Tag::MATING_POOL, Vec::new()).is_ok());
        assert!(p.supply(&Tag::ELITE, Vec::new()).is_err());
    }
}
