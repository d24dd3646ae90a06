//! Pipelines of the four algorithm variants.
//!
//! ```text
//! NSGA-II   init → eval → [archive] → ranking → crowding → elite → tournament → variation → merge(elite, mutated)
//! NSGA-III  init → eval → [archive] → ranking → niching  → elite → tournament → variation → merge(elite, mutated)
//! SMS-EMOA  init → eval → [archive] → ranking → reduce   → tournament(1 pair) → variation(1 child) → merge(reduced, mutated)
//! MOGA      init → eval → [archive] → moga-ranking → average → sharing → sus → variation → merge(mutated)
//! ```
//!
//! `variation` is a composite of SBX crossover followed by polynomial
//! mutation.

use super::config::AlgorithmConfig;
use super::types::AlgorithmKind;
use crate::dominance::{DominanceRelation, RelationParameters};
use crate::error::Result;
use crate::operators::{
    AverageFitness, CrowdingDistance, EliteSelection, Evaluator, MergeForNextIteration,
    MogaRanking, NonDominanceRanking, NonDominatedArchive, PolynomialMutation, RandomInit,
    ReferencePointNiching, SbxCrossover, SharedFitness, SmsEmoaReduce,
    StochasticUniversalSampling, TournamentSelection,
};
use crate::pipeline::{Composite, Operator, Pipeline};
use crate::registry::Registry;
use crate::representation::{Problem, Tag};

/// A wired pipeline plus the tag holding the working population.
pub(crate) struct Wiring {
    pub pipeline: Pipeline,
    pub population: Tag,
}

fn relation(config: &AlgorithmConfig, registry: &Registry, problem: &Problem) -> Result<Box<dyn DominanceRelation>> {
    let mut relation = registry.create_relation(&config.dominance, problem.objective_dim())?;
    if config.dominance_parameters != RelationParameters::None {
        relation.define_parameters(&config.dominance_parameters)?;
    }
    Ok(relation)
}

fn variation(config: &AlgorithmConfig, crossover: SbxCrossover) -> Result<Box<dyn Operator>> {
    let mut mutation = PolynomialMutation::new(config.mutation_eta);
    if let Some(p) = config.mutation_probability {
        mutation = mutation.with_probability(p);
    }
    Ok(Box::new(Composite::new(
        "variation",
        vec![Tag::MATING_POOL],
        vec![Tag::MUTATED],
        vec![Box::new(crossover), Box::new(mutation)],
    )?))
}

/// Builds the pipeline of `kind`.
pub(crate) fn wire(
    kind: AlgorithmKind,
    config: &AlgorithmConfig,
    registry: &Registry,
    problem: &Problem,
) -> Result<Wiring> {
    let n = config.population_size;
    let pairs = n.div_ceil(2);

    let mut nodes: Vec<Box<dyn Operator>> = vec![
        Box::new(
            RandomInit::new(n)
                .with_sampling(config.sampling)
                .with_seeds(config.initial_population.clone()),
        ),
        Box::new(Evaluator::new()),
    ];
    if config.archive {
        let mut archive = NonDominatedArchive::new()
            .with_relation(relation(config, registry, problem)?)
            .with_constraint_handling(config.constraint_handling);
        if let Some(c) = config.archive_capacity {
            archive = archive.with_capacity(c);
        }
        nodes.push(Box::new(archive));
    }

    let ranking = NonDominanceRanking::new()
        .with_relation(relation(config, registry, problem)?)
        .with_constraint_handling(config.constraint_handling);
    let crossover = SbxCrossover::new(config.crossover_probability, config.crossover_eta);

    let population = match kind {
        AlgorithmKind::Nsga2 | AlgorithmKind::Nsga3 => {
            nodes.push(Box::new(ranking));
            if kind == AlgorithmKind::Nsga2 {
                nodes.push(Box::new(CrowdingDistance::new()));
            } else {
                nodes.push(Box::new(ReferencePointNiching::new(n)));
            }
            nodes.push(Box::new(EliteSelection::new(n)));
            nodes.push(Box::new(
                TournamentSelection::new(pairs).with_tournament_size(config.tournament_size),
            ));
            nodes.push(variation(config, crossover.with_max_offspring(n))?);
            nodes.push(Box::new(MergeForNextIteration::new(vec![Tag::ELITE, Tag::MUTATED])));
            Tag::ELITE
        }
        AlgorithmKind::SmsEmoa => {
            nodes.push(Box::new(ranking));
            nodes.push(Box::new(
                SmsEmoaReduce::new().with_reference_offset(config.sms_reference_offset),
            ));
            nodes.push(Box::new(
                TournamentSelection::new(1)
                    .with_tournament_size(config.tournament_size)
                    .with_input(Tag::REDUCED),
            ));
            nodes.push(variation(
                config,
                crossover.with_offspring_per_pair(1).with_max_offspring(1),
            )?);
            nodes.push(Box::new(MergeForNextIteration::new(vec![Tag::REDUCED, Tag::MUTATED])));
            Tag::REDUCED
        }
        AlgorithmKind::Moga => {
            nodes.push(Box::new(
                MogaRanking::new()
                    .with_relation(relation(config, registry, problem)?)
                    .with_constraint_handling(config.constraint_handling),
            ));
            nodes.push(Box::new(AverageFitness::new()));
            nodes.push(Box::new(SharedFitness::new().with_alpha(config.sharing_alpha)));
            nodes.push(Box::new(StochasticUniversalSampling::new(n)));
            nodes.push(variation(config, crossover.with_max_offspring(n))?);
            nodes.push(Box::new(MergeForNextIteration::new(vec![Tag::MUTATED])));
            Tag::EVALUATED
        }
    };

    Ok(Wiring {
        pipeline: Pipeline::new(nodes)?,
        population,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::Zdt;
    use crate::pipeline::NodeKind;

    fn zdt1() -> Problem {
        Problem::builder().function(Zdt::zdt1(5).unwrap()).build().unwrap()
    }

    #[test]
    fn test_every_variant_validates() {
        let registry = Registry::default();
        let problem = zdt1();
        let config = AlgorithmConfig::default().with_archive(true);
        for kind in [
            AlgorithmKind::Nsga2,
            AlgorithmKind::Nsga3,
            AlgorithmKind::SmsEmoa,
            AlgorithmKind::Moga,
        ] {
            let w = wire(kind, &config, &registry, &problem).unwrap();
            let d = w.pipeline.describe();
            assert_eq!(d[0].kind, NodeKind::Initialisation, "{kind}");
            assert_eq!(d[2].kind, NodeKind::Archive, "{kind}");
            assert!(w.pipeline.produces(&w.population), "{kind}");
            assert!(w.pipeline.produces(&Tag::FOR_NEXT_ITERATION), "{kind}");
        }
    }

    #[test]
    fn test_nsga2_node_order() {
        let w = wire(
            AlgorithmKind::Nsga2,
            &AlgorithmConfig::default(),
            &Registry::default(),
            &zdt1(),
        )
        .unwrap();
        let names: Vec<_> = w.pipeline.describe().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["initialisation", "evaluation", "ranking", "crowding", "elite", "tournament", "variation", "merge"]
        );
    }

    #[test]
    fn test_unknown_relation() {
        let config = AlgorithmConfig::default().with_dominance("lexicographic", RelationParameters::None);
        assert!(wire(AlgorithmKind::Nsga2, &config, &Registry::default(), &zdt1()).is_err());
    }
}
