//! Published sets of a pipeline, keyed by tag.

use crate::error::{MoeaError, Result};
use crate::representation::{SolutionId, SolutionSet, Tag};
use std::collections::{BTreeMap, BTreeSet};

/// The sets most recently published under each tag.
///
/// A node's publication replaces everything previously stored under its
/// output tags. Entries survive from one generation to the next, which is
/// what makes feedback inputs work.
#[derive(Debug, Clone, Default)]
pub struct SetBoard {
    sets: BTreeMap<Tag, Vec<SolutionSet>>,
}

impl SetBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets stored under `tag`, if anything was published yet.
    pub fn get(&self, tag: &Tag) -> Option<&[SolutionSet]> {
        self.sets.get(tag).map(Vec::as_slice)
    }

    /// Stores `sets` under `tag` as if an outer producer had published them.
    pub fn insert(&mut self, tag: Tag, sets: Vec<SolutionSet>) {
        self.sets.insert(tag, sets);
    }

    /// Files the outputs of one node run.
    ///
    /// Every set must carry only tags from `declared`. Each declared tag is
    /// replaced by the sets carrying it, possibly none.
    pub fn accept(&mut self, node: &str, declared: &[Tag], outputs: Vec<SolutionSet>) -> Result<()> {
        for set in &outputs {
            if let Some(tag) = set.tags().iter().find(|t| !declared.contains(t)) {
                return Err(MoeaError::configuration(format!(
                    "node `{node}` published set `{}` with undeclared tag `{tag}`",
                    set.name()
                )));
            }
        }
        for tag in declared {
            let sets = outputs.iter().filter(|s| s.has_tag(tag)).cloned().collect();
            self.sets.insert(tag.clone(), sets);
        }
        Ok(())
    }

    /// Ids referenced by any stored set.
    pub fn referenced_ids(&self) -> BTreeSet<SolutionId> {
        self.sets
            .values()
            .flatten()
            .flat_map(|s| s.iter())
            .collect()
    }

    /// Forgets every published set.
    pub fn clear(&mut self) {
        self.sets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::SolutionStore;

    #[test]
    fn test_accept_replaces_declared_tags() {
        let mut store = SolutionStore::new();
        let a = store.create(vec![], 0);
        let b = store.create(vec![], 0);

        let mut board = SetBoard::new();
        let first = SolutionSet::from_ids("p", [a]).with_tag(Tag::ELITE);
        board.accept("n", &[Tag::ELITE], vec![first]).unwrap();
        assert_eq!(board.get(&Tag::ELITE).unwrap()[0].ids(), &[a]);

        let second = SolutionSet::from_ids("p", [b]).with_tag(Tag::ELITE);
        board.accept("n", &[Tag::ELITE], vec![second]).unwrap();
        assert_eq!(board.get(&Tag::ELITE).unwrap()[0].ids(), &[b]);
        assert_eq!(board.referenced_ids().len(), 1);
    }

    #[test]
    fn test_undeclared_tag_rejected() {
        let mut board = SetBoard::new();
        let set = SolutionSet::new("x").with_tag(Tag::ARCHIVE);
        assert!(matches!(
            board.accept("n", &[Tag::ELITE], vec![set]),
            Err(MoeaError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_tag() {
        let board = SetBoard::new();
        assert!(board.get(&Tag::RANKED).is_none());
        assert!(board.referenced_ids().is_empty());
    }
}
