//! Role tags and tagged solution sets.

use super::solution::SolutionId;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// Role tag attached to a [`SolutionSet`].
///
/// Nodes of a pipeline find their inputs by tag. The associated constants
/// name the roles used by the built-in algorithms; any other string works as
/// well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    /// Freshly created solutions awaiting evaluation.
    pub const FOR_EVALUATION: Tag = Tag::from_static("for-evaluation");
    /// The evaluated working population.
    pub const EVALUATED: Tag = Tag::from_static("evaluated");
    /// Population with dominance ranks attached.
    pub const RANKED: Tag = Tag::from_static("ranked");
    /// Population with intermediate fitness attached.
    pub const AVERAGED: Tag = Tag::from_static("averaged");
    /// Population with final fitness attached, ready for selection.
    pub const FITNESS: Tag = Tag::from_static("fitness");
    /// Survivors of environmental selection.
    pub const ELITE: Tag = Tag::from_static("elite");
    /// Steady-state population after reduction.
    pub const REDUCED: Tag = Tag::from_static("reduced");
    /// Parent pairs chosen for variation.
    pub const MATING_POOL: Tag = Tag::from_static("mating-pool");
    /// Children produced by crossover.
    pub const OFFSPRING: Tag = Tag::from_static("offspring");
    /// Children after mutation.
    pub const MUTATED: Tag = Tag::from_static("mutated");
    /// Population handed to the next generation.
    pub const FOR_NEXT_ITERATION: Tag = Tag::from_static("for-next-iteration");
    /// Non-dominated archive.
    pub const ARCHIVE: Tag = Tag::from_static("archive");

    /// Creates a tag from a static string.
    pub const fn from_static(name: &'static str) -> Self {
        Tag(Cow::Borrowed(name))
    }

    /// Creates a tag from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Tag(Cow::Owned(name.into()))
    }

    /// Tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, named collection of unique solution ids carrying role tags.
///
/// # Examples
///
/// ```
/// use u_moea::representation::{SolutionSet, SolutionStore, Element, Tag};
///
/// let mut store = SolutionStore::new();
/// let a = store.create(vec![Element::real(0.0)], 0);
///
/// let mut set = SolutionSet::new("population").with_tag(Tag::EVALUATED);
/// assert!(set.push(a));
/// assert!(!set.push(a));
/// assert_eq!(set.len(), 1);
/// assert!(set.has_tag(&Tag::EVALUATED));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SolutionSet {
    name: String,
    tags: Vec<Tag>,
    members: Vec<SolutionId>,
    index: HashSet<SolutionId>,
}

impl SolutionSet {
    /// Creates an empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a set from ids, dropping repeats.
    pub fn from_ids(name: impl Into<String>, ids: impl IntoIterator<Item = SolutionId>) -> Self {
        let mut set = Self::new(name);
        set.extend(ids);
        set
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether the set carries `tag`.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Appends `id` unless already present. Returns whether it was added.
    pub fn push(&mut self, id: SolutionId) -> bool {
        if self.index.insert(id) {
            self.members.push(id);
            true
        } else {
            false
        }
    }

    /// Appends several ids. Returns how many were added.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = SolutionId>) -> usize {
        ids.into_iter().filter(|&id| self.push(id)).count()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: SolutionId) -> bool {
        self.index.contains(&id)
    }

    /// Members in insertion order.
    pub fn ids(&self) -> &[SolutionId] {
        &self.members
    }

    /// Iterates members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = SolutionId> + '_ {
        self.members.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Merges sets in order, keeping the first occurrence of every id.
pub fn merge_ids<'a>(sets: impl IntoIterator<Item = &'a SolutionSet>) -> Vec<SolutionId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for set in sets {
        for id in set.iter() {
            if seen.insert(id) {
                out.push(id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::{Element, SolutionStore};

    #[test]
    fn test_membership_unique() {
        let mut store = SolutionStore::new();
        let ids: Vec<_> = (0..3).map(|_| store.create(vec![Element::real(0.0)], 0)).collect();
        let mut set = SolutionSet::new("s");
        assert_eq!(set.extend([ids[0], ids[1], ids[0], ids[2], ids[1]]), 3);
        assert_eq!(set.ids(), &ids[..]);
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let mut store = SolutionStore::new();
        let a = store.create(vec![], 0);
        let b = store.create(vec![], 0);
        let c = store.create(vec![], 0);
        let s1 = SolutionSet::from_ids("1", [b, a]);
        let s2 = SolutionSet::from_ids("2", [a, c]);
        assert_eq!(merge_ids([&s1, &s2]), vec![b, a, c]);
    }

    #[test]
    fn test_tags() {
        let set = SolutionSet::new("x")
            .with_tag(Tag::ARCHIVE)
            .with_tag(Tag::ARCHIVE)
            .with_tag(Tag::new("custom"));
        assert_eq!(set.tags().len(), 2);
        assert_eq!(Tag::new("archive"), Tag::ARCHIVE);
        assert_eq!(Tag::ARCHIVE.to_string(), "archive");
    }
}
