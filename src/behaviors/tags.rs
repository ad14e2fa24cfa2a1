//! Capability Tags
//!
//! Entities carry a small set of capability tags (`Tags` component). Zones and
//! healers select what they affect with a `TagFilter`, which matches when the
//! entity shares at least one tag with the filter.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Capability classification of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Player,
    Enemy,
    Boss,
    Summon,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Player => "Player",
            Tag::Enemy => "Enemy",
            Tag::Boss => "Boss",
            Tag::Summon => "Summon",
        }
    }
}

/// A deduplicated set of tags. Entities rarely carry more than two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(SmallVec<[Tag; 4]>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag) {
        if !self.contains(tag) {
            self.0.push(tag);
        }
    }

    pub fn remove(&mut self, tag: Tag) {
        self.0.retain(|t| *t != tag);
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.iter().copied()
    }

    /// True if the two sets share at least one tag
    pub fn intersects(&self, other: &TagSet) -> bool {
        self.iter().any(|tag| other.contains(tag))
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl<const N: usize> From<[Tag; N]> for TagSet {
    fn from(tags: [Tag; N]) -> Self {
        tags.into_iter().collect()
    }
}

/// Predicate over an entity's tags.
///
/// In config files a filter is written as a plain list: `filter: [Player, Summon]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilter {
    any_of: TagSet,
}

impl TagFilter {
    pub fn any_of(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            any_of: tags.into_iter().collect(),
        }
    }

    pub fn only(tag: Tag) -> Self {
        Self::any_of([tag])
    }

    /// An empty filter matches nothing
    pub fn matches(&self, tags: &TagSet) -> bool {
        self.any_of.intersects(tags)
    }

    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.any_of.iter()
    }
}
