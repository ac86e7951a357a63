//! Contexts: insertion-ordered sets.

use indexmap::IndexSet;
use std::hash::Hash;

/// Contexts are ordered sets of elements; re-inserting keeps the first position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context<T: Hash + Eq>(pub IndexSet<T>);

impl<T: Hash + Eq> FromIterator<T> for Context<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Context(iter.into_iter().collect())
    }
}

impl<T: Hash + Eq> IntoIterator for Context<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a Context<T> {
    type Item = &'a T;
    type IntoIter = indexmap::set::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Hash + Eq> Context<T> {
    pub fn iter(&self) -> <&Self as IntoIterator>::IntoIter {
        self.into_iter()
    }

    pub fn new() -> Self {
        Context(IndexSet::new())
    }

    pub fn singleton(item: T) -> Self {
        Context::from_iter([item])
    }

    /// Returns whether the item was new.
    pub fn insert(&mut self, item: T) -> bool {
        self.0.insert(item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.0.contains(item)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.0.get_index_of(item)
    }
}

impl<T: Hash + Eq> Default for Context<T> {
    fn default() -> Self {
        Context::new()
    }
}

impl<T: Hash + Eq> Extend<T> for Context<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<T: Hash + Eq> std::ops::Add for Context<T> {
    type Output = Self;
    fn add(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}
