//! Persistent collections with structural sharing.
//!
//! A thin wrapper around `im::Vector`, so list primitives can return new
//! lists without copying the old ones.

use std::fmt;
use std::iter::FromIterator;

/// Persistent vector with structural sharing.
///
/// Cloning is O(1). Modifications return a new vector sharing structure
/// with the original.
#[derive(Clone, Default)]
pub struct ListVec<T>(im::Vector<T>)
where
    T: Clone;

impl<T: Clone> ListVec<T> {
    /// Creates an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self(im::Vector::new())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the vector is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets an element by zero-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    /// Returns a new vector with the value appended.
    #[must_use]
    pub fn push_back(&self, value: T) -> Self {
        let mut v = self.0.clone();
        v.push_back(value);
        Self(v)
    }

    /// Returns a new vector with the value prepended.
    #[must_use]
    pub fn push_front(&self, value: T) -> Self {
        let mut v = self.0.clone();
        v.push_front(value);
        Self(v)
    }

    /// Returns everything but the first element (empty stays empty).
    #[must_use]
    pub fn rest(&self) -> Self {
        if self.0.is_empty() {
            return self.clone();
        }
        Self(self.0.skip(1))
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.0.front()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ListVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T: Clone + PartialEq> PartialEq for ListVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Clone> FromIterator<T> for ListVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Clone> From<Vec<T>> for ListVec<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}
