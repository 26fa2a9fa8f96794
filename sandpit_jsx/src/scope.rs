// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;

use hashbrown::HashMap;

use crate::value::Value;

/// Names available to evaluated sources.
///
/// Typically the host's component library. Cloning is cheap; the map is
/// shared, and mutation copies it only while other clones are alive.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: Rc<HashMap<Rc<str>, Value>>,
}

impl Scope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a binding.
    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) {
        Rc::make_mut(&mut self.bindings).insert(name.into(), value.into());
    }

    /// Builder form of [`Scope::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings.keys().map(|k| &**k)
    }
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut scope = Self::new();
        for (k, v) in iter {
            scope.insert(k, v);
        }
        scope
    }
}
