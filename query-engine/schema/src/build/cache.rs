//! Every type the builder produces is cached under its structural identity as soon as its
//! skeleton exists, before its fields are wired.
//!
//! The cache has two purposes:
//! - First, break circular dependencies, as they can happen in self-referential entity graphs.
//! - Second, it guarantees identical requests are never rebuilt.

use crate::TypeIdentity;
use std::{collections::HashMap, fmt::Debug};

/// HashMap wrapper. Caches keys at most once, and panics on repeated insertion of the same key to
/// uphold schema building consistency guarantees.
#[derive(Debug, Default)]
pub(crate) struct TypeRefCache<T> {
    cache: HashMap<TypeIdentity, T>,
}

impl<T: Copy + Debug> TypeRefCache<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        TypeRefCache {
            cache: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn get(&self, ident: &TypeIdentity) -> Option<T> {
        self.cache.get(ident).copied()
    }

    /// Caches given value with given identity. Panics if the cache key already exists, as
    /// every reference handed out for that identity would otherwise point at a stale type.
    pub(crate) fn insert(&mut self, ident: TypeIdentity, value: T) {
        if let Some(old) = self.cache.insert(ident, value) {
            panic!("Invariant violation: Inserted identity twice, this is a bug. {old:?}")
        }
    }

    pub(crate) fn into_inner(self) -> HashMap<TypeIdentity, T> {
        self.cache
    }
}

/// Convenience cache utility to load and return immediately if a type is already cached.
macro_rules! return_cached {
    ($ctx:expr, $ident:expr) => {
        if let Some(existing) = $ctx.cache.get($ident) {
            return Ok(existing);
        }
    };
}

pub(crate) use return_cached;
