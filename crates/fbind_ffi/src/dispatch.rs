//! Routines with fixed trailing arguments and tagged argument caching.
//!
//! A simulation typically calls the same routine many times with the same
//! model state (the common arguments) and a handful of per-call inputs. The
//! common arguments are marshaled once when the routine is bound; per-call
//! inputs can be marshaled once per tag and kept in a [`TagCache`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::FfiError;
use crate::library::ForeignFunction;
use crate::marshal::{marshal_all, Marshaled};
use crate::value::Value;

/// Binds `common_args` as the trailing arguments of every call to `function`.
pub fn bind_with_common_args(
    function: ForeignFunction,
    common_args: &[Value],
) -> Result<BoundFunction, FfiError> {
    let common = marshal_all(common_args)?;
    tracing::debug!(symbol = function.name(), common = common.len(), "bound common arguments");
    Ok(BoundFunction { function, common })
}

/// A routine with its common arguments already marshaled.
#[derive(Debug)]
pub struct BoundFunction {
    function: ForeignFunction,
    common: Marshaled,
}

impl BoundFunction {
    /// The underlying routine.
    pub fn function(&self) -> &ForeignFunction {
        &self.function
    }

    /// The marshaled common arguments, reflecting any writes by past calls.
    pub fn common(&self) -> &Marshaled {
        &self.common
    }

    /// Calls with `args` marshaled fresh, followed by the common arguments.
    ///
    /// # Safety
    ///
    /// `args` followed by the common arguments must match the routine's
    /// parameter list, see [`ForeignFunction::call`].
    pub unsafe fn call(&mut self, args: &[Value]) -> Result<(), FfiError> {
        let mut leading = marshal_all(args)?;
        self.call_marshaled(&mut leading)
    }

    /// Calls with the arguments cached under `tag`, followed by the common
    /// arguments.
    ///
    /// `args` are marshaled and stored only when `tag` is not yet cached;
    /// otherwise they are ignored and the cached arguments are used. Use
    /// [`TagCache::update`] to replace a cached entry.
    ///
    /// # Safety
    ///
    /// Same contract as [`BoundFunction::call`].
    pub unsafe fn call_tagged<K: Eq + Hash>(
        &mut self,
        cache: &mut TagCache<K>,
        tag: K,
        args: &[Value],
    ) -> Result<(), FfiError> {
        let leading = cache.get_or_marshal(tag, args)?;
        self.call_marshaled(leading)
    }

    /// Calls with `leading` followed by the common arguments.
    ///
    /// # Safety
    ///
    /// Same contract as [`BoundFunction::call`].
    pub unsafe fn call_marshaled(&mut self, leading: &mut Marshaled) -> Result<(), FfiError> {
        let mut pointers = Vec::with_capacity(leading.len() + self.common.len());
        leading.collect_pointers(0, &mut pointers)?;
        self.common.collect_pointers(leading.len(), &mut pointers)?;
        self.function.invoke_pointers(&pointers)
    }
}

/// Marshaled leading arguments keyed by a caller-chosen tag.
///
/// The first marshaling for a tag wins until it is replaced with
/// [`TagCache::update`] or dropped with [`TagCache::invalidate`] or
/// [`TagCache::clear`].
#[derive(Debug)]
pub struct TagCache<K> {
    entries: HashMap<K, Marshaled>,
}

impl<K: Eq + Hash> Default for TagCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> TagCache<K> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of cached tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `tag` is cached.
    pub fn contains(&self, tag: &K) -> bool {
        self.entries.contains_key(tag)
    }

    /// The arguments cached under `tag`.
    pub fn get(&self, tag: &K) -> Option<&Marshaled> {
        self.entries.get(tag)
    }

    /// The arguments cached under `tag`, marshaling `args` first if absent.
    pub fn get_or_marshal(&mut self, tag: K, args: &[Value]) -> Result<&mut Marshaled, FfiError> {
        match self.entries.entry(tag) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::debug!(args = args.len(), "caching tagged arguments");
                Ok(entry.insert(marshal_all(args)?))
            }
        }
    }

    /// Marshals `args` under `tag`, returning what was cached before.
    pub fn update(&mut self, tag: K, args: &[Value]) -> Result<Option<Marshaled>, FfiError> {
        let marshaled = marshal_all(args)?;
        Ok(self.entries.insert(tag, marshaled))
    }

    /// Drops the entry for `tag`.
    pub fn invalidate(&mut self, tag: &K) -> Option<Marshaled> {
        self.entries.remove(tag)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
