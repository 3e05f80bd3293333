use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::Result;

/// Identifier of a watched entry. Unique per engine, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchKey(u64);

impl WatchKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a completion function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Leave the entry registered and evaluate it again next pass
    KeepWatching,
    /// Remove the entry
    Done,
}

/// Per-entry callback, invoked with the watched element once it intersects
/// the observation region.
pub type CompletionFn<E> = Arc<dyn Fn(&E) -> Result<Completion> + Send + Sync>;

/// Wrap a closure as a [`CompletionFn`].
pub fn completion_fn<E, F>(f: F) -> CompletionFn<E>
where
    F: Fn(&E) -> Result<Completion> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compare completion functions by identity.
pub fn same_completion<E>(
    a: &CompletionFn<E>,
    b: &CompletionFn<E>,
) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

pub struct WatchEntry<E> {
    pub element: E,
    pub completion: CompletionFn<E>,
}

impl<E: Clone> Clone for WatchEntry<E> {
    fn clone(&self) -> Self {
        Self {
            element: self.element.clone(),
            completion: self.completion.clone(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for WatchEntry<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchEntry").field("element", &self.element).finish_non_exhaustive()
    }
}

/// Ordered registry of watched entries.
///
/// The registry itself is not synchronised; the engine keeps it behind a
/// lock and never holds that lock while user callbacks run. Traversals that
/// may trigger mutations work on a [`snapshot`](Self::snapshot) and
/// [`take`](Self::take) each entry before running its completion.
pub struct CallbackRegistry<E> {
    entries: BTreeMap<WatchKey, WatchEntry<E>>,
    next_key: u64,
}

impl<E> Default for CallbackRegistry<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_key: 1,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for CallbackRegistry<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("entries", &self.entries)
            .field("next_key", &self.next_key)
            .finish()
    }
}

impl<E: Clone> CallbackRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry under the next key.
    pub fn add(
        &mut self,
        element: E,
        completion: CompletionFn<E>,
    ) -> WatchKey {
        let key = WatchKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(key, WatchEntry { element, completion });
        trace!(%key, "entry registered");
        key
    }

    /// Idempotent delete. Returns whether an entry was removed.
    pub fn remove(
        &mut self,
        key: WatchKey,
    ) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Delete every entry matching `predicate`, returning how many went.
    pub fn remove_where<P>(
        &mut self,
        mut predicate: P,
    ) -> usize
    where
        P: FnMut(&E, &CompletionFn<E>) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.element, &entry.completion));
        before - self.entries.len()
    }

    /// Remove and return the entry under `key`. Only one caller can claim a
    /// given entry; later callers get `None` until it is restored.
    pub fn take(
        &mut self,
        key: WatchKey,
    ) -> Option<WatchEntry<E>> {
        self.entries.remove(&key)
    }

    /// Put a claimed entry back under its original key, keeping its place in
    /// registration order. Keys that were never handed out are refused.
    pub fn restore(
        &mut self,
        key: WatchKey,
        entry: WatchEntry<E>,
    ) -> bool {
        if key.0 == 0 || key.0 >= self.next_key || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn get(
        &self,
        key: WatchKey,
    ) -> Option<WatchEntry<E>> {
        self.entries.get(&key).cloned()
    }

    pub fn contains(
        &self,
        key: WatchKey,
    ) -> bool {
        self.entries.contains_key(&key)
    }

    /// Visit entries in registration order.
    pub fn for_each<F>(
        &self,
        mut visitor: F,
    ) where
        F: FnMut(WatchKey, &WatchEntry<E>),
    {
        for (key, entry) in &self.entries {
            visitor(*key, entry);
        }
    }

    /// Owned copy of the current entries, in registration order.
    pub fn snapshot(&self) -> Vec<(WatchKey, WatchEntry<E>)> {
        self.entries.iter().map(|(key, entry)| (*key, entry.clone())).collect()
    }

    pub fn elements(&self) -> Vec<E> {
        self.entries.values().map(|entry| entry.element.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Keys already handed out stay retired.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
