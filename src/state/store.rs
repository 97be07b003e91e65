//! Copy-on-write state store with structural sharing.
//!
//! A mutation runs against a shallow draft whose children are still the
//! root's `Arc`s. Mutators write through [`Arc::make_mut`], which copies only
//! the nodes on the written path. [`Reconcile`] then walks the draft back
//! against the original: any node whose value did not change is replaced by
//! the original `Arc`, so an unchanged root comes back pointer-equal.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::core::StatePersister;

/// A state node that can be folded back onto its previous version.
pub trait Reconcile: Clone {
    /// Return `base` itself when `draft` holds the same value, otherwise a
    /// fresh node that still shares every unchanged child with `base`.
    fn reconcile(base: &Arc<Self>, draft: Self) -> Arc<Self>;
}

/// Reconcile a node compared by value as a whole.
pub fn reconcile_leaf<T: PartialEq>(base: &Arc<T>, draft: T) -> Arc<T> {
    if **base == draft {
        Arc::clone(base)
    } else {
        Arc::new(draft)
    }
}

/// Reconcile one `Arc` child of a draft against the same child of its base.
pub fn reconcile_child<T: Reconcile>(base: &Arc<T>, draft: Arc<T>) -> Arc<T> {
    if Arc::ptr_eq(base, &draft) {
        return draft;
    }
    let owned = Arc::try_unwrap(draft).unwrap_or_else(|shared| T::clone(&shared));
    T::reconcile(base, owned)
}

/// Reconcile an optional `Arc` child.
pub fn reconcile_option<T: Reconcile>(
    base: Option<&Arc<T>>,
    draft: Option<Arc<T>>,
) -> Option<Arc<T>> {
    match (base, draft) {
        (Some(base), Some(draft)) => Some(reconcile_child(base, draft)),
        (_, draft) => draft,
    }
}

/// Whether two optional children share identity.
#[must_use]
pub fn same_option<T>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Apply `f` to a draft of `root` and fold the draft back.
///
/// Returns `root` itself (same allocation) when nothing changed in value.
pub fn mutate<S, F>(root: &Arc<S>, f: F) -> Arc<S>
where
    S: Reconcile,
    F: FnOnce(&mut S),
{
    let mut draft = S::clone(root);
    f(&mut draft);
    S::reconcile(root, draft)
}

type Subscriber<S> = Box<dyn Fn(&Arc<S>) + Send + Sync>;

/// Holds the current root, persists and publishes each committed change.
///
/// Mutations must be serialized by the owner. Subscribers run synchronously
/// inside [`StateStore::mutate`] and must not mutate the store themselves.
pub struct StateStore<S> {
    current: Arc<S>,
    persister: Option<Arc<dyn StatePersister<S>>>,
    subscribers: Vec<Subscriber<S>>,
}

impl<S: Reconcile + 'static> StateStore<S> {
    /// Create a store with `initial` as its root.
    pub fn new(initial: S) -> Self {
        Self {
            current: Arc::new(initial),
            persister: None,
            subscribers: Vec::new(),
        }
    }

    /// Persist every committed root through `persister`.
    #[must_use]
    pub fn with_persister(mut self, persister: Arc<dyn StatePersister<S>>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Current root.
    pub fn current(&self) -> Arc<S> {
        Arc::clone(&self.current)
    }

    /// Register a callback invoked with every new root.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Apply `f` and commit the result if anything changed.
    ///
    /// Returns whether the root changed.
    pub fn mutate<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut S),
    {
        let next = mutate(&self.current, f);
        if Arc::ptr_eq(&next, &self.current) {
            trace!("mutation left state unchanged");
            return false;
        }
        self.current = next;
        if let Some(persister) = &self.persister {
            persister.save(&self.current);
        }
        for subscriber in &self.subscribers {
            subscriber(&self.current);
        }
        true
    }
}

impl<S> fmt::Debug for StateStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("persisted", &self.persister.is_some())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
