//! The single mutable location holding the live transformer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::transformer::{HostAst, InertTransformer, Transformer};

/// Swappable reference to the current transformer.
///
/// Never empty: a new slot holds the [`InertTransformer`]. Readers clone the
/// `Arc` and drop the lock before calling into the transformer, so a call that
/// is already running keeps the instance it started with while later calls see
/// whatever was installed since.
pub struct TransformerSlot<A: HostAst> {
    current: RwLock<Arc<dyn Transformer<A>>>,
    /// Number of installs so far.
    generation: AtomicU64,
}

impl<A: HostAst> TransformerSlot<A> {
    pub fn new() -> Self {
        let inert: Arc<dyn Transformer<A>> = Arc::new(InertTransformer);
        Self {
            current: RwLock::new(inert),
            generation: AtomicU64::new(0),
        }
    }

    /// The transformer installed right now.
    pub fn current(&self) -> Arc<dyn Transformer<A>> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the current transformer, returning the new generation.
    pub fn install(&self, transformer: Arc<dyn Transformer<A>>) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, transformer);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(guard);
        // The old transformer may still be held by an in-flight call.
        drop(previous);
        generation
    }

    /// Replace the current transformer with the inert one.
    pub fn install_inert(&self) -> u64 {
        self.install(Arc::new(InertTransformer))
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_inert(&self) -> bool {
        self.current().is_inert()
    }
}

impl<A: HostAst> Default for TransformerSlot<A> {
    fn default() -> Self {
        Self::new()
    }
}
