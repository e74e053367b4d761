use std::sync::{Arc, PoisonError, RwLock};

use crate::models::BotState;

/// Shared, synchronized owner of the [`BotState`].
///
/// Cloning is cheap and every clone refers to the same state. Writers are
/// serialized through [`StateStore::apply`]; readers get a full copy from
/// [`StateStore::read_snapshot`] and can never observe a half-applied
/// mutation. Critical sections are synchronous, so the lock is never held
/// across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<RwLock<BotState>>,
}

impl StateStore {
    pub fn new(initial: BotState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Point-in-time copy of the whole state.
    pub fn read_snapshot(&self) -> BotState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `f` with exclusive access and return whatever it returns.
    ///
    /// A panic inside `f` poisons the lock; later callers recover the guard
    /// rather than propagating the poison, so the store stays usable.
    pub fn apply<R>(&self, f: impl FnOnce(&mut BotState) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
