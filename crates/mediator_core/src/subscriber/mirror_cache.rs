//! Cache that mirrors repository contents from mediator notifications.

use crate::mediator::repository_mediator::{RepositoryMediator, Subscription};
use crate::model::entity::Entity;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct CacheState<T> {
    entries: Vec<T>,
    hits: u64,
}

/// Mirror of every entity added through a mediator and not yet deleted.
///
/// Added appends a copy; deleted removes the first equal copy; retrieved
/// counts a hit. Dropping the cache detaches every listener it attached.
pub struct MirrorCache<T: Entity> {
    state: Arc<Mutex<CacheState<T>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<T: Entity> Default for MirrorCache<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: Vec::new(),
                hits: 0,
            })),
            subscriptions: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Entity> MirrorCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches this cache's listeners to all three channels of `mediator`.
    ///
    /// Only notifications published after attaching are mirrored.
    pub fn attach(&self, mediator: &Arc<RepositoryMediator<T>>) {
        let state = Arc::downgrade(&self.state);
        let added = mediator.on_added(move |event| {
            with_state(&state, |cache| cache.entries.push(event.entity().clone()));
            Ok(())
        });

        let state = Arc::downgrade(&self.state);
        let deleted = mediator.on_deleted(move |event| {
            with_state(&state, |cache| {
                if let Some(position) = cache
                    .entries
                    .iter()
                    .position(|cached| cached == event.entity())
                {
                    cache.entries.remove(position);
                }
            });
            Ok(())
        });

        let state = Arc::downgrade(&self.state);
        let retrieved = mediator.on_retrieved(move |_| {
            with_state(&state, |cache| cache.hits += 1);
            Ok(())
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription::new(mediator, vec![added, deleted, retrieved]));
    }

    /// Detaches from every mediator; mirrored entries are kept.
    pub fn detach_all(&self) {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn contains(&self, entity: &T) -> bool {
        self.lock().entries.contains(entity)
    }

    /// Number of retrieved notifications observed.
    pub fn hits(&self) -> u64 {
        self.lock().hits
    }

    pub fn entries(&self) -> Vec<T> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_state<T>(state: &Weak<Mutex<CacheState<T>>>, update: impl FnOnce(&mut CacheState<T>)) {
    if let Some(state) = state.upgrade() {
        let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut *guard);
    }
}
