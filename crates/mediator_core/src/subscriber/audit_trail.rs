//! Audit subscriber that logs every repository notification.

use crate::mediator::event::NotificationEvent;
use crate::mediator::repository_mediator::{RepositoryMediator, Subscription};
use crate::model::entity::Entity;
use log::info;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

const DEFAULT_TAIL_CAPACITY: usize = 64;

/// Writes one metadata-only log line per notification and keeps the most
/// recent lines in memory.
///
/// May attach to mediators of several entity types; dropping the trail
/// detaches from all of them.
pub struct AuditTrail {
    capacity: usize,
    tail: Arc<Mutex<VecDeque<String>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TAIL_CAPACITY)
    }
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` of zero keeps logging but retains no lines.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            tail: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Attaches to all three channels of `mediator`.
    pub fn attach<T: Entity>(&self, mediator: &Arc<RepositoryMediator<T>>) {
        let tail = Arc::downgrade(&self.tail);
        let capacity = self.capacity;
        let added = mediator.on_added(move |event| {
            record(&tail, capacity, event);
            Ok(())
        });

        let tail = Arc::downgrade(&self.tail);
        let deleted = mediator.on_deleted(move |event| {
            record(&tail, capacity, event);
            Ok(())
        });

        let tail = Arc::downgrade(&self.tail);
        let retrieved = mediator.on_retrieved(move |event| {
            record(&tail, capacity, event);
            Ok(())
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription::new(mediator, vec![added, deleted, retrieved]));
    }

    /// Recent lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.tail.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record<T: Entity>(
    tail: &Weak<Mutex<VecDeque<String>>>,
    capacity: usize,
    event: &NotificationEvent<T>,
) {
    let Some(tail) = tail.upgrade() else {
        return;
    };

    let line = format!(
        "event=entity_{} module=audit status=ok entity={} id={:?}",
        event.channel(),
        short_type_name::<T>(),
        event.entity().id()
    );
    info!("{line}");

    if capacity == 0 {
        return;
    }
    let mut tail = tail.lock().unwrap_or_else(PoisonError::into_inner);
    if tail.len() == capacity {
        tail.pop_front();
    }
    tail.push_back(line);
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
