//! Per-entity-type mediator with added/deleted/retrieved channels.
//!
//! # Responsibility
//! - Keep one ordered listener list per channel.
//! - Deliver each published entity to every listener attached at publish time.
//!
//! # Invariants
//! - Invocation order equals attachment order; duplicates are kept.
//! - Delivery is synchronous and happens once per listener per publish call.
//! - No replay: listeners attached later never see earlier events.
//! - Listener lists are snapshotted before invocation, so no lock is held
//!   while user callbacks run.
//! - A detached listener is not invoked by any publish that starts after
//!   `detach` returns.

use crate::config::{DeliveryPolicy, MediatorConfig};
use crate::mediator::event::{Channel, ListenerError, ListenerResult, NotificationEvent};
use crate::model::entity::Entity;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

type ListenerFn<T> = Arc<dyn Fn(&NotificationEvent<T>) -> ListenerResult + Send + Sync>;

/// Handle returned when attaching a listener.
///
/// Monotonic per mediator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for ListenerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ListenerEntry<T> {
    id: ListenerId,
    callback: ListenerFn<T>,
}

impl<T> Clone for ListenerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Listeners owned by one subscriber; detached from the mediator on drop.
///
/// Holds the mediator weakly, so a subscription never keeps it alive.
pub struct Subscription {
    listener_ids: Vec<ListenerId>,
    release: Option<Box<dyn FnOnce(&[ListenerId]) + Send>>,
}

impl Subscription {
    /// Takes ownership of `listener_ids` previously attached to `mediator`.
    pub fn new<T: Entity>(
        mediator: &Arc<RepositoryMediator<T>>,
        listener_ids: Vec<ListenerId>,
    ) -> Self {
        let mediator: Weak<RepositoryMediator<T>> = Arc::downgrade(mediator);
        Self {
            listener_ids,
            release: Some(Box::new(move |ids: &[ListenerId]| {
                if let Some(mediator) = mediator.upgrade() {
                    for id in ids {
                        mediator.detach(*id);
                    }
                }
            })),
        }
    }

    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.listener_ids
    }

    /// Detaches now instead of waiting for drop.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(&self.listener_ids);
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener_ids", &self.listener_ids)
            .finish()
    }
}

/// One failing listener inside a collected publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener_id: ListenerId,
    pub error: ListenerError,
}

/// Publish failures surfaced to the publishing repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Fail-fast delivery stopped at this listener.
    Listener {
        channel: Channel,
        listener_id: ListenerId,
        source: ListenerError,
    },
    /// Collected delivery ran every listener; these ones failed.
    Listeners {
        channel: Channel,
        failures: Vec<ListenerFailure>,
    },
}

impl PublishError {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Listener { channel, .. } | Self::Listeners { channel, .. } => *channel,
        }
    }
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listener {
                channel,
                listener_id,
                source,
            } => write!(
                f,
                "publish on `{channel}` aborted at listener {listener_id}: {source}"
            ),
            Self::Listeners { channel, failures } => write!(
                f,
                "publish on `{channel}` completed with {} failing listener(s)",
                failures.len()
            ),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Listener { source, .. } => Some(source),
            Self::Listeners { failures, .. } => failures
                .first()
                .map(|failure| &failure.error as &(dyn Error + 'static)),
        }
    }
}

/// Hub shared by every repository of entity type `T`.
///
/// Any number of repositories publish into one instance (fan-in); any number
/// of listeners attach to its channels.
pub struct RepositoryMediator<T: Entity> {
    config: MediatorConfig,
    next_listener_id: AtomicU64,
    added: RwLock<Vec<ListenerEntry<T>>>,
    deleted: RwLock<Vec<ListenerEntry<T>>>,
    retrieved: RwLock<Vec<ListenerEntry<T>>>,
}

impl<T: Entity> Default for RepositoryMediator<T> {
    fn default() -> Self {
        Self::with_config(MediatorConfig::default())
    }
}

impl<T: Entity> RepositoryMediator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MediatorConfig) -> Self {
        Self {
            config,
            next_listener_id: AtomicU64::new(1),
            added: RwLock::new(Vec::new()),
            deleted: RwLock::new(Vec::new()),
            retrieved: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> MediatorConfig {
        self.config
    }

    /// Attaches a listener to the added channel.
    pub fn on_added<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&NotificationEvent<T>) -> ListenerResult + Send + Sync + 'static,
    {
        self.attach(Channel::Added, Arc::new(listener))
    }

    /// Attaches a listener to the deleted channel.
    pub fn on_deleted<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&NotificationEvent<T>) -> ListenerResult + Send + Sync + 'static,
    {
        self.attach(Channel::Deleted, Arc::new(listener))
    }

    /// Attaches a listener to the retrieved channel.
    pub fn on_retrieved<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&NotificationEvent<T>) -> ListenerResult + Send + Sync + 'static,
    {
        self.attach(Channel::Retrieved, Arc::new(listener))
    }

    /// Publishes an added notification.
    ///
    /// # Contract
    /// - Called by repositories sharing this mediator after a successful insert.
    pub fn publish_added(&self, entity: &T) -> Result<(), PublishError> {
        self.publish(Channel::Added, entity)
    }

    /// Publishes a deleted notification.
    ///
    /// # Contract
    /// - Called by repositories sharing this mediator after a successful removal.
    pub fn publish_deleted(&self, entity: &T) -> Result<(), PublishError> {
        self.publish(Channel::Deleted, entity)
    }

    /// Publishes a retrieved notification.
    ///
    /// # Contract
    /// - Called by repositories sharing this mediator before returning a hit.
    pub fn publish_retrieved(&self, entity: &T) -> Result<(), PublishError> {
        self.publish(Channel::Retrieved, entity)
    }

    /// Number of listeners currently attached to `channel`.
    pub fn listener_count(&self, channel: Channel) -> usize {
        self.channel(channel)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Removes the listener `id` from whichever channel holds it.
    ///
    /// Returns `false` when the id is unknown or already detached.
    pub fn detach(&self, id: ListenerId) -> bool {
        for channel in [Channel::Added, Channel::Deleted, Channel::Retrieved] {
            let mut listeners = self
                .channel(channel)
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(position) = listeners.iter().position(|entry| entry.id == id) {
                listeners.remove(position);
                debug!(
                    "event=listener_detached module=mediator status=ok entity={} channel={} listener_id={}",
                    std::any::type_name::<T>(),
                    channel,
                    id
                );
                return true;
            }
        }
        false
    }

    fn channel(&self, channel: Channel) -> &RwLock<Vec<ListenerEntry<T>>> {
        match channel {
            Channel::Added => &self.added,
            Channel::Deleted => &self.deleted,
            Channel::Retrieved => &self.retrieved,
        }
    }

    fn attach(&self, channel: Channel, callback: ListenerFn<T>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.channel(channel)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ListenerEntry { id, callback });
        debug!(
            "event=listener_attached module=mediator status=ok entity={} channel={} listener_id={}",
            std::any::type_name::<T>(),
            channel,
            id
        );
        id
    }

    fn publish(&self, channel: Channel, entity: &T) -> Result<(), PublishError> {
        let listeners = self
            .channel(channel)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(
            "event=publish module=mediator status=start entity={} channel={} listeners={} id={:?}",
            std::any::type_name::<T>(),
            channel,
            listeners.len(),
            entity.id()
        );
        if listeners.is_empty() {
            return Ok(());
        }

        let event = NotificationEvent::new(channel, entity.clone());
        match self.config.delivery {
            DeliveryPolicy::FailFast => {
                for entry in &listeners {
                    if let Err(source) = (entry.callback)(&event) {
                        warn!(
                            "event=publish module=mediator status=error channel={} listener_id={} policy=fail_fast",
                            channel, entry.id
                        );
                        return Err(PublishError::Listener {
                            channel,
                            listener_id: entry.id,
                            source,
                        });
                    }
                }
                Ok(())
            }
            DeliveryPolicy::CollectErrors => {
                let failures: Vec<ListenerFailure> = listeners
                    .iter()
                    .filter_map(|entry| {
                        (entry.callback)(&event)
                            .err()
                            .map(|error| ListenerFailure {
                                listener_id: entry.id,
                                error,
                            })
                    })
                    .collect();
                if failures.is_empty() {
                    return Ok(());
                }
                warn!(
                    "event=publish module=mediator status=error channel={} failed={} policy=collect_errors",
                    channel,
                    failures.len()
                );
                Err(PublishError::Listeners { channel, failures })
            }
        }
    }
}

impl<T: Entity> Debug for RepositoryMediator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryMediator")
            .field("entity", &std::any::type_name::<T>())
            .field("config", &self.config)
            .field("added", &self.listener_count(Channel::Added))
            .field("deleted", &self.listener_count(Channel::Deleted))
            .field("retrieved", &self.listener_count(Channel::Retrieved))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{PublishError, RepositoryMediator, Subscription};
    use crate::config::MediatorConfig;
    use crate::mediator::event::{Channel, ListenerError};
    use crate::model::entity::Record;
    use std::sync::{Arc, Mutex};

    #[test]
    fn publish_without_listeners_is_ok() {
        let mediator = RepositoryMediator::<Record>::new();
        mediator
            .publish_added(&Record::new(1))
            .expect("publish with no listeners");
    }

    #[test]
    fn channels_are_independent() {
        let mediator = RepositoryMediator::<Record>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        mediator.on_deleted(move |event| {
            sink.lock().unwrap().push(event.channel());
            Ok(())
        });

        mediator.publish_added(&Record::new(1)).unwrap();
        mediator.publish_retrieved(&Record::new(1)).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        mediator.publish_deleted(&Record::new(1)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Channel::Deleted]);
        assert_eq!(mediator.listener_count(Channel::Deleted), 1);
        assert_eq!(mediator.listener_count(Channel::Added), 0);
    }

    #[test]
    fn listener_ids_are_monotonic_across_channels() {
        let mediator = RepositoryMediator::<Record>::new();
        let first = mediator.on_added(|_| Ok(()));
        let second = mediator.on_retrieved(|_| Ok(()));
        let third = mediator.on_added(|_| Ok(()));
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn fail_fast_reports_failing_listener() {
        let mediator = RepositoryMediator::<Record>::new();
        mediator.on_added(|_| Ok(()));
        let failing = mediator.on_added(|_| Err(ListenerError::new("boom")));

        let err = mediator
            .publish_added(&Record::new(3))
            .expect_err("failing listener must surface");
        assert_eq!(err.channel(), Channel::Added);
        assert!(matches!(
            err,
            PublishError::Listener { listener_id, .. } if listener_id == failing
        ));
    }

    #[test]
    fn collect_errors_reports_every_failure() {
        let mediator = RepositoryMediator::<Record>::with_config(MediatorConfig::collect_errors());
        let first = mediator.on_retrieved(|_| Err(ListenerError::new("one")));
        mediator.on_retrieved(|_| Ok(()));
        let third = mediator.on_retrieved(|_| Err(ListenerError::new("three")));

        let err = mediator.publish_retrieved(&Record::new(1)).unwrap_err();
        match err {
            PublishError::Listeners { channel, failures } => {
                assert_eq!(channel, Channel::Retrieved);
                let ids: Vec<_> = failures.iter().map(|f| f.listener_id).collect();
                assert_eq!(ids, vec![first, third]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn detach_removes_only_the_given_listener() {
        let mediator = RepositoryMediator::<Record>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first_sink = Arc::clone(&seen);
        let first = mediator.on_added(move |_| {
            first_sink.lock().unwrap().push("first");
            Ok(())
        });
        let second_sink = Arc::clone(&seen);
        mediator.on_added(move |_| {
            second_sink.lock().unwrap().push("second");
            Ok(())
        });

        assert!(mediator.detach(first));
        assert!(!mediator.detach(first));
        mediator.publish_added(&Record::new(1)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["second"]);
        assert_eq!(mediator.listener_count(Channel::Added), 1);
    }

    #[test]
    fn subscription_detaches_on_drop_and_cancel() {
        let mediator = Arc::new(RepositoryMediator::<Record>::new());
        let ids = vec![
            mediator.on_added(|_| Ok(())),
            mediator.on_deleted(|_| Ok(())),
        ];
        let subscription = Subscription::new(&mediator, ids);
        assert_eq!(subscription.listener_ids().len(), 2);
        drop(subscription);
        assert_eq!(mediator.listener_count(Channel::Added), 0);
        assert_eq!(mediator.listener_count(Channel::Deleted), 0);

        let id = mediator.on_retrieved(|_| Ok(()));
        Subscription::new(&mediator, vec![id]).cancel();
        assert_eq!(mediator.listener_count(Channel::Retrieved), 0);
    }

    #[test]
    fn subscription_outliving_mediator_drops_quietly() {
        let mediator = Arc::new(RepositoryMediator::<Record>::new());
        let id = mediator.on_added(|_| Ok(()));
        let subscription = Subscription::new(&mediator, vec![id]);
        drop(mediator);
        drop(subscription);
    }

    #[test]
    fn debug_output_reports_listener_counts() {
        let mediator = RepositoryMediator::<Record>::new();
        mediator.on_added(|_| Ok(()));
        let rendered = format!("{mediator:?}");
        assert!(rendered.contains("added: 1"));
    }
}
