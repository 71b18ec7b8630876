//! Entity repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Own a private ordered entity collection.
//! - Publish added/deleted/retrieved notifications through one mediator
//!   fixed at construction.
//!
//! # Invariants
//! - One lock per repository guards the collection and is held across
//!   mutation and publish, so each operation is atomic to other callers.
//! - Listeners must not call back into the repository that published to
//!   them; doing so deadlocks on the collection lock.
//! - A listener failure after a mutation surfaces as `RepoError::Publish`;
//!   the mutation is kept.

use crate::config::RepositoryConfig;
use crate::mediator::registry::{MediatorRegistry, RegistryError};
use crate::mediator::repository_mediator::{PublishError, RepositoryMediator};
use crate::model::entity::Entity;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for construction and entity operations.
#[derive(Debug)]
pub enum RepoError {
    /// Constructed without a mediator.
    InvalidMediator,
    Registry(RegistryError),
    /// Rendered id of the missing entity.
    NotFound(String),
    /// Rendered id rejected by the uniqueness policy.
    DuplicateId(String),
    Publish(PublishError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMediator => write!(f, "repository requires a mediator"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::DuplicateId(id) => write!(f, "entity id already stored: {id}"),
            Self::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Publish(err) => Some(err),
            Self::InvalidMediator | Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<RegistryError> for RepoError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<PublishError> for RepoError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}

/// Repository interface for entity operations with notification.
pub trait EntityRepository<T: Entity> {
    fn add(&self, entity: T) -> RepoResult<()>;
    fn delete(&self, entity: &T) -> RepoResult<()>;
    fn get(&self, id: &T::Id) -> RepoResult<T>;
}

/// Vec-backed repository publishing through a shared mediator.
pub struct InMemoryRepository<T: Entity> {
    config: RepositoryConfig,
    mediator: Arc<RepositoryMediator<T>>,
    entities: Mutex<Vec<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new(mediator: Arc<RepositoryMediator<T>>) -> Self {
        Self::with_config(mediator, RepositoryConfig::default())
    }

    pub fn with_config(mediator: Arc<RepositoryMediator<T>>, config: RepositoryConfig) -> Self {
        Self {
            config,
            mediator,
            entities: Mutex::new(Vec::new()),
        }
    }

    /// Builds a repository from an optional mediator handle.
    ///
    /// # Errors
    /// - `InvalidMediator` when `mediator` is `None`.
    pub fn try_new(mediator: Option<Arc<RepositoryMediator<T>>>) -> RepoResult<Self> {
        mediator.map(Self::new).ok_or(RepoError::InvalidMediator)
    }

    /// Builds a repository bound to the mediator registered for `T`.
    ///
    /// # Errors
    /// - `Registry(UnregisteredCapability)` when setup skipped registration.
    pub fn from_registry(registry: &MediatorRegistry, config: RepositoryConfig) -> RepoResult<Self> {
        let mediator = registry.resolve_repository_mediator::<T>()?;
        Ok(Self::with_config(mediator, config))
    }

    pub fn mediator(&self) -> &Arc<RepositoryMediator<T>> {
        &self.mediator
    }

    pub fn config(&self) -> RepositoryConfig {
        self.config
    }

    /// Removes the first entity whose id matches and returns it.
    ///
    /// Publishes the removed entity on the deleted channel.
    pub fn delete_by_id(&self, id: &T::Id) -> RepoResult<T> {
        let mut entities = self.lock();
        let position = entities
            .iter()
            .position(|candidate| candidate.id() == id)
            .ok_or_else(|| RepoError::NotFound(format!("{id:?}")))?;
        let removed = entities.remove(position);
        self.mediator.publish_deleted(&removed)?;
        debug!(
            "event=entity_delete module=repo status=ok id={:?} remaining={}",
            id,
            entities.len()
        );
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Checks presence without publishing.
    pub fn contains_id(&self, id: &T::Id) -> bool {
        self.lock().iter().any(|candidate| candidate.id() == id)
    }

    /// Copies the collection in insertion order without publishing.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Entity> EntityRepository<T> for InMemoryRepository<T> {
    fn add(&self, entity: T) -> RepoResult<()> {
        let mut entities = self.lock();
        if self.config.enforce_unique_ids
            && entities
                .iter()
                .any(|candidate| candidate.id() == entity.id())
        {
            return Err(RepoError::DuplicateId(format!("{:?}", entity.id())));
        }

        entities.push(entity.clone());
        self.mediator.publish_added(&entity)?;
        debug!(
            "event=entity_add module=repo status=ok id={:?} total={}",
            entity.id(),
            entities.len()
        );
        Ok(())
    }

    fn delete(&self, entity: &T) -> RepoResult<()> {
        let mut entities = self.lock();
        let position = entities
            .iter()
            .position(|candidate| candidate == entity)
            .ok_or_else(|| RepoError::NotFound(format!("{:?}", entity.id())))?;
        let removed = entities.remove(position);
        self.mediator.publish_deleted(&removed)?;
        debug!(
            "event=entity_delete module=repo status=ok id={:?} remaining={}",
            removed.id(),
            entities.len()
        );
        Ok(())
    }

    fn get(&self, id: &T::Id) -> RepoResult<T> {
        let entities = self.lock();
        let found = entities
            .iter()
            .find(|candidate| candidate.id() == id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("{id:?}")))?;
        self.mediator.publish_retrieved(&found)?;
        debug!("event=entity_get module=repo status=ok id={:?}", id);
        Ok(found)
    }
}

impl<T: Entity> std::fmt::Debug for InMemoryRepository<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityRepository, InMemoryRepository, RepoError};
    use crate::mediator::repository_mediator::RepositoryMediator;
    use crate::model::entity::Record;
    use std::sync::Arc;

    fn repo() -> InMemoryRepository<Record> {
        InMemoryRepository::new(Arc::new(RepositoryMediator::new()))
    }

    #[test]
    fn try_new_without_mediator_fails() {
        let result = InMemoryRepository::<Record>::try_new(None);
        assert!(matches!(result, Err(RepoError::InvalidMediator)));
    }

    #[test]
    fn delete_matches_full_value() {
        let repo = repo();
        repo.add(Record::with_payload(1, "kept")).unwrap();

        let err = repo
            .delete(&Record::with_payload(1, "other"))
            .expect_err("value-distinct record must not match");
        assert!(matches!(err, RepoError::NotFound(id) if id == "1"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn delete_removes_first_equal_entity_only() {
        let repo = repo();
        repo.add(Record::new(0)).unwrap();
        repo.add(Record::new(0)).unwrap();

        repo.delete(&Record::new(0)).unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn delete_by_id_returns_removed_entity() {
        let repo = repo();
        repo.add(Record::with_payload(5, "five")).unwrap();

        let removed = repo.delete_by_id(&5).unwrap();
        assert_eq!(removed.payload, "five");
        assert!(repo.is_empty());
        assert!(matches!(repo.delete_by_id(&5), Err(RepoError::NotFound(_))));
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let repo = repo();
        for id in [3, 1, 2] {
            repo.add(Record::new(id)).unwrap();
        }
        let ids: Vec<i64> = repo.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(repo.contains_id(&1));
        assert!(!repo.contains_id(&4));
    }
}
