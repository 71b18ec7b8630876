//! Capability-keyed mediator registry.
//!
//! # Responsibility
//! - Map each capability key to exactly one mediator instance.
//! - Hand out the registered instance on every resolve.
//!
//! # Invariants
//! - At most one instance per key; a conflicting registration is rejected,
//!   re-registering the same instance is a no-op.
//! - Resolution never constructs a mediator.
//! - Entries live as long as the registry; there is no removal.
//!
//! The registry is an explicit object owned by the composition root and
//! passed by reference to whatever needs resolution.

use crate::config::MediatorConfig;
use crate::mediator::repository_mediator::RepositoryMediator;
use crate::model::entity::Entity;
use log::{info, warn};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

/// Type-level identity of a mediator capability.
///
/// Derived once per concrete mediator type, so `RepositoryMediator<A>` and
/// `RepositoryMediator<B>` never collide.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityKey {
    type_id: TypeId,
    name: &'static str,
}

impl CapabilityKey {
    pub fn of<M: Any>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Diagnostic type name; not part of equality.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl Display for CapabilityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Registration/resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnregisteredCapability(&'static str),
    DuplicateRegistration(&'static str),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnregisteredCapability(name) => {
                write!(f, "no mediator registered for capability: {name}")
            }
            Self::DuplicateRegistration(name) => {
                write!(f, "a different mediator is already registered for capability: {name}")
            }
        }
    }
}

impl Error for RegistryError {}

type MediatorHandle = Arc<dyn Any + Send + Sync>;

/// Runtime mediator registry.
///
/// Registration is expected during single-threaded setup; resolution is safe
/// from any number of threads.
#[derive(Default)]
pub struct MediatorRegistry {
    entries: RwLock<HashMap<CapabilityKey, MediatorHandle>>,
}

impl MediatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` under the capability key of `M`.
    ///
    /// # Errors
    /// - `DuplicateRegistration` when another instance already owns the key.
    pub fn register<M>(&self, instance: Arc<M>) -> Result<(), RegistryError>
    where
        M: Any + Send + Sync,
    {
        let key = CapabilityKey::of::<M>();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = entries.get(&key) {
            let same_instance = std::ptr::eq(
                Arc::as_ptr(existing) as *const (),
                Arc::as_ptr(&instance) as *const (),
            );
            if same_instance {
                return Ok(());
            }
            warn!(
                "event=mediator_register module=registry status=error reason=duplicate capability={}",
                key
            );
            return Err(RegistryError::DuplicateRegistration(key.name()));
        }

        entries.insert(key, instance);
        info!(
            "event=mediator_register module=registry status=ok capability={} total={}",
            key,
            entries.len()
        );
        Ok(())
    }

    /// Returns the instance registered for `M`.
    ///
    /// # Errors
    /// - `UnregisteredCapability` when nothing was registered for `M`.
    pub fn resolve<M>(&self) -> Result<Arc<M>, RegistryError>
    where
        M: Any + Send + Sync,
    {
        let key = CapabilityKey::of::<M>();
        let handle = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .ok_or(RegistryError::UnregisteredCapability(key.name()))?;

        // Keys are derived from `TypeId`, so a stored handle always downcasts.
        handle
            .downcast::<M>()
            .map_err(|_| RegistryError::UnregisteredCapability(key.name()))
    }

    pub fn contains<M: Any>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&CapabilityKey::of::<M>())
    }

    /// Creates, registers and returns a repository mediator for `T`.
    pub fn register_repository_mediator<T: Entity>(
        &self,
        config: MediatorConfig,
    ) -> Result<Arc<RepositoryMediator<T>>, RegistryError> {
        let mediator = Arc::new(RepositoryMediator::<T>::with_config(config));
        self.register(Arc::clone(&mediator))?;
        Ok(mediator)
    }

    /// Resolves the repository mediator registered for `T`.
    pub fn resolve_repository_mediator<T: Entity>(
        &self,
    ) -> Result<Arc<RepositoryMediator<T>>, RegistryError> {
        self.resolve::<RepositoryMediator<T>>()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns sorted capability names.
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(CapabilityKey::name)
            .collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for MediatorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatorRegistry")
            .field("capabilities", &self.capability_names())
            .finish()
    }
}
