//! Typed mediator layer between entity repositories and their observers.
//! Repositories publish add/delete/get notifications; subscribers attach to
//! per-entity-type mediators resolved from an explicit registry.

pub mod config;
pub mod logging;
pub mod mediator;
pub mod model;
pub mod repo;
pub mod subscriber;

pub use config::{DeliveryPolicy, MediatorConfig, RepositoryConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mediator::event::{Channel, ListenerError, ListenerResult, NotificationEvent};
pub use mediator::registry::{CapabilityKey, MediatorRegistry, RegistryError};
pub use mediator::repository_mediator::{
    ListenerFailure, ListenerId, PublishError, RepositoryMediator, Subscription,
};
pub use model::entity::{Document, Entity, Record};
pub use repo::entity_repo::{EntityRepository, InMemoryRepository, RepoError, RepoResult};
pub use subscriber::audit_trail::AuditTrail;
pub use subscriber::mirror_cache::MirrorCache;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
