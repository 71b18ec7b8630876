//! Configuration types for mediators and repositories.
//!
//! # Responsibility
//! - Hold the policy switches the core exposes to a composition root.
//! - Stay embeddable in a host config file via serde.
//!
//! # Invariants
//! - Every field has a default that reproduces the base delivery and
//!   storage semantics; stricter behavior is opt-in.

use serde::{Deserialize, Serialize};

/// How a mediator reacts to a failing listener during one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Stop at the first failing listener and surface its error.
    #[default]
    FailFast,
    /// Run every listener, then surface all failures together.
    CollectErrors,
}

/// Mediator-level settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub delivery: DeliveryPolicy,
}

impl MediatorConfig {
    pub fn collect_errors() -> Self {
        Self {
            delivery: DeliveryPolicy::CollectErrors,
        }
    }
}

/// Repository-level settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Reject `add` when an entity with the same id is already stored.
    ///
    /// Off by default: entities sharing an id coexist.
    pub enforce_unique_ids: bool,
}

impl RepositoryConfig {
    pub fn unique_ids() -> Self {
        Self {
            enforce_unique_ids: true,
        }
    }
}
