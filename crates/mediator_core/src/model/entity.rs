//! Entity identity contract.
//!
//! # Responsibility
//! - Expose a stable, comparable identifier for every repository-managed type.
//! - Ship two concrete entity types with different identifier shapes.
//!
//! # Invariants
//! - `Entity::id` is stable for the lifetime of a value.
//! - Two values are "the same entity" for delete and notification purposes
//!   only when they are equal as whole values.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Identity abstraction shared by every repository-managed object.
///
/// Implementors are plain values: they are cloned into notification events
/// and compared with `PartialEq` when deleting.
pub trait Entity: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Identifier type used for lookups.
    type Id: Clone + PartialEq + Debug + Send + Sync;

    /// Returns the stable identifier of this entity.
    fn id(&self) -> &Self::Id;
}

/// Integer-keyed entity.
///
/// The default value has `id == 0`, and several records may share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    /// Opaque caller data; part of value equality.
    pub payload: String,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            payload: String::new(),
        }
    }

    pub fn with_payload(id: i64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

impl Entity for Record {
    type Id = i64;

    fn id(&self) -> &i64 {
        &self.id
    }
}

/// UUID-keyed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
}

impl Document {
    /// Creates a document with a generated v4 identifier.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a document with a caller-provided identifier.
    ///
    /// Used where identity already exists externally.
    pub fn with_id(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl Entity for Document {
    type Id = Uuid;

    fn id(&self) -> &Uuid {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Entity, Record};

    #[test]
    fn default_record_has_zero_id() {
        let record = Record::default();
        assert_eq!(*record.id(), 0);
        assert!(record.payload.is_empty());
    }

    #[test]
    fn records_with_same_id_differ_by_payload() {
        let first = Record::with_payload(7, "a");
        let second = Record::with_payload(7, "b");
        assert_eq!(first.id(), second.id());
        assert_ne!(first, second);
    }

    #[test]
    fn document_new_generates_distinct_ids() {
        let first = Document::new("one");
        let second = Document::new("two");
        assert!(!first.id().is_nil());
        assert_ne!(first.id(), second.id());
    }
}
