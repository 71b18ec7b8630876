//! Entity contract and the concrete entity types shipped with core.
//!
//! # Responsibility
//! - Define the minimal identity abstraction every managed object satisfies.
//! - Provide concrete entity shapes used by repositories and subscribers.
//!
//! # Invariants
//! - Entity identifiers are never mutated by repositories.
//! - Notification payload comparisons use full value equality, not id alone.

pub mod entity;
