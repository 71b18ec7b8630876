//! Repository layer abstractions and the in-memory implementation.
//!
//! # Responsibility
//! - Define the add/delete/get contract over an entity collection.
//! - Pair every successful operation with one mediator publish.
//!
//! # Invariants
//! - Publish follows a successful mutation; it never precedes it.
//! - Failed operations neither mutate nor publish.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateId`).

pub mod entity_repo;
