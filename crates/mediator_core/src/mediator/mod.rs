//! Mediator layer between repositories and their observers.
//!
//! # Responsibility
//! - Resolve one mediator instance per capability key.
//! - Route added/deleted/retrieved notifications from repositories to
//!   listeners without either side referencing the other.
//!
//! # Invariants
//! - At most one mediator is registered per capability key.
//! - Listeners are invoked synchronously, in attachment order.

pub mod event;
pub mod registry;
pub mod repository_mediator;
