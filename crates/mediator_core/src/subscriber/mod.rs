//! Reference subscribers attached to repository mediators.
//!
//! Subscribers own their state and never mutate the entities they receive.
//! Their listeners hold weak references, so dropping a subscriber turns its
//! attached listeners into no-ops.

pub mod audit_trail;
pub mod mirror_cache;
