//! Named object registry.
//!
//! # Responsibility
//! - Keep the id-keyed set of currently active bound objects.
//! - Export the register/deregister/find capability set.
//!
//! # Invariants
//! - At most one entry per id; the latest `register` wins.
//! - Lookups never fail; absence is `None`.

pub mod object_registry;
