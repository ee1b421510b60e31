//! Bound object model.
//!
//! # Responsibility
//! - Define the identity contract for registry entries.
//! - Provide the example object reflected through the binding layer.
//!
//! # Invariants
//! - Object ids are immutable once constructed.

pub mod bound_object;
