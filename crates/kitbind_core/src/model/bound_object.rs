//! Bound object domain model.
//!
//! # Responsibility
//! - Define the identity contract shared by every object crossing the
//!   extension/scripting boundary.
//! - Provide the example object whose properties the binding layer reflects.
//!
//! # Invariants
//! - `id` is assigned at construction and never changes afterwards.
//! - A missing id is coerced to the empty string, never rejected.
//! - Objects are shared through `Arc`; no single holder destroys them.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// Identity contract for objects stored in a named registry.
pub trait BoundObject: Send + Sync {
    /// Returns the stable id of this object.
    fn id(&self) -> &str;
}

/// Mutable example properties of [`ExampleBoundObject`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExampleProperties {
    int_value: i64,
    bool_value: bool,
    string_value: String,
}

/// Example bound object with an immutable id and three mutable properties.
///
/// Properties sit behind a mutex so every holder of the shared `Arc` observes
/// and mutates the same state.
#[derive(Debug)]
pub struct ExampleBoundObject {
    id: String,
    properties: Mutex<ExampleProperties>,
}

/// Point-in-time view of one example bound object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundObjectSnapshot {
    pub id: String,
    pub property_int: i64,
    pub property_bool: bool,
    pub property_string: String,
}

impl ExampleBoundObject {
    /// Creates an object with default properties (`0`, `false`, `""`).
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Mutex::new(ExampleProperties::default()),
        }
    }

    /// Creates an object from an optional id; `None` becomes `""`.
    pub fn from_optional_id(id: Option<&str>) -> Self {
        Self::new(id.unwrap_or_default())
    }

    pub fn property_int(&self) -> i64 {
        self.lock().int_value
    }

    pub fn set_property_int(&self, value: i64) {
        self.lock().int_value = value;
    }

    pub fn property_bool(&self) -> bool {
        self.lock().bool_value
    }

    pub fn set_property_bool(&self, value: bool) {
        self.lock().bool_value = value;
    }

    pub fn property_string(&self) -> String {
        self.lock().string_value.clone()
    }

    pub fn set_property_string(&self, value: impl Into<String>) {
        self.lock().string_value = value.into();
    }

    /// Multiplies the int property in place. Overflow wraps.
    pub fn multiply_int_property(&self, factor: i64) {
        let mut props = self.lock();
        props.int_value = props.int_value.wrapping_mul(factor);
    }

    /// Flips the bool property and returns the new value.
    pub fn toggle_bool_property(&self) -> bool {
        let mut props = self.lock();
        props.bool_value = !props.bool_value;
        props.bool_value
    }

    /// Appends to the string property and returns the new value.
    pub fn append_string_property(&self, suffix: &str) -> String {
        let mut props = self.lock();
        props.string_value.push_str(suffix);
        props.string_value.clone()
    }

    /// Captures id and all properties under one lock.
    pub fn snapshot(&self) -> BoundObjectSnapshot {
        let props = self.lock();
        BoundObjectSnapshot {
            id: self.id.clone(),
            property_int: props.int_value,
            property_bool: props.bool_value,
            property_string: props.string_value.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExampleProperties> {
        // A panicking writer cannot leave these plain fields half-updated.
        self.properties
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BoundObject for ExampleBoundObject {
    fn id(&self) -> &str {
        &self.id
    }
}
