//! FFI binding API for scripting callers.
//!
//! # Responsibility
//! - Expose the bound object registry and object properties through FRB.
//! - Keep one process-wide binding session behind a mutex. The session hosts
//!   the bound-interface extension whose registry every acquire resolves.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Unknown handles yield `false`/`None`, never an error.
//! - `id` has no setter.

use crate::session::{BindingSession, ObjectHandle};
use kitbind_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BoundObjectSnapshot,
};
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard};

static SESSION: Lazy<Mutex<BindingSession>> = Lazy::new(|| Mutex::new(BindingSession::new()));

/// Scripting view of one bound object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundObjectView {
    /// Read-only id assigned at construction.
    pub id: String,
    pub property_int: i64,
    pub property_bool: bool,
    pub property_string: String,
}

impl From<BoundObjectSnapshot> for BoundObjectView {
    fn from(value: BoundObjectSnapshot) -> Self {
        Self {
            id: value.id,
            property_int: value.property_int,
            property_bool: value.property_bool,
            property_string: value.property_string,
        }
    }
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Acquires the published bound interface. `false` when already acquired.
#[flutter_rust_bridge::frb(sync)]
pub fn acquire_bound_interface() -> bool {
    session().acquire_bound_interface()
}

/// Releases the bound interface. `false` when none was held.
///
/// Registrations survive; the next acquire sees them.
#[flutter_rust_bridge::frb(sync)]
pub fn release_bound_interface() -> bool {
    session().release_bound_interface()
}

/// Creates a bound object and returns its handle. `None` id becomes `""`.
#[flutter_rust_bridge::frb(sync)]
pub fn create_bound_object(id: Option<String>) -> ObjectHandle {
    session().create_bound_object(id.as_deref())
}

/// Drops the scripting reference behind `handle`.
#[flutter_rust_bridge::frb(sync)]
pub fn release_bound_object(handle: ObjectHandle) -> bool {
    session().release_bound_object(handle)
}

#[flutter_rust_bridge::frb(sync)]
pub fn register_bound_object(handle: ObjectHandle) -> bool {
    session().register_bound_object(handle)
}

/// Removes whatever is registered under the object's id.
#[flutter_rust_bridge::frb(sync)]
pub fn deregister_bound_object(handle: ObjectHandle) -> bool {
    session().deregister_bound_object(handle)
}

#[flutter_rust_bridge::frb(sync)]
pub fn find_bound_object(id: String) -> Option<ObjectHandle> {
    session().find_bound_object(id.as_str())
}

#[flutter_rust_bridge::frb(sync)]
pub fn bound_object_view(handle: ObjectHandle) -> Option<BoundObjectView> {
    session().bound_object_view(handle).map(BoundObjectView::from)
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_property_int(handle: ObjectHandle, value: i64) -> bool {
    session().set_property_int(handle, value)
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_property_bool(handle: ObjectHandle, value: bool) -> bool {
    session().set_property_bool(handle, value)
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_property_string(handle: ObjectHandle, value: String) -> bool {
    session().set_property_string(handle, value.as_str())
}

/// Multiplies the int property and returns the new value.
#[flutter_rust_bridge::frb(sync)]
pub fn multiply_int_property(handle: ObjectHandle, value_to_multiply: i64) -> Option<i64> {
    session().multiply_int_property(handle, value_to_multiply)
}

/// Toggles the bool property and returns the new value.
#[flutter_rust_bridge::frb(sync)]
pub fn toggle_bool_property(handle: ObjectHandle) -> Option<bool> {
    session().toggle_bool_property(handle)
}

/// Appends to the string property and returns the new value.
#[flutter_rust_bridge::frb(sync)]
pub fn append_string_property(handle: ObjectHandle, value_to_append: String) -> Option<String> {
    session().append_string_property(handle, value_to_append.as_str())
}

fn session() -> MutexGuard<'static, BindingSession> {
    SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
