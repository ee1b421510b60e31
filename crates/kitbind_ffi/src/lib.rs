//! Scripting bindings for kitbind bound objects.

pub mod api;
pub mod session;
