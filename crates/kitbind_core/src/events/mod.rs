//! Host event feeds consumed by extensions.

pub mod update;
