//! Extension contracts.
//!
//! This module defines plugin descriptors, the single-shot lifecycle, the
//! directory of published interfaces, the two sample extension shims and the
//! in-process host that drives them.
//! Dynamic plugin loading stays with the embedding host.

pub mod bound_interface;
pub mod descriptor;
pub mod directory;
pub mod interface;
pub mod kernel;
pub mod lifecycle;
pub mod update_counter;
