//! Published interface directory.
//!
//! # Responsibility
//! - Let a started extension publish the interfaces it exports.
//! - Let dependents and scripting callers resolve those interfaces by name.
//!
//! # Invariants
//! - At most one publication per interface; a second publish replaces it.
//! - Resolution is typed: asking for the wrong object type yields `None`.

use crate::extension::interface::HostInterface;
use crate::model::bound_object::BoundObject;
use crate::registry::object_registry::NamedRegistry;
use log::debug;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Publication = Arc<dyn Any + Send + Sync>;

/// Interface name -> published implementation.
#[derive(Default)]
pub struct InterfaceDirectory {
    published: Mutex<HashMap<HostInterface, Publication>>,
}

impl InterfaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `registry` as the bound registry interface.
    pub fn publish_registry<T: ?Sized + BoundObject + 'static>(
        &self,
        registry: Arc<dyn NamedRegistry<T>>,
    ) {
        let publication: Publication = Arc::new(registry);
        let previous = self
            .lock()
            .insert(HostInterface::BoundRegistry, publication);
        debug!(
            "event=interface_publish module=directory status=ok interface={} replaced={}",
            HostInterface::BoundRegistry,
            previous.is_some()
        );
    }

    /// Returns the published bound registry holding `T` objects.
    pub fn resolve_registry<T: ?Sized + BoundObject + 'static>(
        &self,
    ) -> Option<Arc<dyn NamedRegistry<T>>> {
        let publication = self.lock().get(&HostInterface::BoundRegistry).cloned()?;
        publication
            .downcast_ref::<Arc<dyn NamedRegistry<T>>>()
            .cloned()
    }

    /// Withdraws whatever is published under `interface`.
    pub fn withdraw(&self, interface: HostInterface) -> bool {
        let removed = self.lock().remove(&interface);
        if removed.is_some() {
            debug!("event=interface_withdraw module=directory status=ok interface={interface}");
        }
        removed.is_some()
    }

    pub fn is_published(&self, interface: HostInterface) -> bool {
        self.lock().contains_key(&interface)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HostInterface, Publication>> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
