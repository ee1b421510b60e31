//! Handle-based binding session.
//!
//! # Responsibility
//! - Resolve the registry interface published by a started bound-interface
//!   extension and hold it for scripting callers.
//! - Map bound objects to integer handles that can cross the FFI boundary.
//!
//! # Invariants
//! - Unknown handles and a released interface turn every call into a no-op.
//! - The id of a bound object is read-only from the scripting side.
//! - Releasing a handle drops only the session's reference.
//! - Releasing the interface drops only the session's reference; the next
//!   acquire resolves the same published registry.

use kitbind_core::{
    BoundInterfaceExtension, BoundObjectSnapshot, ExampleBoundObject, ExtensionHost, HostContext,
    NamedRegistry, UpdateDispatcher,
};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Integer handle naming one bound object inside a session.
pub type ObjectHandle = u64;

/// Scripting-side state: acquired interface plus live object handles.
pub struct BindingSession {
    context: HostContext,
    /// Host started on first acquire when nothing has published a registry.
    embedded_host: Option<ExtensionHost>,
    embed_on_demand: bool,
    interface: Option<Arc<dyn NamedRegistry<ExampleBoundObject>>>,
    objects: BTreeMap<ObjectHandle, Arc<ExampleBoundObject>>,
    next_handle: ObjectHandle,
}

impl Default for BindingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingSession {
    /// Session that starts its own bound-interface extension on first acquire.
    pub fn new() -> Self {
        let mut session = Self::attached(HostContext::new(Arc::new(UpdateDispatcher::new())));
        session.embed_on_demand = true;
        session
    }

    /// Session resolving interfaces published into `context` by an external
    /// host.
    pub fn attached(context: HostContext) -> Self {
        Self {
            context,
            embedded_host: None,
            embed_on_demand: false,
            interface: None,
            objects: BTreeMap::new(),
            next_handle: 0,
        }
    }

    /// Acquires the published bound registry.
    ///
    /// Returns `false` when one is already held or none is published.
    pub fn acquire_bound_interface(&mut self) -> bool {
        if self.interface.is_some() {
            return false;
        }
        let mut published = self.resolve_published();
        if published.is_none() && self.start_embedded_host() {
            published = self.resolve_published();
        }
        match published {
            Some(interface) => self.acquire_with(interface),
            None => {
                debug!("event=bound_interface_acquire module=ffi status=error reason=not_published");
                false
            }
        }
    }

    /// Acquires `interface` published elsewhere, e.g. by a started extension.
    pub fn acquire_with(&mut self, interface: Arc<dyn NamedRegistry<ExampleBoundObject>>) -> bool {
        if self.interface.is_some() {
            return false;
        }
        self.interface = Some(interface);
        debug!("event=bound_interface_acquire module=ffi status=ok");
        true
    }

    /// Drops the interface reference. Object handles stay valid.
    pub fn release_bound_interface(&mut self) -> bool {
        let released = self.interface.take().is_some();
        if released {
            debug!("event=bound_interface_release module=ffi status=ok");
        }
        released
    }

    pub fn has_interface(&self) -> bool {
        self.interface.is_some()
    }

    pub fn create_bound_object(&mut self, id: Option<&str>) -> ObjectHandle {
        self.insert(Arc::new(ExampleBoundObject::from_optional_id(id)))
    }

    pub fn release_bound_object(&mut self, handle: ObjectHandle) -> bool {
        self.objects.remove(&handle).is_some()
    }

    pub fn register_bound_object(&self, handle: ObjectHandle) -> bool {
        match (&self.interface, self.objects.get(&handle)) {
            (Some(interface), Some(object)) => {
                interface.register(object.clone());
                true
            }
            _ => false,
        }
    }

    pub fn deregister_bound_object(&self, handle: ObjectHandle) -> bool {
        match (&self.interface, self.objects.get(&handle)) {
            (Some(interface), Some(object)) => {
                interface.deregister(object);
                true
            }
            _ => false,
        }
    }

    /// Looks up `id` and returns a handle for the registered object.
    ///
    /// An object that already has a handle in this session keeps it.
    pub fn find_bound_object(&mut self, id: &str) -> Option<ObjectHandle> {
        let found = self.interface.as_ref()?.find(id)?;
        let existing = self
            .objects
            .iter()
            .find(|(_, object)| Arc::ptr_eq(object, &found))
            .map(|(handle, _)| *handle);
        Some(existing.unwrap_or_else(|| self.insert(found)))
    }

    pub fn bound_object_view(&self, handle: ObjectHandle) -> Option<BoundObjectSnapshot> {
        self.objects.get(&handle).map(|object| object.snapshot())
    }

    pub fn set_property_int(&self, handle: ObjectHandle, value: i64) -> bool {
        self.with_object(handle, |object| object.set_property_int(value))
            .is_some()
    }

    pub fn set_property_bool(&self, handle: ObjectHandle, value: bool) -> bool {
        self.with_object(handle, |object| object.set_property_bool(value))
            .is_some()
    }

    pub fn set_property_string(&self, handle: ObjectHandle, value: &str) -> bool {
        self.with_object(handle, |object| object.set_property_string(value))
            .is_some()
    }

    /// Returns the new int value.
    pub fn multiply_int_property(&self, handle: ObjectHandle, factor: i64) -> Option<i64> {
        self.with_object(handle, |object| {
            object.multiply_int_property(factor);
            object.property_int()
        })
    }

    pub fn toggle_bool_property(&self, handle: ObjectHandle) -> Option<bool> {
        self.with_object(handle, |object| object.toggle_bool_property())
    }

    pub fn append_string_property(&self, handle: ObjectHandle, suffix: &str) -> Option<String> {
        self.with_object(handle, |object| object.append_string_property(suffix))
    }

    pub fn handle_count(&self) -> usize {
        self.objects.len()
    }

    fn with_object<R>(
        &self,
        handle: ObjectHandle,
        f: impl FnOnce(&ExampleBoundObject) -> R,
    ) -> Option<R> {
        self.objects.get(&handle).map(|object| f(object.as_ref()))
    }

    fn resolve_published(&self) -> Option<Arc<dyn NamedRegistry<ExampleBoundObject>>> {
        self.context
            .interfaces()
            .resolve_registry::<ExampleBoundObject>()
    }

    fn start_embedded_host(&mut self) -> bool {
        if !self.embed_on_demand || self.embedded_host.is_some() {
            return false;
        }
        let mut host = ExtensionHost::new(self.context.clone());
        let started = host
            .register(Box::new(BoundInterfaceExtension::<ExampleBoundObject>::new(
                BoundInterfaceExtension::<ExampleBoundObject>::default_descriptor(),
            )))
            .and_then(|()| host.startup_all());
        if let Err(err) = started {
            warn!("event=embedded_host_start module=ffi status=error error={err}");
            return false;
        }
        self.embedded_host = Some(host);
        true
    }

    fn insert(&mut self, object: Arc<ExampleBoundObject>) -> ObjectHandle {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.objects.insert(handle, object);
        handle
    }
}

impl Drop for BindingSession {
    fn drop(&mut self) {
        if let Some(host) = self.embedded_host.as_mut() {
            if let Err(err) = host.shutdown_all() {
                warn!("event=embedded_host_stop module=ffi status=error error={err}");
            }
        }
    }
}
