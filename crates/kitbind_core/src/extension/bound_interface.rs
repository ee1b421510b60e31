//! Extension shim that publishes a named object registry.

use crate::extension::descriptor::{HotReload, PluginDescriptor, DEV_VERSION};
use crate::extension::directory::InterfaceDirectory;
use crate::extension::interface::{
    HostInterface, HOST_INTERFACE_BOUND_REGISTRY, HOST_INTERFACE_LOGGING,
};
use crate::extension::lifecycle::{
    Extension, HostContext, Lifecycle, LifecycleError, LifecycleState,
};
use crate::model::bound_object::BoundObject;
use crate::registry::object_registry::{NamedRegistry, ObjectRegistry};
use log::info;
use std::sync::Arc;

/// Plugin name of the sample bound-interface extension.
pub const BOUND_INTERFACE_PLUGIN_NAME: &str = "example.bound.plugin";

/// Where the published registry comes from.
enum RegistrySource<T: ?Sized + BoundObject> {
    /// Built on start, cleared on stop.
    Owned,
    /// Injected by the caller and shared with other holders.
    Shared(Arc<ObjectRegistry<T>>),
}

/// Extension that publishes a [`NamedRegistry`] while started.
///
/// The registry is published to the host context's [`InterfaceDirectory`]
/// on start and withdrawn on stop.
pub struct BoundInterfaceExtension<T: ?Sized + BoundObject + 'static> {
    descriptor: PluginDescriptor,
    lifecycle: Lifecycle,
    source: RegistrySource<T>,
    registry: Option<Arc<ObjectRegistry<T>>>,
    published_to: Option<Arc<InterfaceDirectory>>,
}

impl<T: ?Sized + BoundObject + 'static> BoundInterfaceExtension<T> {
    /// Builds its own registry on start.
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            lifecycle: Lifecycle::new(),
            source: RegistrySource::Owned,
            registry: None,
            published_to: None,
        }
    }

    /// Publishes `registry` instead of building one.
    pub fn with_shared_registry(
        descriptor: PluginDescriptor,
        registry: Arc<ObjectRegistry<T>>,
    ) -> Self {
        Self {
            descriptor,
            lifecycle: Lifecycle::new(),
            source: RegistrySource::Shared(registry),
            registry: None,
            published_to: None,
        }
    }

    /// Sample descriptor: hot reload enabled, exports the bound registry.
    pub fn default_descriptor() -> PluginDescriptor {
        PluginDescriptor {
            name: BOUND_INTERFACE_PLUGIN_NAME.to_string(),
            description: "An example native extension with a bound object interface."
                .to_string(),
            author: "kitbind".to_string(),
            hot_reload: HotReload::Enabled,
            version: DEV_VERSION.to_string(),
            dependencies: vec![HOST_INTERFACE_LOGGING.to_string()],
            provides: vec![HOST_INTERFACE_BOUND_REGISTRY.to_string()],
        }
    }

    /// Returns the published interface. Only valid while started.
    pub fn interface(&self) -> Result<Arc<dyn NamedRegistry<T>>, LifecycleError> {
        let registry: Arc<dyn NamedRegistry<T>> = self.registry()?;
        Ok(registry)
    }

    /// Returns the concrete registry. Only valid while started.
    pub fn registry(&self) -> Result<Arc<ObjectRegistry<T>>, LifecycleError> {
        self.lifecycle.require_started()?;
        self.registry.clone().ok_or(LifecycleError::NotStarted)
    }
}

impl<T: ?Sized + BoundObject + 'static> Extension for BoundInterfaceExtension<T> {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn on_startup(
        &mut self,
        extension_id: &str,
        ctx: &HostContext,
    ) -> Result<(), LifecycleError> {
        self.lifecycle.begin_start()?;
        let registry = match &self.source {
            RegistrySource::Owned => Arc::new(ObjectRegistry::new()),
            RegistrySource::Shared(shared) => shared.clone(),
        };
        ctx.interfaces().publish_registry::<T>(registry.clone());
        self.published_to = Some(ctx.interfaces().clone());
        self.registry = Some(registry);
        info!(
            "event=extension_startup module=extension status=ok extension_id={} shared_registry={}",
            extension_id,
            matches!(self.source, RegistrySource::Shared(_))
        );
        Ok(())
    }

    fn on_shutdown(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.begin_stop()?;
        if let Some(directory) = self.published_to.take() {
            directory.withdraw(HostInterface::BoundRegistry);
        }
        if let Some(registry) = self.registry.take() {
            if matches!(self.source, RegistrySource::Owned) {
                registry.clear();
            }
        }
        info!(
            "event=extension_shutdown module=extension status=ok name={}",
            self.descriptor.name
        );
        Ok(())
    }
}
