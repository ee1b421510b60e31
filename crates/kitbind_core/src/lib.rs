//! Core of the kitbind extension scaffolding.
//! Bound objects, the named object registry, plugin descriptors and the
//! extension lifecycle shims live here; bindings and the CLI harness build on
//! top of this crate.

pub mod config;
pub mod events;
pub mod extension;
pub mod logging;
pub mod model;
pub mod registry;

pub use config::{ConfigError, HostConfig};
pub use events::update::{
    Subscription, UpdateCallback, UpdateDispatcher, UpdateEvent, UpdateEventSource,
};
pub use extension::bound_interface::{BoundInterfaceExtension, BOUND_INTERFACE_PLUGIN_NAME};
pub use extension::descriptor::{DescriptorError, HotReload, PluginDescriptor};
pub use extension::directory::InterfaceDirectory;
pub use extension::interface::{parse_host_interface, HostInterface, HostInterfaceError};
pub use extension::kernel::{ExtensionHost, HostError};
pub use extension::lifecycle::{
    Extension, HostContext, Lifecycle, LifecycleError, LifecycleState,
};
pub use extension::update_counter::{
    UpdateCounter, UpdateCounterExtension, UPDATE_COUNTER_PLUGIN_NAME,
};
pub use logging::{
    default_log_level, init_logging, logging_status, normalize_level, LoggingError,
};
pub use model::bound_object::{BoundObject, BoundObjectSnapshot, ExampleBoundObject};
pub use registry::object_registry::{NamedRegistry, ObjectRegistry};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
