//! Extension shim that counts host update events.
//!
//! Every 100th update (checked before the increment, so the very first
//! update counts as a boundary) emits one progress line at info level.

use crate::events::update::{Subscription, UpdateEvent};
use crate::extension::descriptor::{HotReload, PluginDescriptor, DEV_VERSION};
use crate::extension::interface::{
    HOST_INTERFACE_APP, HOST_INTERFACE_LOGGING, HOST_INTERFACE_UPDATE_EVENTS,
};
use crate::extension::lifecycle::{
    Extension, HostContext, Lifecycle, LifecycleError, LifecycleState,
};
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Plugin name of the sample update-counting extension.
pub const UPDATE_COUNTER_PLUGIN_NAME: &str = "example.native.plugin";
/// Observer name used for the update subscription.
pub const UPDATE_OBSERVER_NAME: &str = "example.native.update";
/// Updates between two progress lines.
pub const PROGRESS_INTERVAL: u64 = 100;

/// Lock-free update counter shared with the subscription callback.
#[derive(Debug, Default)]
pub struct UpdateCounter {
    count: AtomicU64,
    reports: AtomicU64,
}

impl UpdateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one update.
    ///
    /// Returns `Some(count)` when a progress line was emitted for the count
    /// observed before this increment.
    pub fn tick(&self) -> Option<u64> {
        let count = self.count.fetch_add(1, Ordering::SeqCst);
        if count % PROGRESS_INTERVAL != 0 {
            return None;
        }
        self.reports.fetch_add(1, Ordering::SeqCst);
        info!(
            "event=update_progress module=update_counter status=ok updates_passed={count}"
        );
        Some(count)
    }

    /// Updates recorded so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Progress lines emitted so far.
    pub fn reports(&self) -> u64 {
        self.reports.load(Ordering::SeqCst)
    }
}

/// Extension that observes host updates while started.
pub struct UpdateCounterExtension {
    descriptor: PluginDescriptor,
    lifecycle: Lifecycle,
    counter: Arc<UpdateCounter>,
    subscription: Option<Subscription>,
}

impl UpdateCounterExtension {
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            lifecycle: Lifecycle::new(),
            counter: Arc::new(UpdateCounter::new()),
            subscription: None,
        }
    }

    /// Sample descriptor: hot reload disabled, needs app + logging.
    pub fn default_descriptor() -> PluginDescriptor {
        PluginDescriptor {
            name: UPDATE_COUNTER_PLUGIN_NAME.to_string(),
            description: "Example of a native plugin extension.".to_string(),
            author: "kitbind".to_string(),
            hot_reload: HotReload::Disabled,
            version: DEV_VERSION.to_string(),
            dependencies: vec![
                HOST_INTERFACE_APP.to_string(),
                HOST_INTERFACE_LOGGING.to_string(),
                HOST_INTERFACE_UPDATE_EVENTS.to_string(),
            ],
            provides: vec![],
        }
    }

    /// Shared handle to the counter; stays readable after shutdown.
    pub fn counter(&self) -> Arc<UpdateCounter> {
        self.counter.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Default for UpdateCounterExtension {
    fn default() -> Self {
        Self::new(Self::default_descriptor())
    }
}

impl Extension for UpdateCounterExtension {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn on_startup(&mut self, extension_id: &str, ctx: &HostContext) -> Result<(), LifecycleError> {
        self.lifecycle.begin_start()?;
        info!("event=extension_startup module=extension status=ok extension_id={extension_id}");

        let counter = self.counter.clone();
        self.subscription = Some(ctx.update_events().observe(
            UPDATE_OBSERVER_NAME,
            0,
            Arc::new(move |_event: &UpdateEvent| {
                counter.tick();
            }),
        ));
        Ok(())
    }

    fn on_shutdown(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.begin_stop()?;
        // Dropping the handle unsubscribes.
        self.subscription = None;
        info!(
            "event=extension_shutdown module=extension status=ok name={} updates={}",
            self.descriptor.name,
            self.counter.count()
        );
        Ok(())
    }
}
