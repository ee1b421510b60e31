//! Extension lifecycle contracts.
//!
//! # Invariants
//! - Lifecycle is single-shot: `Unloaded -> Started -> Stopped`.
//! - No operation is valid before start completes or after stop begins.

use crate::events::update::UpdateEventSource;
use crate::extension::descriptor::PluginDescriptor;
use crate::extension::directory::InterfaceDirectory;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Lifecycle state of one extension instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Unloaded,
    Started,
    Stopped,
}

/// Lifecycle transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    AlreadyStarted,
    NotStarted,
    AlreadyStopped,
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "extension is already started"),
            Self::NotStarted => write!(f, "extension has not been started"),
            Self::AlreadyStopped => {
                write!(f, "extension is stopped; restarting is not supported")
            }
        }
    }
}

impl Error for LifecycleError {}

/// Single-shot lifecycle tracker shared by extension shims.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Moves `Unloaded -> Started`.
    pub fn begin_start(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Unloaded => {
                self.state = LifecycleState::Started;
                Ok(())
            }
            LifecycleState::Started => Err(LifecycleError::AlreadyStarted),
            LifecycleState::Stopped => Err(LifecycleError::AlreadyStopped),
        }
    }

    /// Moves `Started -> Stopped`.
    pub fn begin_stop(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Started => {
                self.state = LifecycleState::Stopped;
                Ok(())
            }
            LifecycleState::Unloaded => Err(LifecycleError::NotStarted),
            LifecycleState::Stopped => Err(LifecycleError::AlreadyStopped),
        }
    }

    /// Fails unless currently `Started`.
    pub fn require_started(&self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Started => Ok(()),
            LifecycleState::Unloaded => Err(LifecycleError::NotStarted),
            LifecycleState::Stopped => Err(LifecycleError::AlreadyStopped),
        }
    }
}

/// Host collaborators injected into `on_startup`.
#[derive(Clone)]
pub struct HostContext {
    update_events: Arc<dyn UpdateEventSource>,
    interfaces: Arc<InterfaceDirectory>,
}

impl HostContext {
    pub fn new(update_events: Arc<dyn UpdateEventSource>) -> Self {
        Self {
            update_events,
            interfaces: Arc::new(InterfaceDirectory::new()),
        }
    }

    pub fn update_events(&self) -> &Arc<dyn UpdateEventSource> {
        &self.update_events
    }

    /// Interfaces published by started extensions.
    pub fn interfaces(&self) -> &Arc<InterfaceDirectory> {
        &self.interfaces
    }
}

/// Host-driven extension hooks.
///
/// The host calls `on_startup` and `on_shutdown` exactly once each, in that
/// order.
pub trait Extension: Send {
    fn descriptor(&self) -> &PluginDescriptor;

    fn state(&self) -> LifecycleState;

    fn on_startup(&mut self, extension_id: &str, ctx: &HostContext)
        -> Result<(), LifecycleError>;

    fn on_shutdown(&mut self) -> Result<(), LifecycleError>;
}
