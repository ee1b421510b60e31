//! In-process extension host.
//!
//! Drives descriptor validation, dependency resolution and the
//! startup/shutdown hooks of registered extensions. Dynamic library loading
//! is out of scope: extensions are registered as values.

use crate::extension::descriptor::{DescriptorError, PluginDescriptor};
use crate::extension::interface::HostInterface;
use crate::extension::lifecycle::{Extension, HostContext, LifecycleError, LifecycleState};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

struct HostedExtension {
    extension: Box<dyn Extension>,
    provides: Vec<HostInterface>,
    dependencies: Vec<HostInterface>,
}

/// Registry of extensions keyed by plugin name, started in registration order.
pub struct ExtensionHost {
    context: HostContext,
    entries: BTreeMap<String, HostedExtension>,
    load_order: Vec<String>,
    started: Vec<String>,
    export_index: BTreeMap<HostInterface, BTreeSet<String>>,
}

impl ExtensionHost {
    pub fn new(context: HostContext) -> Self {
        Self {
            context,
            entries: BTreeMap::new(),
            load_order: Vec::new(),
            started: Vec::new(),
            export_index: BTreeMap::new(),
        }
    }

    /// Registers one extension after descriptor validation.
    pub fn register(&mut self, extension: Box<dyn Extension>) -> Result<(), HostError> {
        let descriptor = extension.descriptor();
        descriptor.validate().map_err(HostError::InvalidDescriptor)?;
        let name = descriptor.name.trim().to_string();
        if self.entries.contains_key(name.as_str()) {
            return Err(HostError::DuplicateExtension(name));
        }
        let provides = descriptor
            .provided_interfaces()
            .map_err(HostError::InvalidDescriptor)?;
        let dependencies = descriptor
            .dependency_interfaces()
            .map_err(HostError::InvalidDescriptor)?;

        for interface in &provides {
            self.export_index
                .entry(*interface)
                .or_default()
                .insert(name.clone());
        }
        self.load_order.push(name.clone());
        self.entries.insert(
            name,
            HostedExtension {
                extension,
                provides,
                dependencies,
            },
        );
        Ok(())
    }

    /// Starts every registered, not yet started extension in registration
    /// order.
    ///
    /// Stops at the first failure; extensions started before it stay started.
    pub fn startup_all(&mut self) -> Result<(), HostError> {
        let pending: Vec<String> = self
            .load_order
            .iter()
            .filter(|name| !self.started.contains(*name))
            .cloned()
            .collect();
        for name in pending {
            self.startup(&name)?;
        }
        Ok(())
    }

    fn startup(&mut self, name: &str) -> Result<(), HostError> {
        let available = self.available_interfaces();
        let Some(entry) = self.entries.get_mut(name) else {
            return Err(HostError::ExtensionNotFound(name.to_string()));
        };
        if let Some(missing) = entry
            .dependencies
            .iter()
            .find(|dependency| !available.contains(*dependency))
        {
            warn!(
                "event=extension_startup module=kernel status=error name={name} missing_dependency={missing}"
            );
            return Err(HostError::MissingDependency {
                extension: name.to_string(),
                interface: *missing,
            });
        }

        let extension_id = entry.extension.descriptor().extension_id();
        entry
            .extension
            .on_startup(&extension_id, &self.context)
            .map_err(|source| HostError::Lifecycle {
                extension: name.to_string(),
                source,
            })?;
        self.started.push(name.to_string());
        info!("event=extension_started module=kernel status=ok extension_id={extension_id}");
        Ok(())
    }

    /// Stops started extensions in reverse start order.
    ///
    /// Every extension is given its shutdown call; the first error is
    /// returned after all of them ran.
    pub fn shutdown_all(&mut self) -> Result<(), HostError> {
        let mut first_error = None;
        while let Some(name) = self.started.pop() {
            let Some(entry) = self.entries.get_mut(name.as_str()) else {
                continue;
            };
            if let Err(source) = entry.extension.on_shutdown() {
                warn!("event=extension_shutdown module=kernel status=error name={name} error={source}");
                if first_error.is_none() {
                    first_error = Some(HostError::Lifecycle {
                        extension: name.clone(),
                        source,
                    });
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Context handed to every extension; resolves published interfaces.
    pub fn context(&self) -> &HostContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Extension> {
        self.entries
            .get(name.trim())
            .map(|entry| entry.extension.as_ref())
    }

    pub fn state(&self, name: &str) -> Option<LifecycleState> {
        self.get(name).map(|extension| extension.state())
    }

    /// Descriptors of extensions that export `interface`.
    pub fn list_by_export(&self, interface: HostInterface) -> Vec<&PluginDescriptor> {
        let Some(names) = self.export_index.get(&interface) else {
            return vec![];
        };
        names
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| entry.extension.descriptor())
            .collect()
    }

    fn available_interfaces(&self) -> BTreeSet<HostInterface> {
        let mut available: BTreeSet<HostInterface> =
            HostInterface::HOST_BUILTINS.into_iter().collect();
        for name in &self.started {
            if let Some(entry) = self.entries.get(name) {
                available.extend(entry.provides.iter().copied());
            }
        }
        available
    }
}

/// Host registration and lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    InvalidDescriptor(DescriptorError),
    DuplicateExtension(String),
    ExtensionNotFound(String),
    MissingDependency {
        extension: String,
        interface: HostInterface,
    },
    Lifecycle {
        extension: String,
        source: LifecycleError,
    },
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDescriptor(err) => write!(f, "invalid plugin descriptor: {err}"),
            Self::DuplicateExtension(name) => write!(f, "extension already registered: {name}"),
            Self::ExtensionNotFound(name) => write!(f, "extension not found: {name}"),
            Self::MissingDependency {
                extension,
                interface,
            } => write!(
                f,
                "extension {extension} depends on unavailable interface: {interface}"
            ),
            Self::Lifecycle { extension, source } => {
                write!(f, "extension {extension} lifecycle error: {source}")
            }
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDescriptor(err) => Some(err),
            Self::Lifecycle { source, .. } => Some(source),
            _ => None,
        }
    }
}
