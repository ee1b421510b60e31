//! Host interface declarations for plugin dependencies and exports.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Interface a plugin may depend on or export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostInterface {
    App,
    Logging,
    UpdateEvents,
    BoundRegistry,
}

impl HostInterface {
    /// Interfaces the host provides before any plugin starts.
    pub const HOST_BUILTINS: [HostInterface; 3] = [Self::App, Self::Logging, Self::UpdateEvents];

    /// Stable string id used in descriptor declarations.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => HOST_INTERFACE_APP,
            Self::Logging => HOST_INTERFACE_LOGGING,
            Self::UpdateEvents => HOST_INTERFACE_UPDATE_EVENTS,
            Self::BoundRegistry => HOST_INTERFACE_BOUND_REGISTRY,
        }
    }

    /// Whether the host provides this interface before any plugin starts.
    pub fn is_host_builtin(self) -> bool {
        Self::HOST_BUILTINS.contains(&self)
    }
}

impl Display for HostInterface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor string value for the application interface.
pub const HOST_INTERFACE_APP: &str = "app";
/// Descriptor string value for the logging interface.
pub const HOST_INTERFACE_LOGGING: &str = "logging";
/// Descriptor string value for the per-frame update event stream.
pub const HOST_INTERFACE_UPDATE_EVENTS: &str = "update_events";
/// Descriptor string value for the bound object registry.
pub const HOST_INTERFACE_BOUND_REGISTRY: &str = "bound_registry";

const SUPPORTED_HOST_INTERFACE_STRINGS: &[&str] = &[
    HOST_INTERFACE_APP,
    HOST_INTERFACE_LOGGING,
    HOST_INTERFACE_UPDATE_EVENTS,
    HOST_INTERFACE_BOUND_REGISTRY,
];

/// Returns supported interface declaration strings.
pub fn supported_host_interface_strings() -> &'static [&'static str] {
    SUPPORTED_HOST_INTERFACE_STRINGS
}

/// Parses one interface from a descriptor string value.
pub fn parse_host_interface(value: &str) -> Result<HostInterface, HostInterfaceError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(HostInterfaceError::EmptyInterface);
    }

    match normalized {
        HOST_INTERFACE_APP => Ok(HostInterface::App),
        HOST_INTERFACE_LOGGING => Ok(HostInterface::Logging),
        HOST_INTERFACE_UPDATE_EVENTS => Ok(HostInterface::UpdateEvents),
        HOST_INTERFACE_BOUND_REGISTRY => Ok(HostInterface::BoundRegistry),
        other => Err(HostInterfaceError::UnsupportedInterface(other.to_string())),
    }
}

/// Interface parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostInterfaceError {
    EmptyInterface,
    UnsupportedInterface(String),
}

impl Display for HostInterfaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInterface => write!(f, "host interface value must not be empty"),
            Self::UnsupportedInterface(value) => {
                write!(f, "host interface is unsupported: {value}")
            }
        }
    }
}

impl Error for HostInterfaceError {}

#[cfg(test)]
mod tests {
    use super::{
        parse_host_interface, supported_host_interface_strings, HostInterface,
        HostInterfaceError,
    };

    #[test]
    fn parses_all_supported_interfaces() {
        for value in supported_host_interface_strings() {
            let parsed = parse_host_interface(value).expect("supported interface parse");
            assert_eq!(parsed.as_str(), *value);
        }
    }

    #[test]
    fn rejects_empty_interface() {
        let err = parse_host_interface("  ").expect_err("empty interface must fail");
        assert_eq!(err, HostInterfaceError::EmptyInterface);
    }

    #[test]
    fn rejects_non_lowercase_variants() {
        let err = parse_host_interface("Logging").expect_err("capitalized must fail");
        assert_eq!(
            err,
            HostInterfaceError::UnsupportedInterface("Logging".to_string())
        );
    }

    #[test]
    fn only_registry_is_plugin_provided() {
        assert!(HostInterface::App.is_host_builtin());
        assert!(HostInterface::Logging.is_host_builtin());
        assert!(HostInterface::UpdateEvents.is_host_builtin());
        assert!(!HostInterface::BoundRegistry.is_host_builtin());
    }
}
