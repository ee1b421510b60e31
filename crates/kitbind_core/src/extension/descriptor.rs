//! Plugin descriptor declaration and validation.
//!
//! A descriptor is the static record the host reads at discovery time:
//! identity, authorship, hot-reload support, version, and the interfaces the
//! plugin needs resolved before start or exports once started.

use crate::extension::interface::{parse_host_interface, HostInterface, HostInterfaceError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version string used by in-tree development builds.
pub const DEV_VERSION: &str = "dev";

static PLUGIN_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("plugin name pattern is valid")
});
static SEMVER_TRIPLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("semver pattern is valid"));

/// Whether the host may reload the plugin without restarting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotReload {
    Enabled,
    Disabled,
}

impl From<bool> for HotReload {
    fn from(value: bool) -> Self {
        if value {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Static plugin record consumed by the host loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Globally unique plugin name, e.g. `example.bound.plugin`.
    pub name: String,
    /// Free text used by debugging tools.
    pub description: String,
    pub author: String,
    pub hot_reload: HotReload,
    /// `dev` or `major.minor.patch`.
    pub version: String,
    /// Interfaces that must be resolved before `on_startup`.
    pub dependencies: Vec<String>,
    /// Interfaces published once started.
    pub provides: Vec<String>,
}

impl PluginDescriptor {
    /// Validates declaration-level descriptor invariants.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if !PLUGIN_NAME_RE.is_match(name) {
            return Err(DescriptorError::InvalidName(self.name.clone()));
        }

        let version = self.version.trim();
        if version.is_empty() {
            return Err(DescriptorError::EmptyVersion);
        }
        if version != DEV_VERSION && !SEMVER_TRIPLET_RE.is_match(version) {
            return Err(DescriptorError::InvalidVersion(self.version.clone()));
        }

        parse_interface_list(&self.dependencies)?;
        parse_interface_list(&self.provides)?;
        Ok(())
    }

    /// Parsed dependency declarations.
    pub fn dependency_interfaces(&self) -> Result<Vec<HostInterface>, DescriptorError> {
        parse_interface_list(&self.dependencies)
    }

    /// Parsed export declarations.
    pub fn provided_interfaces(&self) -> Result<Vec<HostInterface>, DescriptorError> {
        parse_interface_list(&self.provides)
    }

    /// Host-facing extension id (`name-version`).
    pub fn extension_id(&self) -> String {
        format!("{}-{}", self.name.trim(), self.version.trim())
    }

    /// Parses and validates an `extension.toml` style declaration.
    pub fn from_toml_str(raw: &str) -> Result<Self, DescriptorError> {
        let file: DescriptorFile =
            toml::from_str(raw).map_err(|err| DescriptorError::Parse(err.to_string()))?;
        let descriptor = Self {
            name: file.package.name,
            description: file.package.description,
            author: file.package.author,
            hot_reload: file.package.hot_reload.into(),
            version: file.package.version,
            dependencies: file.dependencies.interfaces,
            provides: file.exports.interfaces,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    package: PackageSection,
    #[serde(default)]
    dependencies: InterfaceSection,
    #[serde(default)]
    exports: InterfaceSection,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    hot_reload: bool,
}

#[derive(Debug, Default, Deserialize)]
struct InterfaceSection {
    #[serde(default)]
    interfaces: Vec<String>,
}

fn default_version() -> String {
    DEV_VERSION.to_string()
}

fn parse_interface_list(values: &[String]) -> Result<Vec<HostInterface>, DescriptorError> {
    let mut dedup = BTreeSet::new();
    let mut parsed = Vec::with_capacity(values.len());
    for value in values {
        let interface = parse_host_interface(value).map_err(DescriptorError::Interface)?;
        if !dedup.insert(interface) {
            return Err(DescriptorError::DuplicateInterface(interface.as_str()));
        }
        parsed.push(interface);
    }
    Ok(parsed)
}

/// Descriptor parse and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    Parse(String),
    EmptyName,
    InvalidName(String),
    EmptyVersion,
    InvalidVersion(String),
    Interface(HostInterfaceError),
    DuplicateInterface(&'static str),
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "descriptor is not valid toml: {message}"),
            Self::EmptyName => write!(f, "plugin name must not be empty"),
            Self::InvalidName(value) => write!(f, "plugin name is invalid: {value}"),
            Self::EmptyVersion => write!(f, "plugin version must not be empty"),
            Self::InvalidVersion(value) => write!(
                f,
                "plugin version is invalid: {value} (expected `dev` or major.minor.patch)"
            ),
            Self::Interface(err) => write!(f, "{err}"),
            Self::DuplicateInterface(value) => {
                write!(f, "interface is declared more than once: {value}")
            }
        }
    }
}

impl Error for DescriptorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Interface(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DescriptorError, HotReload, PluginDescriptor};
    use crate::extension::interface::{HostInterface, HostInterfaceError};

    fn valid_descriptor() -> PluginDescriptor {
        PluginDescriptor {
            name: "example.native.plugin".to_string(),
            description: "Example of a native plugin extension.".to_string(),
            author: "Example Corp".to_string(),
            hot_reload: HotReload::Disabled,
            version: "dev".to_string(),
            dependencies: vec!["app".to_string(), "logging".to_string()],
            provides: vec![],
        }
    }

    #[test]
    fn validates_baseline_descriptor() {
        assert!(valid_descriptor().validate().is_ok());
    }

    #[test]
    fn accepts_semver_triplet_version() {
        let mut descriptor = valid_descriptor();
        descriptor.version = "1.2.3".to_string();
        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.extension_id(), "example.native.plugin-1.2.3");
    }

    #[test]
    fn rejects_invalid_name() {
        let mut descriptor = valid_descriptor();
        descriptor.name = "Example Plugin".to_string();
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::InvalidName(_))
        ));

        descriptor.name = "example..plugin".to_string();
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::InvalidName(_))
        ));

        descriptor.name = "   ".to_string();
        assert_eq!(descriptor.validate(), Err(DescriptorError::EmptyName));
    }

    #[test]
    fn rejects_invalid_version() {
        let mut descriptor = valid_descriptor();
        descriptor.version = "v1".to_string();
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::InvalidVersion(_))
        ));
    }

    #[test]
    fn rejects_unknown_and_duplicate_dependencies() {
        let mut descriptor = valid_descriptor();
        descriptor.dependencies.push("renderer".to_string());
        assert_eq!(
            descriptor.validate(),
            Err(DescriptorError::Interface(
                HostInterfaceError::UnsupportedInterface("renderer".to_string())
            ))
        );

        let mut descriptor = valid_descriptor();
        descriptor.dependencies.push("app".to_string());
        assert_eq!(
            descriptor.validate(),
            Err(DescriptorError::DuplicateInterface("app"))
        );
    }

    #[test]
    fn parses_toml_declaration() {
        let raw = r#"
            [package]
            name = "example.bound.plugin"
            description = "An example C++ extension."
            author = "Example Corp"
            version = "dev"
            hot_reload = true

            [dependencies]
            interfaces = ["logging"]

            [exports]
            interfaces = ["bound_registry"]
        "#;
        let descriptor = PluginDescriptor::from_toml_str(raw).expect("descriptor parse");
        assert_eq!(descriptor.name, "example.bound.plugin");
        assert_eq!(descriptor.hot_reload, HotReload::Enabled);
        assert_eq!(
            descriptor.provided_interfaces().expect("exports"),
            vec![HostInterface::BoundRegistry]
        );
        assert_eq!(
            descriptor.dependency_interfaces().expect("dependencies"),
            vec![HostInterface::Logging]
        );
    }

    #[test]
    fn toml_defaults_to_dev_version_without_hot_reload() {
        let raw = "[package]\nname = \"minimal\"\n";
        let descriptor = PluginDescriptor::from_toml_str(raw).expect("descriptor parse");
        assert_eq!(descriptor.version, "dev");
        assert_eq!(descriptor.hot_reload, HotReload::Disabled);
        assert!(descriptor.dependencies.is_empty());
    }

    #[test]
    fn toml_without_package_is_a_parse_error() {
        let err = PluginDescriptor::from_toml_str("[exports]\ninterfaces = []\n")
            .expect_err("missing package must fail");
        assert!(matches!(err, DescriptorError::Parse(_)));
    }
}
