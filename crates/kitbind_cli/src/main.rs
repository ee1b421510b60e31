//! Host smoke harness.
//!
//! # Responsibility
//! - Load the two sample extensions into an in-process host.
//! - Pump synthetic update ticks and exercise the bound registry.
//! - Print a short deterministic report.

use anyhow::{Context, Result};
use clap::Parser;
use kitbind_core::{
    init_logging, BoundInterfaceExtension, ExampleBoundObject, ExtensionHost, HostConfig,
    HostContext, NamedRegistry, ObjectRegistry, PluginDescriptor, UpdateCounterExtension,
    UpdateDispatcher,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "kitbind", version, about = "Run the sample extensions in an in-process host")]
struct Cli {
    /// Harness config file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Descriptor file for the bound interface extension.
    #[arg(long)]
    descriptor: Option<PathBuf>,

    /// Update ticks to pump; overrides the config.
    #[arg(long)]
    updates: Option<u64>,

    /// Absolute log directory; overrides config and environment.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level; overrides the config.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, &log_dir.to_string_lossy())
            .context("failed to initialize logging")?;
    }

    let bound_descriptor = match &cli.descriptor {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read descriptor {}", path.display()))?;
            PluginDescriptor::from_toml_str(&raw)?
        }
        None => BoundInterfaceExtension::<ExampleBoundObject>::default_descriptor(),
    };

    let dispatcher = Arc::new(UpdateDispatcher::new());
    let registry = Arc::new(ObjectRegistry::<ExampleBoundObject>::new());
    let counter_extension = UpdateCounterExtension::default();
    let counter = counter_extension.counter();

    let mut host = ExtensionHost::new(HostContext::new(dispatcher.clone()));
    host.register(Box::new(BoundInterfaceExtension::with_shared_registry(
        bound_descriptor,
        registry.clone(),
    )))?;
    host.register(Box::new(counter_extension))?;
    host.startup_all()?;

    for _ in 0..config.update_ticks {
        dispatcher.dispatch(config.tick_seconds);
    }

    let object = Arc::new(ExampleBoundObject::new("example_bound_object"));
    object.set_property_int(9);
    registry.register(object.clone());
    let found = registry
        .find("example_bound_object")
        .map(|found| found.snapshot());
    registry.deregister(&object);

    host.shutdown_all()?;
    info!(
        "event=harness_done module=cli status=ok updates={} reports={}",
        counter.count(),
        counter.reports()
    );

    println!("kitbind_core version={}", kitbind_core::core_version());
    println!("updates={} progress_reports={}", counter.count(), counter.reports());
    match found {
        Some(snapshot) => println!(
            "found id={} property_int={}",
            snapshot.id, snapshot.property_int
        ),
        None => println!("found none"),
    }
    println!(
        "after_deregister={}",
        registry.find("example_bound_object").is_some()
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<HostConfig> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    }
    .with_env_overrides();

    if let Some(updates) = cli.updates {
        config.update_ticks = updates;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli};
    use clap::Parser;

    #[test]
    fn rejects_unsupported_level_without_log_dir() {
        let cli = Cli::try_parse_from(["kitbind", "--log-level", "verbose"]).expect("cli parse");
        let err = resolve_config(&cli).expect_err("unsupported level must fail");
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::try_parse_from(["kitbind", "--updates", "7", "--log-level", "WARN"])
            .expect("cli parse");
        let config = resolve_config(&cli).expect("valid config");
        assert_eq!(config.update_ticks, 7);
        assert_eq!(config.log_level, "WARN");
    }
}
