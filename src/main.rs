//! hookweave: resolves a declarative plugin set and traces its hooks.
//!
//! Reads plugin manifests from the engine configuration, resolves their
//! activation order, wires one tracing middleware per plugin into every
//! hook it names, and prints the resulting order and per-hook call path
//! as JSON.

use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, fmt};

use hookweave_core::config::EngineConfig;
use hookweave_core::error::HookError;
use hookweave_pipeline::{DispatchLimits, Strategy, from_fn};
use hookweave_plugin::{HookComposer, PluginDescriptor, PluginMeta};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    match run(config).await {
        Ok(report) => println!("{report:#}"),
        Err(e) => {
            tracing::error!(kind = %e.kind(), "{}", e);
            std::process::exit(1);
        }
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<EngineConfig, HookError> {
    let config_path =
        std::env::var("HOOKWEAVE_CONFIG").unwrap_or_else(|_| "hookweave.toml".to_string());
    EngineConfig::load(config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &EngineConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Builds a composer from the configured manifests.
///
/// Every hook named by any manifest becomes a sequential pipeline. Each
/// plugin contributes one middleware that appends its name to the value
/// flowing through, so running a hook yields its execution path.
fn build_composer(config: &EngineConfig) -> Result<HookComposer<Value>, HookError> {
    let mut composer =
        HookComposer::new().with_limits(DispatchLimits::from_config(&config.dispatch));

    for manifest in &config.plugins {
        let mut descriptor = PluginDescriptor::new(PluginMeta::from(manifest.clone()));
        for hook in &manifest.hooks {
            composer.define_hook(hook.as_str(), Strategy::Sequential);
            descriptor = descriptor.with_hook(hook.as_str(), trace_middleware(&manifest.name));
        }
        composer.add_plugin(descriptor)?;
    }

    Ok(composer)
}

fn trace_middleware(plugin: &str) -> hookweave_pipeline::SharedMiddleware<Value> {
    let plugin = plugin.to_string();
    from_fn(move |args: &[Value]| {
        let mut path = args.first().cloned().unwrap_or_else(|| json!([]));
        if let Value::Array(entries) = &mut path {
            entries.push(Value::String(plugin.clone()));
        }
        Some(path)
    })
}

/// Resolves the plugin set and traces every hook.
async fn run(config: EngineConfig) -> Result<Value, HookError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        plugins = config.plugins.len(),
        "Starting hookweave"
    );

    let mut composer = build_composer(&config)?;
    let order = composer.apply()?;

    let mut hooks = serde_json::Map::new();
    for hook in composer.hook_names() {
        let path = composer.call(hook, json!([])).await?.value();
        hooks.insert(hook.to_string(), path.unwrap_or(Value::Null));
    }

    Ok(json!({ "order": order, "hooks": hooks }))
}
