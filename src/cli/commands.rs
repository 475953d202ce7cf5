//! CLI command dispatch.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use crate::config::EngineConfig;
use crate::decl::SpecRegistry;
use crate::model::ModelType;
use crate::observability::{logger, Severity};

/// Parses arguments and runs the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Compile { models, config } => compile(&models, config.as_deref()),
        Command::Check {
            models,
            model,
            document,
            config,
            interpreted,
        } => check(&models, &model, &document, config.as_deref(), interpreted),
        Command::Schema { models, model } => schema(&models, &model),
    }
}

fn load_registry(models: &Path) -> CliResult<Arc<SpecRegistry>> {
    let registry = SpecRegistry::new();
    registry.load_dir(models)?;
    registry.finalize()?;
    Ok(Arc::new(registry))
}

fn load_config(path: Option<&Path>, interpreted: bool) -> CliResult<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if interpreted {
        config.fast_path = false;
    }
    Ok(config)
}

fn compile(models: &Path, config: Option<&Path>) -> CliResult<()> {
    load_config(config, false)?;
    let registry = load_registry(models)?;
    for name in registry.model_names() {
        let fast = registry
            .get(&name)
            .map(|s| s.is_fast_path_capable())
            .unwrap_or(false);
        println!("{} (fast_path: {})", name, fast);
    }
    Ok(())
}

fn check(
    models: &Path,
    model: &str,
    document: &Path,
    config: Option<&Path>,
    interpreted: bool,
) -> CliResult<()> {
    let config = load_config(config, interpreted)?;
    let registry = load_registry(models)?;
    let model_type = ModelType::bind(registry, model, config)?;

    let text = fs::read_to_string(document)
        .map_err(|e| CliError::io(document.display().to_string(), e))?;

    match model_type.parse_raw(&text) {
        Ok(instance) => {
            match instance.to_json_pretty() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    logger::emit_stderr(
                        Severity::Error,
                        "serialize_failed",
                        &[("error", e.to_string().as_str())],
                    );
                }
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{}", failure.to_value());
            Err(CliError::ValidationFailed {
                model: model.to_string(),
                count: failure.error_count(),
            })
        }
    }
}

fn schema(models: &Path, model: &str) -> CliResult<()> {
    let registry = load_registry(models)?;
    let model_type = ModelType::bind(registry, model, EngineConfig::default())?;
    let value = model_type.schema().to_value();
    println!("{:#}", value);
    Ok(())
}
