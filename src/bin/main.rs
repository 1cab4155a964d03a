//! Strata CLI - Validate and resolve entity models
//!
//! Usage:
//!   strata validate <model.json>
//!   strata list <model.json>
//!   strata resolve <model.json> [--entity <id>]
//!
//! Examples:
//!   strata validate demos/hr.json
//!   strata resolve demos/hr.json --entity Employee
//!   strata --config strata.toml list demos/hr.json

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use strata::cache::short_hash;
use strata::config::Settings;
use strata::model::loader::load_model;
use strata::model::{EntityDefinition, Model, RelationDefinition, SelfRelation};
use strata::semantic::{EntityView, ModelResult, Registry, Schema};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata - Resolve entity models with inheritance into flattened entities")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./strata.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report every validation problem in a model
    Validate {
        /// Path to the model .json file
        file: PathBuf,
    },

    /// List entities with their base and fragment counts
    List {
        /// Path to the model .json file
        file: PathBuf,
    },

    /// Print complete entities and their relations as JSON
    Resolve {
        /// Path to the model .json file
        file: PathBuf,

        /// Only resolve this entity
        #[arg(short, long)]
        entity: Option<String>,
    },
}

/// One resolved entity as printed by `resolve`.
#[derive(Serialize)]
struct ResolvedEntity<'a> {
    namespace: Option<&'a str>,
    complete: EntityDefinition,
    relations: Vec<&'a RelationDefinition>,
    self_relations: Vec<&'a SelfRelation>,
    has_single_pk: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Settings error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match cli.command {
        Commands::Validate { file } => cmd_validate(&file, &settings),
        Commands::List { file } => cmd_list(&file, &settings),
        Commands::Resolve { file, entity } => cmd_resolve(&file, entity.as_deref(), &settings),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, strata::config::SettingsError> {
    match path {
        Some(path) => Settings::load(path),
        None => Settings::discover("."),
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_model(file: &Path) -> Option<Model> {
    match load_model(file) {
        Ok(model) => Some(model),
        Err(e) => {
            eprintln!("Error loading '{}': {}", file.display(), e);
            None
        }
    }
}

fn build_schema(file: &Path, settings: &Settings) -> Option<Schema> {
    let model = read_model(file)?;
    match model.build(settings) {
        Ok(schema) => {
            debug!(hash = %short_hash(schema.content_hash()), "schema ready");
            Some(schema)
        }
        Err(e) => {
            eprintln!("Invalid model: {}", e);
            None
        }
    }
}

fn cmd_validate(file: &Path, settings: &Settings) -> ExitCode {
    let Some(model) = read_model(file) else {
        return ExitCode::FAILURE;
    };

    if let Err(errors) = model.validate() {
        eprintln!("{} problem(s) in {}:", errors.len(), file.display());
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return ExitCode::FAILURE;
    }

    match model.build(settings) {
        Ok(schema) => {
            println!(
                "✓ {} is valid ({} entities, hash {})",
                file.display(),
                schema.entities().count(),
                short_hash(schema.content_hash())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid model: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_list(file: &Path, settings: &Settings) -> ExitCode {
    let Some(schema) = build_schema(file, settings) else {
        return ExitCode::FAILURE;
    };

    println!("File: {}", file.display());
    if let Some(ns) = schema.namespace() {
        println!("Namespace: {}", ns);
    }
    println!();

    if schema.entities().next().is_none() {
        println!("No entities defined.");
        return ExitCode::SUCCESS;
    }

    println!("Entities:");
    for entity in schema.entities() {
        let fragments = match schema.view(&entity.id).and_then(|v| v.source_fragments()) {
            Ok(fragments) => fragments.len(),
            Err(e) => {
                eprintln!("Error resolving '{}': {}", entity.id, e);
                return ExitCode::FAILURE;
            }
        };
        let base = entity
            .base
            .as_deref()
            .map(|b| format!(" : {}", b))
            .unwrap_or_default();
        let disabled = if entity.disabled { " (disabled)" } else { "" };
        println!(
            "  - {}{} [{} properties, {} fragments]{}",
            entity.id,
            base,
            entity.properties().len(),
            fragments,
            disabled
        );
    }

    ExitCode::SUCCESS
}

fn cmd_resolve(file: &Path, entity: Option<&str>, settings: &Settings) -> ExitCode {
    let Some(schema) = build_schema(file, settings) else {
        return ExitCode::FAILURE;
    };

    let ids: Vec<String> = match entity {
        Some(id) => vec![id.to_string()],
        None => schema.active_entities().map(|e| e.id.clone()).collect(),
    };

    let mut resolved = Vec::with_capacity(ids.len());
    for id in &ids {
        match schema.view(id).and_then(|view| resolve_entity(&view)) {
            Ok(entity) => resolved.push(entity),
            Err(e) => {
                eprintln!("Resolution error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    match serde_json::to_string_pretty(&resolved) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_entity<'a>(view: &EntityView<'a>) -> ModelResult<ResolvedEntity<'a>> {
    Ok(ResolvedEntity {
        namespace: view.namespace(),
        complete: view.complete()?,
        relations: view.relations(false)?,
        self_relations: view.self_relations(false)?,
        has_single_pk: view.has_single_pk()?,
    })
}
