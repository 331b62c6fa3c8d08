//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::cli::RunArgs;
use crate::error::Result;
use crate::store::feature::AttributeFilter;
use crate::store::json::read_feature_class;
use crate::store::{FeatureStore, Workspace};
use crate::workflow::{self, ArchiveMode, IdentifierStrategy, UpdateParams};

/// Workspace layer names used by the run command.
const NEW_DATA: &str = "new_data";
const ARCHIVE: &str = "archive";
const UBB: &str = "ubb";
const SGID: &str = "sgid";

/// Run the full update workflow across both destination layers.
pub fn run(args: &RunArgs) -> Result<()> {
    info!("Starting update run for round {}", args.round);

    let mut workspace = Workspace::new();
    workspace.load_layer(NEW_DATA, &args.new_data)?;
    workspace.load_layer(ARCHIVE, &args.archive)?;
    workspace.load_layer(UBB, &args.ubb)?;
    workspace.load_layer(SGID, &args.sgid)?;

    let mut params = UpdateParams::new(NEW_DATA, [UBB, SGID], ARCHIVE, &args.round);
    params.provider = args.provider.clone();
    params.provider_field = args.provider_field.clone();
    params.max_tier = args.max_tier.clone();
    params.archive_mode = match args.archive_mode.as_str() {
        "per-destination" => ArchiveMode::PerDestination,
        _ => ArchiveMode::Once,
    };
    if args.random_ids {
        params.identifier_strategy = IdentifierStrategy::Random;
    }

    let report = workflow::run(&mut workspace, &params)?;

    // All layer mutations happened in memory; only now touch the files
    workspace.save_layer(NEW_DATA, &args.new_data)?;
    workspace.save_layer(ARCHIVE, &args.archive)?;
    workspace.save_layer(UBB, &args.ubb)?;
    workspace.save_layer(SGID, &args.sgid)?;

    println!("=== Update complete ===");
    println!("Provider: {}", report.provider);
    println!("Round: {}", report.round);
    println!("Identifiers assigned: {}", report.identifiers_assigned);
    for counts in &report.layers {
        println!(
            "{}: {} archived, {} deleted, {} appended",
            counts.layer, counts.archived, counts.deleted, counts.appended
        );
    }
    println!("Total archived: {}", report.archived_total());

    Ok(())
}

/// Assign identifiers to a standalone dataset file.
pub fn assign_ids(dataset: &Path, random: bool) -> Result<()> {
    let mut workspace = Workspace::new();
    workspace.load_layer(NEW_DATA, dataset)?;

    let strategy = if random {
        IdentifierStrategy::Random
    } else {
        IdentifierStrategy::Deterministic
    };

    let added = workflow::identifiers::ensure_identifier_field(&mut workspace, NEW_DATA)?;
    if added {
        println!("Added Identifier field to {}", dataset.display());
    }
    let updated = workflow::identifiers::assign_identifiers(&mut workspace, NEW_DATA, strategy)?;

    workspace.save_layer(NEW_DATA, dataset)?;

    println!(
        "Identifier added for {} records in {}",
        updated,
        dataset.display()
    );

    Ok(())
}

/// Print a layer's schema and row counts.
pub fn show(layer: &Path, provider: Option<&str>) -> Result<()> {
    let class = read_feature_class(layer)?;

    println!("Layer: {}", layer.display());
    println!("Rows: {}", class.features.len());
    if class.locked {
        println!("Layer is locked");
    }
    println!("Fields:");
    for field in &class.fields {
        match field.length {
            Some(length) => println!("  {} ({:?}, {})", field.name, field.field_type, length),
            None => println!("  {} ({:?})", field.name, field.field_type),
        }
    }

    if let Some(provider) = provider {
        let mut workspace = Workspace::new();
        workspace.add_layer("layer", class);
        let filter = AttributeFilter::equals("ProviderName", provider);
        let count = workspace.count("layer", Some(&filter))?;
        println!("Rows for {}: {}", provider, count);
    }

    Ok(())
}
