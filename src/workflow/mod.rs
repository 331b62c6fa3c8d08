//! The provider dataset update workflow.
//!
//! A single forward pass per invocation: validate the provider, assign
//! identifiers to the new dataset, archive the provider's current features,
//! then replace them in each destination layer in turn. Not resumable and
//! not idempotent; a failed run is inspected and re-run by the operator.

pub mod archive;
pub mod identifiers;
pub mod replace;

pub use identifiers::IdentifierStrategy;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::store::{fields, FeatureStore};

/// Whether superseded features are archived once (from the first destination,
/// before any replacement) or once per destination.
///
/// The per-destination mode archives each destination's own copy of the
/// provider's rows, so near-duplicate archive entries are expected when the
/// destinations were in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveMode {
    #[default]
    Once,
    PerDestination,
}

/// Inputs for one update run.
#[derive(Debug, Clone)]
pub struct UpdateParams {
    /// Provider being updated; read from the new dataset when None.
    pub provider: Option<String>,
    /// Field holding the provider name.
    pub provider_field: String,
    /// Layer name of the operator-prepared replacement dataset.
    pub new_dataset: String,
    /// Destination layers, in update order. The first is the archive source.
    pub current_layers: [String; 2],
    /// Layer receiving superseded features.
    pub archive_layer: String,
    /// Round label stamped on archived rows.
    pub round: String,
    /// Tier stamped on archived rows; derived per row from `MaxDown` when None.
    pub max_tier: Option<String>,
    pub archive_mode: ArchiveMode,
    pub identifier_strategy: IdentifierStrategy,
}

impl UpdateParams {
    /// Params with the defaults: provider read from the dataset, standard
    /// provider field, archive once, deterministic identifiers.
    pub fn new(new_dataset: &str, current_layers: [&str; 2], archive_layer: &str, round: &str) -> Self {
        Self {
            provider: None,
            provider_field: fields::PROVIDER_NAME.to_string(),
            new_dataset: new_dataset.to_string(),
            current_layers: current_layers.map(str::to_string),
            archive_layer: archive_layer.to_string(),
            round: round.to_string(),
            max_tier: None,
            archive_mode: ArchiveMode::default(),
            identifier_strategy: IdentifierStrategy::default(),
        }
    }
}

/// Per-destination row counts for the report.
#[derive(Debug, Clone, Serialize)]
pub struct LayerCounts {
    pub layer: String,
    pub archived: usize,
    pub deleted: usize,
    pub appended: usize,
}

/// What one run did, for the operator's records.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub provider: String,
    pub round: String,
    pub started_at: DateTime<Utc>,
    pub identifiers_assigned: usize,
    pub layers: Vec<LayerCounts>,
}

impl UpdateReport {
    /// Total rows archived across destinations.
    pub fn archived_total(&self) -> usize {
        self.layers.iter().map(|l| l.archived).sum()
    }
}

/// Run the full update workflow against `store`.
pub fn run(store: &mut dyn FeatureStore, params: &UpdateParams) -> Result<UpdateReport> {
    let started_at = Utc::now();

    let provider = replace::resolve_provider(
        store,
        &params.new_dataset,
        &params.current_layers[0],
        &params.provider_field,
        params.provider.as_deref(),
    )?;

    info!("Checking identifier field...");
    identifiers::ensure_identifier_field(store, &params.new_dataset)?;
    let identifiers_assigned =
        identifiers::assign_identifiers(store, &params.new_dataset, params.identifier_strategy)?;

    let mut layers = Vec::with_capacity(params.current_layers.len());
    for (i, layer) in params.current_layers.iter().enumerate() {
        let archive_here = i == 0 || params.archive_mode == ArchiveMode::PerDestination;
        let archived = if archive_here {
            archive::archive_provider(
                store,
                &provider,
                &params.provider_field,
                layer,
                &params.archive_layer,
                &params.round,
                params.max_tier.as_deref(),
            )?
        } else {
            0
        };

        let (deleted, appended) = replace::replace_features(
            store,
            &provider,
            &params.provider_field,
            &params.new_dataset,
            layer,
        )?;

        layers.push(LayerCounts {
            layer: layer.clone(),
            archived,
            deleted,
            appended,
        });
    }

    info!("Finished updating {}", provider);
    Ok(UpdateReport {
        provider,
        round: params.round.clone(),
        started_at,
        identifiers_assigned,
        layers,
    })
}
