//! Identifier assignment for new datasets.
//!
//! Every feature gets an `Identifier` rendered as a braced upper-case GUID,
//! e.g. `{B2E6B1A0-6B1F-4E46-9C33-0E4B1C2D3E4F}`. The deterministic strategy
//! derives the GUID from the feature's stable attributes and geometry so the
//! same physical service area keeps the same identifier across rounds; the
//! random strategy matches the legacy uuid4 behavior.

use std::collections::HashSet;

use log::info;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Result, UpdateError};
use crate::store::feature::{AttrValue, Feature};
use crate::store::{ensure_field, fields, FeatureStore, FieldDef};

/// Length of the Identifier text field, sized for a braced GUID.
const IDENTIFIER_FIELD_LENGTH: u32 = 50;

/// Attributes excluded from the deterministic digest: the identifier itself
/// and the archive stamps, which change per round.
const VOLATILE_FIELDS: [&str; 3] = [
    fields::IDENTIFIER,
    fields::DATA_ROUND,
    fields::MAX_DOWNLOAD_TIER,
];

/// How identifiers are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierStrategy {
    /// Digest of stable attributes + geometry; stable across rounds.
    #[default]
    Deterministic,
    /// Fresh UUIDv4 per feature (legacy behavior).
    Random,
}

/// Make sure the new dataset carries an `Identifier` text field.
/// Returns true if the field had to be added.
pub fn ensure_identifier_field(store: &mut dyn FeatureStore, dataset: &str) -> Result<bool> {
    let added = ensure_field(
        store,
        dataset,
        FieldDef::text(fields::IDENTIFIER, IDENTIFIER_FIELD_LENGTH),
    )?;
    if added {
        info!("Added '{}' field to {}", fields::IDENTIFIER, dataset);
    }
    Ok(added)
}

/// Assign an identifier to every feature in `dataset`.
///
/// Errors with `DUPLICATE_IDENTIFIER` if two features produce the same
/// identifier: with the deterministic strategy that means two rows carry
/// identical attributes and geometry, which the operator must resolve.
pub fn assign_identifiers(
    store: &mut dyn FeatureStore,
    dataset: &str,
    strategy: IdentifierStrategy,
) -> Result<usize> {
    let updated = store.calculate_field(
        dataset,
        fields::IDENTIFIER,
        &mut |feature| {
            let id = match strategy {
                IdentifierStrategy::Deterministic => deterministic_identifier(feature)?,
                IdentifierStrategy::Random => braced(Uuid::new_v4()),
            };
            Ok(AttrValue::Text(id))
        },
    )?;

    let mut seen = HashSet::new();
    for value in store.field_values(dataset, fields::IDENTIFIER)? {
        if let AttrValue::Text(id) = value {
            if !seen.insert(id.clone()) {
                return Err(UpdateError::DuplicateIdentifier {
                    identifier: id,
                    layer: dataset.to_string(),
                });
            }
        }
    }

    info!("Identifier added for {} records in {}", updated, dataset);
    Ok(updated)
}

/// Derive a stable identifier from the feature's non-volatile attributes and
/// its geometry.
fn deterministic_identifier(feature: &Feature) -> Result<String> {
    let mut hasher = Sha256::new();

    for (field, value) in &feature.attributes {
        if VOLATILE_FIELDS.contains(&field.as_str()) {
            continue;
        }
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(value)?);
        hasher.update([0u8]);
    }
    if let Some(geometry) = &feature.geometry {
        hasher.update(serde_json::to_vec(geometry)?);
    }

    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Ok(braced(Uuid::from_bytes(bytes)))
}

fn braced(uuid: Uuid) -> String {
    format!("{{{}}}", uuid.to_string().to_uppercase())
}
