//! Provider validation and feature replacement.
//!
//! Replacement is delete-then-append: the provider's rows are removed from
//! the current layer and the whole new dataset is appended in their place.
//! The new dataset must therefore contain all of the provider's features,
//! unchanged ones included.

use log::info;

use crate::error::{Result, UpdateError};
use crate::store::feature::{AttrValue, AttributeFilter};
use crate::store::FeatureStore;

/// Determine and validate the provider being updated.
///
/// When `supplied` is None the provider name is read from the first row of
/// the new dataset's provider field. Either way the name must already exist
/// in `current_layer`; a brand-new provider is an operator mistake (the
/// layers are seeded out of band).
pub fn resolve_provider(
    store: &dyn FeatureStore,
    new_dataset: &str,
    current_layer: &str,
    provider_field: &str,
    supplied: Option<&str>,
) -> Result<String> {
    info!("Checking if provider is valid...");

    let provider = match supplied {
        Some(name) => name.to_string(),
        None => {
            let values = store.field_values(new_dataset, provider_field)?;
            match values.first().and_then(AttrValue::as_text) {
                Some(name) => name.to_string(),
                None => {
                    return Err(UpdateError::EmptyDataset {
                        layer: new_dataset.to_string(),
                    })
                }
            }
        }
    };

    let known = store
        .field_values(current_layer, provider_field)?
        .iter()
        .any(|v| v.as_text() == Some(provider.as_str()));
    if !known {
        return Err(UpdateError::ProviderNotFound {
            provider,
            layer: current_layer.to_string(),
        });
    }

    info!("Updating data for provider {}", provider);
    Ok(provider)
}

/// Replace `provider`'s rows in `current_layer` with the contents of
/// `new_dataset`. Returns (rows deleted, rows appended).
pub fn replace_features(
    store: &mut dyn FeatureStore,
    provider: &str,
    provider_field: &str,
    new_dataset: &str,
    current_layer: &str,
) -> Result<(usize, usize)> {
    info!("Updating {}", current_layer);

    let filter = AttributeFilter::equals(provider_field, provider);
    let selection = store.select_by_attribute(current_layer, &filter)?;
    let deleted = store.delete_rows(current_layer, &selection)?;
    info!("{} records deleted from {}", deleted, current_layer);

    let appended = store.append_rows(new_dataset, current_layer)?;
    info!(
        "{} records copied from {} to {}",
        appended, new_dataset, current_layer
    );

    Ok((deleted, appended))
}
