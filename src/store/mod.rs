//! Feature storage capability.
//!
//! The desktop GIS backend is modeled as the [`FeatureStore`] trait: a
//! tabular feature-storage service addressed by
//! layer name, exposing the handful of operations the update workflow needs
//! (list/add field, calculate field, select, delete, append, copy).
//!
//! [`Workspace`] is the concrete implementation used by the CLI and tests,
//! with a JSON file format handled in [`json`].

pub mod feature;
pub mod json;
pub mod workspace;

pub use feature::{AttrValue, AttributeFilter, Feature, Selection};
pub use workspace::{FeatureClass, Workspace};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Well-known field names used by the workflow.
pub mod fields {
    /// Stable per-service-area identifier, unique across rounds.
    pub const IDENTIFIER: &str = "Identifier";
    /// Default provider-name field; overridable per run.
    pub const PROVIDER_NAME: &str = "ProviderName";
    /// Update round label stamped on archived rows.
    pub const DATA_ROUND: &str = "DataRound";
    /// Max advertised download tier stamped on archived rows.
    /// Exists only on the archive layer, not the current layers.
    pub const MAX_DOWNLOAD_TIER: &str = "MaxDownloadTier";
    /// Max advertised download rate in Mb/s.
    pub const MAX_DOWN: &str = "MaxDown";
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Double,
    Date,
}

/// A field definition in a layer's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Maximum length for text fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

impl FieldDef {
    pub fn text(name: &str, length: u32) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Text,
            length: Some(length),
        }
    }

    pub fn double(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Double,
            length: None,
        }
    }
}

/// Fallible per-row expression used by [`FeatureStore::calculate_field`].
pub type FieldExpr<'a> = dyn FnMut(&Feature) -> Result<AttrValue> + 'a;

/// Tabular feature-storage service, addressed by layer name.
///
/// This is the seam between the workflow and whatever actually holds the
/// features; all workflow logic goes through it.
pub trait FeatureStore {
    /// Schema of `layer`.
    fn list_fields(&self, layer: &str) -> Result<Vec<FieldDef>>;

    /// Add a field to `layer`. Errors if the field already exists or the
    /// layer is locked; use [`ensure_field`] for the idempotent form.
    fn add_field(&mut self, layer: &str, field: FieldDef) -> Result<()>;

    /// Apply `expr` to every row of `layer`, storing the result in `field`.
    /// Returns the number of rows updated.
    fn calculate_field(&mut self, layer: &str, field: &str, expr: &mut FieldExpr<'_>)
        -> Result<usize>;

    /// Select rows of `layer` matching `filter`.
    fn select_by_attribute(&self, layer: &str, filter: &AttributeFilter) -> Result<Selection>;

    /// Delete the selected rows. Returns the number of rows deleted.
    fn delete_rows(&mut self, layer: &str, selection: &Selection) -> Result<usize>;

    /// Copy every row of `source` into `target`, keeping only the attributes
    /// present in the target schema. Returns the number of rows appended.
    fn append_rows(&mut self, source: &str, target: &str) -> Result<usize>;

    /// Copy the selected rows of `source` into `target`, keeping only the
    /// attributes present in the target schema and stamping each copy with
    /// the given extra values. Returns the number of rows copied.
    fn copy_rows(
        &mut self,
        source: &str,
        selection: &Selection,
        target: &str,
        stamps: &[(String, AttrValue)],
    ) -> Result<usize>;

    /// The selected rows of `layer`, cloned out in row order.
    fn rows(&self, layer: &str, selection: &Selection) -> Result<Vec<Feature>>;

    /// All values of `field` in `layer`, in row order.
    fn field_values(&self, layer: &str, field: &str) -> Result<Vec<AttrValue>>;

    /// Number of rows in `layer`, optionally restricted to a filter.
    fn count(&self, layer: &str, filter: Option<&AttributeFilter>) -> Result<usize>;
}

/// Idempotent ensure-field-exists: checks the schema explicitly and adds the
/// field only when absent. Returns true if the field was added.
pub fn ensure_field(store: &mut dyn FeatureStore, layer: &str, field: FieldDef) -> Result<bool> {
    let exists = store
        .list_fields(layer)?
        .iter()
        .any(|f| f.name == field.name);
    if exists {
        return Ok(false);
    }
    store.add_field(layer, field)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_field_is_idempotent() {
        let mut workspace = Workspace::new();
        workspace.create_layer("new_data", vec![FieldDef::text("ProviderName", 100)]);

        assert!(ensure_field(&mut workspace, "new_data", FieldDef::text("Identifier", 50)).unwrap());
        // Second call is a no-op, not an error
        assert!(!ensure_field(&mut workspace, "new_data", FieldDef::text("Identifier", 50)).unwrap());

        let names: Vec<String> = workspace
            .list_fields("new_data")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["ProviderName", "Identifier"]);
    }
}
