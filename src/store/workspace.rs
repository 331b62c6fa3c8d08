//! In-memory feature storage.
//!
//! A [`Workspace`] holds named feature classes and implements the
//! [`FeatureStore`] capability over them. The CLI loads layer files into a
//! workspace, runs the workflow, and flushes the workspace back to disk.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UpdateError};
use crate::store::feature::{AttrValue, AttributeFilter, Feature, Selection};
use crate::store::{FeatureStore, FieldDef, FieldExpr};

/// A feature class: schema plus rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureClass {
    /// Ordered field definitions.
    pub fields: Vec<FieldDef>,

    /// Feature rows.
    #[serde(default)]
    pub features: Vec<Feature>,

    /// Next object id to assign.
    #[serde(default = "default_next_oid")]
    pub next_oid: u64,

    /// A locked layer rejects all schema and row mutation.
    #[serde(default)]
    pub locked: bool,
}

fn default_next_oid() -> u64 {
    1
}

impl FeatureClass {
    /// Create an empty feature class with the given schema.
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            features: Vec::new(),
            next_oid: 1,
            locked: false,
        }
    }

    /// Whether the schema contains `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field)
    }

    /// Insert a row, assigning the next object id. Attributes not present in
    /// the schema are kept as-is; the schema governs copies between layers,
    /// not direct inserts.
    pub fn insert(&mut self, feature: Feature) -> u64 {
        let oid = self.next_oid;
        self.next_oid += 1;
        let mut feature = feature;
        feature.oid = oid;
        self.features.push(feature);
        oid
    }

    /// Project `feature`'s attributes onto this schema: keeps only attribute
    /// values whose field exists here.
    fn project(&self, feature: &Feature) -> Feature {
        let mut projected = Feature::new(0);
        projected.geometry = feature.geometry.clone();
        for field in &self.fields {
            if let Some(value) = feature.attr(&field.name) {
                projected.set_attr(&field.name, value.clone());
            }
        }
        projected
    }
}

/// Named feature classes implementing the [`FeatureStore`] capability.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    layers: HashMap<String, FeatureClass>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty layer with the given schema.
    pub fn create_layer(&mut self, name: &str, fields: Vec<FieldDef>) {
        self.layers.insert(name.to_string(), FeatureClass::new(fields));
    }

    /// Register an existing feature class under `name`.
    pub fn add_layer(&mut self, name: &str, class: FeatureClass) {
        self.layers.insert(name.to_string(), class);
    }

    /// Insert a row into the layer named `name`, returning the assigned
    /// object id.
    pub fn insert_feature(&mut self, name: &str, feature: Feature) -> Result<u64> {
        Ok(self.layer_unlocked(name)?.insert(feature))
    }

    /// Remove and return the layer named `name`.
    pub fn take_layer(&mut self, name: &str) -> Result<FeatureClass> {
        self.layers
            .remove(name)
            .ok_or_else(|| UpdateError::LayerNotFound {
                layer: name.to_string(),
            })
    }

    /// Borrow the layer named `name`.
    pub fn layer(&self, name: &str) -> Result<&FeatureClass> {
        self.layers.get(name).ok_or_else(|| UpdateError::LayerNotFound {
            layer: name.to_string(),
        })
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut FeatureClass> {
        self.layers
            .get_mut(name)
            .ok_or_else(|| UpdateError::LayerNotFound {
                layer: name.to_string(),
            })
    }

    /// Borrow the layer for mutation, rejecting locked layers.
    fn layer_unlocked(&mut self, name: &str) -> Result<&mut FeatureClass> {
        let class = self.layer_mut(name)?;
        if class.locked {
            return Err(UpdateError::SchemaLocked {
                layer: name.to_string(),
            });
        }
        Ok(class)
    }

    fn require_field(&self, layer: &str, field: &str) -> Result<()> {
        if !self.layer(layer)?.has_field(field) {
            return Err(UpdateError::FieldNotFound {
                layer: layer.to_string(),
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

impl FeatureStore for Workspace {
    fn list_fields(&self, layer: &str) -> Result<Vec<FieldDef>> {
        Ok(self.layer(layer)?.fields.clone())
    }

    fn add_field(&mut self, layer: &str, field: FieldDef) -> Result<()> {
        if self.layer(layer)?.has_field(&field.name) {
            return Err(UpdateError::FieldExists {
                layer: layer.to_string(),
                field: field.name,
            });
        }
        debug!("Adding field '{}' to layer {}", field.name, layer);
        self.layer_unlocked(layer)?.fields.push(field);
        Ok(())
    }

    fn calculate_field(
        &mut self,
        layer: &str,
        field: &str,
        expr: &mut FieldExpr<'_>,
    ) -> Result<usize> {
        self.require_field(layer, field)?;
        let class = self.layer_unlocked(layer)?;

        let mut updated = 0;
        for i in 0..class.features.len() {
            let value = expr(&class.features[i])?;
            class.features[i].set_attr(field, value);
            updated += 1;
        }
        Ok(updated)
    }

    fn select_by_attribute(&self, layer: &str, filter: &AttributeFilter) -> Result<Selection> {
        self.require_field(layer, &filter.field)?;
        let oids = self
            .layer(layer)?
            .features
            .iter()
            .filter(|f| filter.matches(f))
            .map(|f| f.oid)
            .collect();
        Ok(Selection {
            layer: layer.to_string(),
            oids,
        })
    }

    fn delete_rows(&mut self, layer: &str, selection: &Selection) -> Result<usize> {
        let class = self.layer_unlocked(layer)?;

        let present: HashSet<u64> = class.features.iter().map(|f| f.oid).collect();
        if let Some(missing) = selection.oids.iter().find(|oid| !present.contains(oid)) {
            return Err(UpdateError::FeatureNotFound {
                layer: layer.to_string(),
                oid: *missing,
            });
        }

        let doomed: HashSet<u64> = selection.oids.iter().copied().collect();
        let before = class.features.len();
        class.features.retain(|f| !doomed.contains(&f.oid));
        Ok(before - class.features.len())
    }

    fn append_rows(&mut self, source: &str, target: &str) -> Result<usize> {
        let rows = self.layer(source)?.features.clone();
        let class = self.layer_unlocked(target)?;

        let mut appended = 0;
        for row in &rows {
            let projected = class.project(row);
            class.insert(projected);
            appended += 1;
        }
        debug!("Appended {} rows from {} to {}", appended, source, target);
        Ok(appended)
    }

    fn copy_rows(
        &mut self,
        source: &str,
        selection: &Selection,
        target: &str,
        stamps: &[(String, AttrValue)],
    ) -> Result<usize> {
        let wanted: HashSet<u64> = selection.oids.iter().copied().collect();
        let rows: Vec<Feature> = self
            .layer(source)?
            .features
            .iter()
            .filter(|f| wanted.contains(&f.oid))
            .cloned()
            .collect();
        let class = self.layer_unlocked(target)?;

        let mut copied = 0;
        for row in &rows {
            let mut projected = class.project(row);
            for (field, value) in stamps {
                projected.set_attr(field, value.clone());
            }
            class.insert(projected);
            copied += 1;
        }
        debug!("Copied {} rows from {} to {}", copied, source, target);
        Ok(copied)
    }

    fn rows(&self, layer: &str, selection: &Selection) -> Result<Vec<Feature>> {
        let wanted: HashSet<u64> = selection.oids.iter().copied().collect();
        Ok(self
            .layer(layer)?
            .features
            .iter()
            .filter(|f| wanted.contains(&f.oid))
            .cloned()
            .collect())
    }

    fn field_values(&self, layer: &str, field: &str) -> Result<Vec<AttrValue>> {
        self.require_field(layer, field)?;
        Ok(self
            .layer(layer)?
            .features
            .iter()
            .map(|f| f.attr(field).cloned().unwrap_or(AttrValue::Null))
            .collect())
    }

    fn count(&self, layer: &str, filter: Option<&AttributeFilter>) -> Result<usize> {
        let class = self.layer(layer)?;
        Ok(match filter {
            Some(filter) => class.features.iter().filter(|f| filter.matches(f)).count(),
            None => class.features.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fields;
    use pretty_assertions::assert_eq;

    fn provider_row(provider: &str, down: f64) -> Feature {
        let mut feature = Feature::new(0);
        feature.set_attr(fields::PROVIDER_NAME, AttrValue::from(provider));
        feature.set_attr(fields::MAX_DOWN, AttrValue::Number(down));
        feature
    }

    fn test_workspace() -> Workspace {
        let mut workspace = Workspace::new();
        workspace.create_layer(
            "current",
            vec![
                FieldDef::text(fields::PROVIDER_NAME, 100),
                FieldDef::double(fields::MAX_DOWN),
            ],
        );
        let class = workspace.layers.get_mut("current").unwrap();
        class.insert(provider_row("Acme", 100.0));
        class.insert(provider_row("Acme", 25.0));
        class.insert(provider_row("Zayo", 1000.0));
        workspace
    }

    #[test]
    fn test_select_delete_roundtrip() {
        let mut workspace = test_workspace();
        let filter = AttributeFilter::equals(fields::PROVIDER_NAME, "Acme");

        let selection = workspace.select_by_attribute("current", &filter).unwrap();
        assert_eq!(selection.len(), 2);

        let deleted = workspace.delete_rows("current", &selection).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(workspace.count("current", None).unwrap(), 1);
        assert_eq!(workspace.count("current", Some(&filter)).unwrap(), 0);
    }

    #[test]
    fn test_copy_rows_projects_and_stamps() {
        let mut workspace = test_workspace();
        workspace.create_layer(
            "archive",
            vec![
                FieldDef::text(fields::PROVIDER_NAME, 100),
                FieldDef::text(fields::DATA_ROUND, 20),
            ],
        );

        let filter = AttributeFilter::equals(fields::PROVIDER_NAME, "Acme");
        let selection = workspace.select_by_attribute("current", &filter).unwrap();
        let stamps = vec![(fields::DATA_ROUND.to_string(), AttrValue::from("2024Q1"))];
        let copied = workspace
            .copy_rows("current", &selection, "archive", &stamps)
            .unwrap();
        assert_eq!(copied, 2);

        let archived = workspace.layer("archive").unwrap();
        for feature in &archived.features {
            assert_eq!(feature.attr_text(fields::DATA_ROUND), Some("2024Q1"));
            // MaxDown is not in the archive schema and must not come along
            assert!(feature.attr(fields::MAX_DOWN).is_none());
        }
    }

    #[test]
    fn test_append_rows_keeps_target_schema() {
        let mut workspace = test_workspace();
        workspace.create_layer("target", vec![FieldDef::text(fields::PROVIDER_NAME, 100)]);

        let appended = workspace.append_rows("current", "target").unwrap();
        assert_eq!(appended, 3);

        let target = workspace.layer("target").unwrap();
        assert!(target.features.iter().all(|f| f.attr(fields::MAX_DOWN).is_none()));
        // Object ids are assigned by the target layer
        assert_eq!(target.features[0].oid, 1);
        assert_eq!(target.features[2].oid, 3);
    }

    #[test]
    fn test_locked_layer_rejects_mutation() {
        let mut workspace = test_workspace();
        workspace.layers.get_mut("current").unwrap().locked = true;

        let err = workspace
            .add_field("current", FieldDef::text(fields::IDENTIFIER, 50))
            .unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_LOCKED");
    }

    #[test]
    fn test_select_on_missing_field_fails() {
        let workspace = test_workspace();
        let filter = AttributeFilter::equals("NoSuchField", "x");
        let err = workspace.select_by_attribute("current", &filter).unwrap_err();
        assert_eq!(err.error_code(), "FIELD_NOT_FOUND");
    }

    #[test]
    fn test_stale_selection_fails() {
        let mut workspace = test_workspace();
        let stale = Selection {
            layer: "current".to_string(),
            oids: vec![99],
        };
        let err = workspace.delete_rows("current", &stale).unwrap_err();
        assert_eq!(err.error_code(), "FEATURE_NOT_FOUND");
    }
}
