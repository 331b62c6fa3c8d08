//! Layer file format.
//!
//! Feature classes are stored one per file as pretty-printed JSON: schema,
//! rows, next object id. This stands in for the GIS backend's own storage so
//! runs are inspectable with any text tool.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Result, UpdateError};
use crate::store::workspace::{FeatureClass, Workspace};

/// Read a feature class from a JSON layer file.
pub fn read_feature_class(path: &Path) -> Result<FeatureClass> {
    let content = fs::read_to_string(path).map_err(|e| UpdateError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let class: FeatureClass = serde_json::from_str(&content)?;
    Ok(class)
}

/// Write a feature class to a JSON layer file.
pub fn write_feature_class(path: &Path, class: &FeatureClass) -> Result<()> {
    let content = serde_json::to_string_pretty(class)?;
    fs::write(path, content).map_err(|e| UpdateError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Workspace {
    /// Load a layer file into the workspace under `name`.
    pub fn load_layer(&mut self, name: &str, path: &Path) -> Result<()> {
        info!("Loading layer {} from {}", name, path.display());
        let class = read_feature_class(path)?;
        self.add_layer(name, class);
        Ok(())
    }

    /// Write the layer named `name` back to `path`.
    pub fn save_layer(&self, name: &str, path: &Path) -> Result<()> {
        info!("Saving layer {} to {}", name, path.display());
        write_feature_class(path, self.layer(name)?)
    }
}
