//! Feature rows and attribute values.
//!
//! A feature is a geometry plus an attribute row. Geometry is carried as an
//! opaque GeoJSON-style value; this tool never interprets it beyond identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Text value (provider names, identifiers, round labels, tiers).
    Text(String),
    /// Numeric value (advertised speeds, technology codes).
    Number(f64),
    /// No value.
    Null,
}

impl AttrValue {
    /// The text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a number. Text that parses as a number is accepted,
    /// matching how desktop GIS attribute tables coerce field values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) => s.trim().parse().ok(),
            AttrValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

/// A geographic record: object id, geometry, attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable object id within its layer, assigned by the store.
    pub oid: u64,

    /// GeoJSON-style geometry, treated as opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,

    /// Attribute values keyed by field name.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Feature {
    /// Create a feature with no geometry and no attributes.
    pub fn new(oid: u64) -> Self {
        Self {
            oid,
            geometry: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Attribute value for `field`, if set.
    pub fn attr(&self, field: &str) -> Option<&AttrValue> {
        self.attributes.get(field)
    }

    /// Attribute value as text, if set and textual.
    pub fn attr_text(&self, field: &str) -> Option<&str> {
        self.attr(field).and_then(AttrValue::as_text)
    }

    /// Set an attribute value.
    pub fn set_attr(&mut self, field: &str, value: AttrValue) {
        self.attributes.insert(field.to_string(), value);
    }
}

/// An attribute equality predicate, the tool's only selection shape
/// (`"field" = 'value'` in the host's SQL dialect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub field: String,
    pub value: AttrValue,
}

impl AttributeFilter {
    pub fn equals(field: &str, value: impl Into<AttrValue>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Whether `feature` satisfies this predicate. A feature without the
    /// field never matches.
    pub fn matches(&self, feature: &Feature) -> bool {
        feature.attr(&self.field) == Some(&self.value)
    }
}

/// A set of selected object ids within one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub layer: String,
    pub oids: Vec<u64>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.oids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attr_value_number_coercion() {
        assert_eq!(AttrValue::Number(100.0).as_number(), Some(100.0));
        assert_eq!(AttrValue::Text("25".to_string()).as_number(), Some(25.0));
        assert_eq!(AttrValue::Text("fast".to_string()).as_number(), None);
        assert_eq!(AttrValue::Null.as_number(), None);
    }

    #[test]
    fn test_filter_matches() {
        let mut feature = Feature::new(1);
        feature.set_attr("ProviderName", AttrValue::from("Acme"));

        let filter = AttributeFilter::equals("ProviderName", "Acme");
        assert!(filter.matches(&feature));

        let other = AttributeFilter::equals("ProviderName", "Zayo");
        assert!(!other.matches(&feature));

        // Missing field never matches
        let missing = AttributeFilter::equals("DataRound", "2024Q1");
        assert!(!missing.matches(&feature));
    }

    #[test]
    fn test_attr_value_untagged_serde() {
        let feature: Feature = serde_json::from_str(
            r#"{"oid": 3, "attributes": {"ProviderName": "Acme", "MaxDown": 100.0}}"#,
        )
        .unwrap();
        assert_eq!(feature.attr_text("ProviderName"), Some("Acme"));
        assert_eq!(feature.attr("MaxDown"), Some(&AttrValue::Number(100.0)));
    }
}
