//! Serialization and deserialization for plot documents.
//!
//! A plot document is JSON: metadata about the show and venue plus one
//! [`ElementSnapshot`] per placed element.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::element::{ElementRef, ElementSnapshot};

/// Plot file format version
pub const PLOT_FORMAT_VERSION: &str = "1.0";

/// Descriptive data about a plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub show_name: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub designer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl PlotMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: String::new(),
            show_name: String::new(),
            venue: String::new(),
            designer: String::new(),
            date: None,
            stage_id: None,
            created: now,
            modified: now,
        }
    }
}

impl Default for PlotMetadata {
    fn default() -> Self {
        Self::new("Untitled Plot")
    }
}

/// Complete plot file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDocument {
    pub version: String,
    pub metadata: PlotMetadata,
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
}

impl PlotDocument {
    pub fn new(metadata: PlotMetadata) -> Self {
        Self {
            version: PLOT_FORMAT_VERSION.to_string(),
            metadata,
            elements: Vec::new(),
        }
    }

    /// Snapshot `elements` into a new document
    pub fn from_elements(metadata: PlotMetadata, elements: &[ElementRef]) -> Self {
        let mut document = Self::new(metadata);
        document.elements = elements.iter().map(|element| element.serialize()).collect();
        document
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.metadata.modified = Utc::now();
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize plot")
    }

    /// Parse from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: PlotDocument = serde_json::from_str(json).context("Failed to parse plot")?;
        if document.version != PLOT_FORMAT_VERSION {
            tracing::warn!(
                version = %document.version,
                expected = PLOT_FORMAT_VERSION,
                "plot was written by a different format version"
            );
        }
        Ok(document)
    }

    /// Save plot to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json_string()?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write plot file {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load plot from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read plot file {}", path.as_ref().display()))?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(id: &str) -> ElementSnapshot {
        let mut extra = serde_json::Map::new();
        extra.insert("width".into(), json!(40.0));
        ElementSnapshot {
            id: id.into(),
            element_type: "fixture".into(),
            properties: [("channel".to_string(), json!("7"))].into_iter().collect(),
            x: 10.0,
            y: 20.0,
            rotation: 90.0,
            locked: true,
            extra,
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let value = serde_json::to_value(snapshot("f1")).unwrap();
        assert_eq!(value["type"], json!("fixture"));
        assert_eq!(value["width"], json!(40.0));
        assert_eq!(value["locked"], json!(true));
    }

    #[test]
    fn test_document_string_round_trip() {
        let mut document = PlotDocument::new(PlotMetadata::new("Hamlet"));
        document.metadata.venue = "Main Stage".into();
        document.elements.push(snapshot("f1"));

        let json = document.to_json_string().unwrap();
        let parsed = PlotDocument::from_json_str(&json).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_minimal_document_parses() {
        let parsed = PlotDocument::from_json_str(
            r#"{
                "version": "1.0",
                "metadata": {
                    "title": "Empty",
                    "created": "2024-01-01T00:00:00Z",
                    "modified": "2024-01-01T00:00:00Z"
                }
            }"#,
        )
        .unwrap();
        assert!(parsed.elements.is_empty());
        assert_eq!(parsed.metadata.title, "Empty");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = PlotDocument::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse plot"));
    }
}
