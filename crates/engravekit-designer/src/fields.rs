//! Text field records
//!
//! An ordered set of labeled values (e.g. the fields read off a business card)
//! that becomes the text block to engrave, one `"name: value"` line per field.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Ordered mapping of field name to optional value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFieldRecord {
    fields: Vec<(String, Option<String>)>,
}

impl TextFieldRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping insertion order
    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.fields.push((name.into(), value));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, Some(value.into()));
        self
    }

    /// Parse a record from a JSON object, keeping key order
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Field record must be a JSON object")
    }

    /// Read a record from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read field record {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Fields that carry a non-empty value, in order
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|(name, value)| match value {
            Some(v) if !v.is_empty() => Some((name.as_str(), v.as_str())),
            _ => None,
        })
    }

    /// Number of fields, including empty ones
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the text block: one `"name: value"` line per present field
    pub fn to_text(&self) -> String {
        self.present()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<(String, Option<String>)> for TextFieldRecord {
    fn from_iter<T: IntoIterator<Item = (String, Option<String>)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for TextFieldRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                };
                (name, value)
            })
            .collect())
    }
}

/// Text block for a record, as fed to the toolpath generator
pub fn fields_to_text(record: &TextFieldRecord) -> String {
    record.to_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_order_is_preserved() {
        let record = TextFieldRecord::from_json_str(
            r#"{"name": "Ada", "phone": "555", "email": "ada@example.com"}"#,
        )
        .unwrap();
        assert_eq!(
            record.to_text(),
            "name: Ada\nphone: 555\nemail: ada@example.com"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.json");
        std::fs::write(&path, r#"{"name": "Ada", "email": "ada@example.com"}"#).unwrap();
        let record = TextFieldRecord::load(&path).unwrap();
        assert_eq!(record.to_text(), "name: Ada\nemail: ada@example.com");

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(TextFieldRecord::load(&path).is_err());
        assert!(TextFieldRecord::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_empty_and_null_fields_are_skipped() {
        let record = TextFieldRecord::from_json_str(
            r#"{"name": "Ada", "fax": null, "company": "", "floor": 3}"#,
        )
        .unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record.to_text(), "name: Ada\nfloor: 3");
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(TextFieldRecord::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_empty_record_has_empty_text() {
        assert_eq!(TextFieldRecord::new().to_text(), "");
        assert_eq!(fields_to_text(&TextFieldRecord::new()), "");
    }
}
