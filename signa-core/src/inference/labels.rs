//! Class-id → text/gloss table for model-backed classifiers.
//!
//! File format:
//!
//! ```json
//! {"labels": [{"id": 0, "text": "hello", "gloss": ["HELLO"]}]}
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SignaError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub id: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub gloss: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LabelFile {
    #[serde(default)]
    labels: Vec<LabelEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    entries: HashMap<usize, LabelEntry>,
}

impl LabelTable {
    /// Later entries with a duplicate id replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = LabelEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    /// Parse a label file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `LabelFile` if it is not a label document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let file: LabelFile = serde_json::from_str(&raw)
            .map_err(|e| SignaError::LabelFile(format!("{}: {e}", path.display())))?;
        Ok(Self::from_entries(file.labels))
    }

    /// Like [`LabelTable::load`], but any failure yields an empty table.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(table) => {
                info!(path = ?path, labels = table.len(), "label table loaded");
                table
            }
            Err(e) => {
                warn!(path = ?path, "label table unavailable ({e}); predictions use placeholders");
                Self::default()
            }
        }
    }

    pub fn get(&self, id: usize) -> Option<&LabelEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn loads_labels_with_optional_fields() {
        let file = write_temp(
            r#"{"labels": [
                {"id": 0, "text": "hello", "gloss": ["HELLO"]},
                {"id": 3}
            ]}"#,
        );
        let table = LabelTable::load(file.path()).expect("load labels");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).map(|e| e.text.as_str()), Some("hello"));
        let bare = table.get(3).expect("entry 3");
        assert!(bare.text.is_empty());
        assert!(bare.gloss.is_empty());
        assert!(table.get(1).is_none());
    }

    #[test]
    fn malformed_file_is_a_label_error() {
        let file = write_temp(r#"{"labels": [{"text": "missing id"}]}"#);
        assert!(matches!(
            LabelTable::load(file.path()),
            Err(SignaError::LabelFile(_))
        ));
    }

    #[test]
    fn load_or_empty_degrades() {
        let file = write_temp("not json");
        assert!(LabelTable::load_or_empty(Some(file.path())).is_empty());
        assert!(LabelTable::load_or_empty(Some(Path::new("/nonexistent/labels.json"))).is_empty());
        assert!(LabelTable::load_or_empty(None).is_empty());
    }
}
