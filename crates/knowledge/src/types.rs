//! Retrieved passage type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A unit of retrieved document text with optional locator metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub text: String,

    /// Free-form metadata from ingestion (e.g. `{"page": 12, "source": "report.pdf"}`)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Passage {
    /// Create a passage without metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Page number from metadata, if present and usable.
    pub fn page(&self) -> Option<String> {
        match self.metadata.get("page")? {
            Value::Number(n) => Some(
                n.as_u64()
                    .map(|v| v.to_string())
                    .or_else(|| n.as_i64().map(|v| v.to_string()))
                    .unwrap_or_else(|| n.to_string()),
            ),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Human-readable locator for source citations ("Page 12").
    pub fn locator(&self) -> Option<String> {
        self.page().map(|page| format!("Page {}", page))
    }
}
