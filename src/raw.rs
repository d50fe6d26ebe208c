//! Undecoded JSON:API documents.
//!
//! Enabled with the `raw-mode` feature.

use serde::Deserialize;

/// Whole response envelope as returned by the API.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(pub serde_json::Value);

impl RawDocument {
    /// The top-level `data` member, if present.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.0.get("data")
    }
}
