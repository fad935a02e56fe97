use index_core::IndustryCode;
use pkd_codes::normalize_code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Pre-generated commentary for one code. Display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commentary {
    #[serde(rename = "CRO_Opinion", default)]
    pub cro_opinion: String,
    #[serde(rename = "CSO_Opinion", default)]
    pub cso_opinion: String,
    #[serde(rename = "Final_Verdict", default)]
    pub final_verdict: String,
}

/// Optional commentary cache keyed by normalized code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentaryCache {
    entries: BTreeMap<IndustryCode, Commentary>,
}

impl CommentaryCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &IndustryCode) -> Option<&Commentary> {
        self.entries.get(code)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Commentary> = serde_json::from_str(text)?;
        let entries = raw.into_iter().map(|(k, v)| (normalize_code(&k), v)).collect();
        Ok(Self { entries })
    }

    /// Load the cache. A missing or unreadable file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "commentary cache unavailable");
                return Self::default();
            }
        };
        match Self::from_json_str(&text) {
            Ok(cache) => {
                info!(path = %path.display(), entries = cache.len(), "loaded commentary cache");
                cache
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "commentary cache malformed, ignoring");
                Self::default()
            }
        }
    }
}
