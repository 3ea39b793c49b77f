use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use log::{debug, info};
use super::PatchRecord;
use crate::error::PKResult;

/// Exported patch history as written by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchHistory {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub patches: Vec<PatchRecord>,
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryDocument {
    Envelope(PatchHistory),
    Records(Vec<PatchRecord>),
}

fn default_version() -> u32 {
    1
}

impl PatchHistory {
    pub fn from_records(patches: Vec<PatchRecord>) -> Self {
        Self {
            version: default_version(),
            exported_at: None,
            patches,
            settings: HashMap::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> PKResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let history = Self::from_json(&content)?;
        info!("Loaded {} patch records from {:?}", history.patches.len(), path.as_ref());
        Ok(history)
    }

    /// Accepts either the export envelope or a bare array of records.
    pub fn from_json(content: &str) -> PKResult<Self> {
        let history = match serde_json::from_str::<HistoryDocument>(content)? {
            HistoryDocument::Envelope(history) => history,
            HistoryDocument::Records(patches) => Self::from_records(patches),
        };

        for record in &history.patches {
            record.validate()?;
        }
        debug!("History format version {}", history.version);

        Ok(history)
    }
}
