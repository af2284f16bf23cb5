use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::global::ChampionGlobalSummary;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ready,
    Error,
}

/// What a job leaves behind for a champion: the summary, or why it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionRecord {
    pub status: RecordStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ChampionGlobalSummary>,
}

impl ChampionRecord {
    pub fn ready(summary: ChampionGlobalSummary) -> Self {
        ChampionRecord {
            status: RecordStatus::Ready,
            updated_at: Utc::now(),
            message: None,
            summary: Some(summary),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChampionRecord {
            status: RecordStatus::Error,
            updated_at: Utc::now(),
            message: Some(message.into()),
            summary: None,
        }
    }
}

/// One JSON file per champion name; saving replaces the previous record.
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            AppError::Store(format!("Failed to create {}: {}", root.display(), e))
        })?;
        Ok(ResultStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, champion_name: &str) -> PathBuf {
        let file: String = champion_name
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.root.join(format!("{}.json", file))
    }

    pub fn save(&self, champion_name: &str, record: &ChampionRecord) -> Result<(), AppError> {
        let path = self.record_path(champion_name);
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            AppError::Store(format!("Failed to serialize record: {}", e))
        })?;

        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| AppError::Store(format!("Failed to write {}: {}", path.display(), e)))
    }

    pub fn load(&self, champion_name: &str) -> Result<Option<ChampionRecord>, AppError> {
        let path = self.record_path(champion_name);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                AppError::Store(format!("Failed to parse {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Store(format!("Failed to read {}: {}", path.display(), e))),
        }
    }
}
