use crate::analysis::dictionary::NameDictionary;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A loaded name dictionary persisted between runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct DictionaryCache {
    pub locale: String,
    pub fetched_at: DateTime<Utc>,
    pub stages: HashMap<String, String>,
    pub weapons: HashMap<String, String>,
}

impl DictionaryCache {
    /// Only a ready dictionary can be cached.
    pub fn from_dictionary(dict: &NameDictionary, locale: &str) -> Result<Self, AppError> {
        if !dict.is_ready() {
            return Err(AppError::DictionaryNotLoaded);
        }
        Ok(DictionaryCache {
            locale: locale.to_string(),
            fetched_at: Utc::now(),
            stages: dict.stages().clone(),
            weapons: dict.weapons().clone(),
        })
    }

    pub fn default_path(locale: &str) -> PathBuf {
        let cache_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".splat_winrate");

        cache_dir.join(format!("dictionary.{}.json", locale))
    }

    /// `Ok(None)` when no cache file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| AppError::JsonError(format!("Failed to parse dictionary cache: {}", e))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::JsonError(format!("Failed to serialize dictionary cache: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn is_stale(&self, max_age_hours: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.fetched_at);
        age.num_hours() >= max_age_hours as i64
    }

    /// Usable when fresh and fetched for the requested locale.
    pub fn is_usable(&self, locale: &str, max_age_hours: u64) -> bool {
        self.locale == locale && !self.is_stale(max_age_hours)
    }

    pub fn into_dictionary(self) -> NameDictionary {
        NameDictionary::from_maps(self.stages, self.weapons)
    }
}
