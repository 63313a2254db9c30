use crate::api::endpoints::{STAGE_ENDPOINT, WEAPON_ENDPOINT};
use crate::error::AppError;
use crate::reshape::scrub::{CANONICAL_SLOT, MEDAL_FIELDS};
use crate::reshape::slot::{SlotLayout, STANDARD_SLOTS};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub battle_results_dir: PathBuf,
    pub players_dir: PathBuf,
    pub output_dir: PathBuf,
    pub stage_url: String,
    pub weapon_url: String,
    pub locale: String,
    pub dictionary_timeout_secs: u64,
    pub dictionary_max_age_hours: u64,
    pub slots: SlotLayout,
    pub canonical_slot: String,
    pub canonical_fields: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let list = |key: &str, default: &[&str]| -> Vec<String> {
            match lookup(key) {
                Some(v) => v
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                None => default.iter().map(|s| s.to_string()).collect(),
            }
        };

        let slots = SlotLayout::new(list("BATTLE_SLOTS", &STANDARD_SLOTS[..]))?;

        Ok(Config {
            battle_results_dir: PathBuf::from(string("BATTLE_RESULTS_DIR", "battle-results-csv")),
            players_dir: PathBuf::from(string("PLAYERS_DIR", "players-csv")),
            output_dir: PathBuf::from(string("ANALYTICS_OUTPUT_DIR", "Analytics_output")),
            stage_url: string("STATINK_STAGE_URL", STAGE_ENDPOINT),
            weapon_url: string("STATINK_WEAPON_URL", WEAPON_ENDPOINT),
            locale: string("DICTIONARY_LOCALE", "ja_JP"),
            dictionary_timeout_secs: parse_number(&lookup, "DICTIONARY_TIMEOUT_SECS", 20)?,
            dictionary_max_age_hours: parse_number(&lookup, "DICTIONARY_MAX_AGE_HOURS", 24)?,
            slots,
            canonical_slot: string("CANONICAL_SLOT", CANONICAL_SLOT),
            canonical_fields: list("CANONICAL_FIELDS", &MEDAL_FIELDS[..]),
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

/// Display labels for game modes, plus the order reports present them in.
#[derive(Debug, Clone)]
pub struct ModeLabels {
    labels: Vec<(String, String)>,
}

impl ModeLabels {
    pub fn new<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ModeLabels {
            labels: labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn label<'a>(&'a self, mode: &'a str) -> &'a str {
        self.labels
            .iter()
            .find(|(k, _)| k == mode)
            .map(|(_, v)| v.as_str())
            .unwrap_or(mode)
    }

    /// Known modes first in label order, then any others sorted.
    pub fn order<'a, I>(&self, present: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut present: Vec<&str> = present.into_iter().collect();
        present.sort();
        present.dedup();

        let mut ordered: Vec<String> = self
            .labels
            .iter()
            .filter(|(k, _)| present.contains(&k.as_str()))
            .map(|(k, _)| k.clone())
            .collect();
        ordered.extend(
            present
                .into_iter()
                .filter(|m| !self.labels.iter().any(|(k, _)| k == m))
                .map(String::from),
        );
        ordered
    }
}

impl Default for ModeLabels {
    fn default() -> Self {
        ModeLabels::new([
            ("nawabari", "ナワバリ"),
            ("area", "ガチエリア"),
            ("yagura", "ガチヤグラ"),
            ("hoko", "ガチホコ"),
            ("asari", "ガチアサリ"),
        ])
    }
}
