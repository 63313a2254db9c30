use crate::api::models::DictionaryEntry;
use crate::error::AppError;
use crate::players::PlayerRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Stage,
    Weapon,
}

/// Where dictionary entries come from (stat.ink over HTTP in production).
pub trait DictionarySource {
    fn fetch(&self, category: Category) -> Result<Vec<DictionaryEntry>, AppError>;
}

/// Internal stage/weapon keys to localized display names.
///
/// Enrichment fails hard until a load has succeeded; once loaded, a key
/// missing from a map falls back to the key itself.
#[derive(Debug, Clone, Default)]
pub struct NameDictionary {
    stages: HashMap<String, String>,
    weapons: HashMap<String, String>,
    ready: bool,
}

impl NameDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary that is already loaded, e.g. restored from cache.
    pub fn from_maps(stages: HashMap<String, String>, weapons: HashMap<String, String>) -> Self {
        NameDictionary {
            stages,
            weapons,
            ready: true,
        }
    }

    /// Fetches both categories; the dictionary only becomes ready if both succeed.
    pub fn load(&mut self, source: &dyn DictionarySource, locale: &str) -> Result<(), AppError> {
        let stages = source.fetch(Category::Stage)?;
        let weapons = source.fetch(Category::Weapon)?;

        self.stages = localize(&stages, locale);
        self.weapons = localize(&weapons, locale);
        self.ready = true;

        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn stages(&self) -> &HashMap<String, String> {
        &self.stages
    }

    pub fn weapons(&self) -> &HashMap<String, String> {
        &self.weapons
    }

    pub fn stage_name<'a>(&'a self, key: &'a str) -> Result<&'a str, AppError> {
        self.lookup(Category::Stage, key)
    }

    pub fn weapon_name<'a>(&'a self, key: &'a str) -> Result<&'a str, AppError> {
        self.lookup(Category::Weapon, key)
    }

    fn lookup<'a>(&'a self, category: Category, key: &'a str) -> Result<&'a str, AppError> {
        if !self.ready {
            return Err(AppError::DictionaryNotLoaded);
        }
        let map = match category {
            Category::Stage => &self.stages,
            Category::Weapon => &self.weapons,
        };
        Ok(map.get(key).map(String::as_str).unwrap_or(key))
    }

    /// Fills `stage_display` and `weapon_display` on every row.
    pub fn enrich(&self, rows: &mut [PlayerRow]) -> Result<(), AppError> {
        if !self.ready {
            return Err(AppError::DictionaryNotLoaded);
        }
        for row in rows.iter_mut() {
            let stage = self.stage_name(&row.stage)?.to_string();
            let weapon = self.weapon_name(&row.weapon)?.to_string();
            row.stage_display = Some(stage);
            row.weapon_display = Some(weapon);
        }
        Ok(())
    }
}

fn localize(entries: &[DictionaryEntry], locale: &str) -> HashMap<String, String> {
    entries
        .iter()
        .map(|e| (e.key.clone(), e.localized(locale)))
        .collect()
}
