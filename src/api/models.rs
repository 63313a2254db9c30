use serde::Deserialize;
use std::collections::HashMap;

// stat.ink v3 stage / weapon list entry
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DictionaryEntry {
    pub key: String,
    #[serde(default)]
    pub name: HashMap<String, Option<String>>,
}

impl DictionaryEntry {
    /// Localized name for `locale`, or the key when missing or null.
    pub fn localized(&self, locale: &str) -> String {
        self.name
            .get(locale)
            .and_then(|n| n.clone())
            .unwrap_or_else(|| self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_localize() {
        let body = r#"[
            {"key": "yunohana", "aliases": ["1"], "name": {"en_US": "Scorch Gorge", "ja_JP": "ユノハナ大渓谷"}},
            {"key": "gonzui", "name": {"en_US": "Eeltail Alley", "ja_JP": null}},
            {"key": "bare"}
        ]"#;
        let entries: Vec<DictionaryEntry> = serde_json::from_str(body).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].localized("ja_JP"), "ユノハナ大渓谷");
        assert_eq!(entries[0].localized("de_DE"), "yunohana");
        assert_eq!(entries[1].localized("ja_JP"), "gonzui");
        assert_eq!(entries[2].localized("ja_JP"), "bare");
    }
}
