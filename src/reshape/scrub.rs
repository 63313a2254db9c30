use super::unpivot::PlayerTable;

/// Medal columns: match-level in meaning, stored only under the first slot.
pub const MEDAL_FIELDS: [&str; 6] = [
    "medal1-grade",
    "medal1-name",
    "medal2-grade",
    "medal2-name",
    "medal3-grade",
    "medal3-name",
];

pub const CANONICAL_SLOT: &str = "A1";

/// Keeps canonical-only fields on the canonical slot's row and nulls them
/// everywhere else. Never adds or removes rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldScrubber {
    fields: Vec<String>,
    canonical_slot: String,
}

impl FieldScrubber {
    pub fn new<I, S>(fields: I, canonical_slot: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldScrubber {
            fields: fields.into_iter().map(Into::into).collect(),
            canonical_slot: canonical_slot.to_string(),
        }
    }

    pub fn medals() -> Self {
        Self::new(MEDAL_FIELDS, CANONICAL_SLOT)
    }

    pub fn canonical_slot(&self) -> &str {
        &self.canonical_slot
    }

    /// Returns the fields that were present and scrubbed. Fields absent from
    /// the table are skipped. A match without a canonical row ends up with
    /// every listed field null.
    pub fn scrub(&self, table: &mut PlayerTable) -> Vec<String> {
        let present: Vec<_> = self
            .fields
            .iter()
            .filter_map(|name| table.locate(name).map(|col| (name.clone(), col)))
            .collect();

        if present.is_empty() {
            return Vec::new();
        }

        for row in table.rows.iter_mut() {
            if row.slot.label() == self.canonical_slot {
                continue;
            }
            for (_, col) in &present {
                *row.cell_mut(*col) = None;
            }
        }

        present.into_iter().map(|(name, _)| name).collect()
    }
}

impl Default for FieldScrubber {
    fn default() -> Self {
        Self::medals()
    }
}
