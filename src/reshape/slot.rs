use crate::error::AppError;
use std::fmt;

/// Slot labels starting with this marker belong to the alpha team.
pub const ALPHA_MARKER: char = 'A';

pub const STANDARD_SLOTS: [&str; 8] = ["A1", "A2", "A3", "A4", "B1", "B2", "B3", "B4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Team {
    Alpha,
    Bravo,
}

impl Team {
    /// Case-sensitive: only an uppercase alpha marker maps to alpha, every
    /// other label falls through to bravo.
    pub fn from_slot_label(label: &str) -> Self {
        if label.starts_with(ALPHA_MARKER) {
            Team::Alpha
        } else {
            Team::Bravo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Alpha => "alpha",
            Team::Bravo => "bravo",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One player position of a match, e.g. `A3` (alpha team, player 3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    label: String,
    team: Team,
    player_no: u32,
}

impl Slot {
    pub fn parse(label: &str) -> Result<Self, AppError> {
        let mut chars = label.chars();
        if chars.next().is_none() {
            return Err(AppError::InvalidSlot(label.to_string()));
        }
        let player_no = chars
            .as_str()
            .parse::<u32>()
            .map_err(|_| AppError::InvalidSlot(label.to_string()))?;

        Ok(Slot {
            label: label.to_string(),
            team: Team::from_slot_label(label),
            player_no,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn player_no(&self) -> u32 {
        self.player_no
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// The enumerated set of slot labels a wide record may carry.
///
/// Membership is exact: a column prefix is a slot only if it is listed here.
/// Ordinals are parsed when a file's schema is discovered, so a malformed
/// label surfaces as a failure of the file that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayout {
    labels: Vec<String>,
}

impl SlotLayout {
    pub fn new<I, S>(labels: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() || label.contains('-') {
                return Err(AppError::ConfigError(format!(
                    "slot label '{}' must be non-empty and contain no '-'",
                    label
                )));
            }
            if !out.iter().any(|l| l == label) {
                out.push(label.to_string());
            }
        }

        if out.is_empty() {
            return Err(AppError::ConfigError("slot layout is empty".to_string()));
        }

        Ok(SlotLayout { labels: out })
    }

    pub fn standard() -> Self {
        SlotLayout {
            labels: STANDARD_SLOTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        let slot = Slot::parse("A3").unwrap();
        assert_eq!(slot.team(), Team::Alpha);
        assert_eq!(slot.player_no(), 3);
        assert_eq!(slot.label(), "A3");

        let slot = Slot::parse("B1").unwrap();
        assert_eq!(slot.team(), Team::Bravo);
        assert_eq!(slot.player_no(), 1);
    }

    #[test]
    fn test_parse_slot_rejects_bad_ordinal() {
        assert!(matches!(Slot::parse("AX"), Err(AppError::InvalidSlot(_))));
        assert!(matches!(Slot::parse("A"), Err(AppError::InvalidSlot(_))));
        assert!(matches!(Slot::parse(""), Err(AppError::InvalidSlot(_))));
    }

    #[test]
    fn test_team_split_is_exhaustive() {
        let mut alpha = 0;
        let mut bravo = 0;
        for label in STANDARD_SLOTS {
            match Team::from_slot_label(label) {
                Team::Alpha => alpha += 1,
                Team::Bravo => bravo += 1,
            }
        }
        assert_eq!(alpha, 4);
        assert_eq!(bravo, 4);
    }

    #[test]
    fn test_team_rule_is_case_sensitive() {
        assert_eq!(Team::from_slot_label("a1"), Team::Bravo);
        assert_eq!(Team::from_slot_label("A1"), Team::Alpha);
    }

    #[test]
    fn test_layout_membership() {
        let layout = SlotLayout::standard();
        assert!(layout.contains("A1"));
        assert!(layout.contains("B4"));
        assert!(!layout.contains("A5"));
        assert!(!layout.contains("medal1"));
    }

    #[test]
    fn test_layout_rejects_empty_and_dedupes() {
        assert!(SlotLayout::new(Vec::<String>::new()).is_err());
        assert!(SlotLayout::new(["A-1"]).is_err());

        let layout = SlotLayout::new(["A1", "A1", " B1 "]).unwrap();
        assert_eq!(layout.labels(), &["A1".to_string(), "B1".to_string()]);
    }
}
