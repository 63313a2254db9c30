use super::slot::{Slot, SlotLayout};
use super::unpivot::{DERIVED_COLUMNS, MATCH_ID_COLUMN};
use crate::error::AppError;

/// Per-slot projection of a wide header: which source columns belong to the
/// slot and which bare attribute each one becomes.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotColumns {
    pub slot: Slot,
    /// (source column index, attribute index)
    pub columns: Vec<(usize, usize)>,
}

/// A wide header resolved once into match-level columns and per-slot groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideSchema {
    pub match_columns: Vec<String>,
    pub match_indices: Vec<usize>,
    pub attributes: Vec<String>,
    pub slots: Vec<SlotColumns>,
}

/// Splits `<slot>-<attribute>` when the slot token is in the layout.
pub fn split_player_column<'a>(name: &'a str, layout: &SlotLayout) -> Option<(&'a str, &'a str)> {
    let (slot, attribute) = name.split_once('-')?;
    if attribute.is_empty() || !layout.contains(slot) {
        return None;
    }
    Some((slot, attribute))
}

impl WideSchema {
    pub fn discover<S: AsRef<str>>(headers: &[S], layout: &SlotLayout) -> Result<Self, AppError> {
        let mut schema = WideSchema::default();
        let mut grouped: Vec<(String, Vec<(usize, usize)>)> = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let name = header.as_ref();
            match split_player_column(name, layout) {
                Some((slot, attribute)) => {
                    let attr_idx = match schema.attributes.iter().position(|a| a == attribute) {
                        Some(pos) => pos,
                        None => {
                            schema.attributes.push(attribute.to_string());
                            schema.attributes.len() - 1
                        }
                    };
                    match grouped.iter_mut().find(|(label, _)| label == slot) {
                        Some((_, cols)) => cols.push((idx, attr_idx)),
                        None => grouped.push((slot.to_string(), vec![(idx, attr_idx)])),
                    }
                }
                None => {
                    schema.match_columns.push(name.to_string());
                    schema.match_indices.push(idx);
                }
            }
        }

        let reserved = |name: &str| name == MATCH_ID_COLUMN || DERIVED_COLUMNS.contains(&name);
        for name in schema.match_columns.iter().chain(schema.attributes.iter()) {
            if reserved(name.as_str()) {
                return Err(AppError::DuplicateColumn(name.clone()));
            }
        }
        if let Some(shared) = schema.attributes.iter().find(|a| schema.match_columns.contains(a)) {
            return Err(AppError::DuplicateColumn(shared.clone()));
        }

        // Only slots actually present, in layout order.
        for label in layout.labels() {
            if let Some((_, columns)) = grouped.iter().find(|(l, _)| l == label) {
                schema.slots.push(SlotColumns {
                    slot: Slot::parse(label)?,
                    columns: columns.clone(),
                });
            }
        }

        Ok(schema)
    }

    pub fn has_player_columns(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn match_column_position(&self, name: &str) -> Option<usize> {
        self.match_columns.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_player_column() {
        let layout = SlotLayout::standard();
        assert_eq!(split_player_column("A1-weapon", &layout), Some(("A1", "weapon")));
        assert_eq!(split_player_column("B4-kill-or-assist", &layout), Some(("B4", "kill-or-assist")));
        assert_eq!(split_player_column("medal1-grade", &layout), None);
        assert_eq!(split_player_column("A5-weapon", &layout), None);
        assert_eq!(split_player_column("A1-", &layout), None);
        assert_eq!(split_player_column("mode", &layout), None);
    }

    #[test]
    fn test_discover_classifies_columns() {
        let h = headers(&[
            "mode", "A1-weapon", "A1-kill", "stage", "B1-weapon", "B1-kill", "medal1-grade", "C1-weapon",
        ]);
        let schema = WideSchema::discover(&h, &SlotLayout::standard()).unwrap();

        assert_eq!(schema.match_columns, vec!["mode", "stage", "medal1-grade", "C1-weapon"]);
        assert_eq!(schema.match_indices, vec![0, 3, 6, 7]);
        assert_eq!(schema.attributes, vec!["weapon", "kill"]);
        assert_eq!(schema.slots.len(), 2);
        assert_eq!(schema.slots[0].slot.label(), "A1");
        assert_eq!(schema.slots[0].columns, vec![(1, 0), (2, 1)]);
        assert_eq!(schema.slots[1].slot.label(), "B1");
        assert_eq!(schema.slots[1].columns, vec![(4, 0), (5, 1)]);
    }

    #[test]
    fn test_discover_keeps_only_present_slots_in_layout_order() {
        let h = headers(&["B2-weapon", "A3-weapon", "mode"]);
        let schema = WideSchema::discover(&h, &SlotLayout::standard()).unwrap();
        let labels: Vec<&str> = schema.slots.iter().map(|s| s.slot.label()).collect();
        assert_eq!(labels, vec!["A3", "B2"]);
    }

    #[test]
    fn test_discover_without_player_columns() {
        let h = headers(&["mode", "stage", "win"]);
        let schema = WideSchema::discover(&h, &SlotLayout::standard()).unwrap();
        assert!(!schema.has_player_columns());
        assert_eq!(schema.match_columns.len(), 3);
    }

    #[test]
    fn test_discover_rejects_colliding_names() {
        let layout = SlotLayout::standard();

        let err = WideSchema::discover(&headers(&["weapon", "A1-weapon"]), &layout).unwrap_err();
        assert!(matches!(err, AppError::DuplicateColumn(c) if c == "weapon"));

        let err = WideSchema::discover(&headers(&["team", "A1-weapon"]), &layout).unwrap_err();
        assert!(matches!(err, AppError::DuplicateColumn(c) if c == "team"));

        let err = WideSchema::discover(&headers(&["mode", "B2-is_win"]), &layout).unwrap_err();
        assert!(matches!(err, AppError::DuplicateColumn(c) if c == "is_win"));
    }

    #[test]
    fn test_discover_fails_on_bad_ordinal() {
        let layout = SlotLayout::new(["A1", "AX"]).unwrap();
        let h = headers(&["A1-weapon", "AX-weapon"]);
        let err = WideSchema::discover(&h, &layout).unwrap_err();
        assert!(matches!(err, AppError::InvalidSlot(label) if label == "AX"));
    }
}
