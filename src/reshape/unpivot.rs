use super::schema::WideSchema;
use super::slot::{Slot, Team};

/// A nullable CSV field. Empty source fields load as `None`.
pub type Cell = Option<String>;

/// Match-level column naming the winning team.
pub const WINNER_COLUMN: &str = "win";

/// Derived columns appended to every long row, in output order.
pub const DERIVED_COLUMNS: [&str; 4] = ["player", "team", "player_no", "is_win"];

pub const MATCH_ID_COLUMN: &str = "match_id";

/// Where a named column lives in a `PlayerRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    Match(usize),
    Attribute(usize),
}

/// One (match, slot) row of the long table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub match_id: u64,
    pub slot: Slot,
    /// Aligned with `PlayerTable::match_columns`.
    pub match_fields: Vec<Cell>,
    /// Aligned with `PlayerTable::attributes`; a gap in the slot's group is `None`.
    pub attributes: Vec<Cell>,
    pub is_win: Option<bool>,
}

impl PlayerRecord {
    pub fn team(&self) -> Team {
        self.slot.team()
    }

    pub fn player_no(&self) -> u32 {
        self.slot.player_no()
    }

    #[cfg(test)]
    pub fn cell(&self, column: ColumnRef) -> &Cell {
        match column {
            ColumnRef::Match(i) => &self.match_fields[i],
            ColumnRef::Attribute(i) => &self.attributes[i],
        }
    }

    pub fn cell_mut(&mut self, column: ColumnRef) -> &mut Cell {
        match column {
            ColumnRef::Match(i) => &mut self.match_fields[i],
            ColumnRef::Attribute(i) => &mut self.attributes[i],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerTable {
    pub match_columns: Vec<String>,
    pub attributes: Vec<String>,
    pub rows: Vec<PlayerRecord>,
}

impl PlayerTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn locate(&self, name: &str) -> Option<ColumnRef> {
        if let Some(i) = self.match_columns.iter().position(|c| c == name) {
            return Some(ColumnRef::Match(i));
        }
        self.attributes
            .iter()
            .position(|c| c == name)
            .map(ColumnRef::Attribute)
    }

    /// Output header: match id, match-level columns, bare attributes, derived columns.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(1 + self.match_columns.len() + self.attributes.len() + 4);
        header.push(MATCH_ID_COLUMN.to_string());
        header.extend(self.match_columns.iter().cloned());
        header.extend(self.attributes.iter().cloned());
        header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    /// Renders a row in `header()` order; nulls become empty fields.
    pub fn render_row(&self, row: &PlayerRecord) -> Vec<String> {
        let mut out = Vec::with_capacity(row.match_fields.len() + row.attributes.len() + 5);
        out.push(row.match_id.to_string());
        for cell in row.match_fields.iter().chain(row.attributes.iter()) {
            out.push(cell.clone().unwrap_or_default());
        }
        out.push(row.slot.label().to_string());
        out.push(row.team().as_str().to_string());
        out.push(row.player_no().to_string());
        out.push(match row.is_win {
            Some(true) => "1".to_string(),
            Some(false) => "0".to_string(),
            None => String::new(),
        });
        out
    }
}

/// Reshapes one wide record into one row per slot present in the schema.
pub fn unpivot_record(schema: &WideSchema, match_id: u64, record: &[Cell]) -> Vec<PlayerRecord> {
    let field = |idx: usize| record.get(idx).cloned().flatten();

    let match_fields: Vec<Cell> = schema.match_indices.iter().map(|&i| field(i)).collect();
    let winner = schema
        .match_column_position(WINNER_COLUMN)
        .and_then(|pos| match_fields[pos].clone());

    schema
        .slots
        .iter()
        .map(|group| {
            let mut attributes: Vec<Cell> = vec![None; schema.attributes.len()];
            for &(src, attr) in &group.columns {
                attributes[attr] = field(src);
            }
            let is_win = winner
                .as_deref()
                .map(|w| w == group.slot.team().as_str());

            PlayerRecord {
                match_id,
                slot: group.slot.clone(),
                match_fields: match_fields.clone(),
                attributes,
                is_win,
            }
        })
        .collect()
}

/// Reshapes a whole file's records. `match_id` is the 0-based row position,
/// and rows come out ordered by (match_id, team, player_no).
pub fn unpivot(schema: &WideSchema, records: &[Vec<Cell>]) -> PlayerTable {
    let mut rows: Vec<PlayerRecord> = records
        .iter()
        .enumerate()
        .flat_map(|(idx, record)| unpivot_record(schema, idx as u64, record))
        .collect();

    rows.sort_by_key(|r| (r.match_id, r.team(), r.player_no()));

    PlayerTable {
        match_columns: schema.match_columns.clone(),
        attributes: schema.attributes.clone(),
        rows,
    }
}
