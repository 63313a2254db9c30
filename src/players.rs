use crate::error::AppError;
use crate::ingest::{discover_files, PLAYERS_SUFFIX};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Columns projected from every player CSV for analysis.
pub const REQUIRED_COLUMNS: [&str; 5] = ["mode", "stage", "weapon", "team", "win"];

/// The analysis projection of one long-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub mode: String,
    pub stage: String,
    pub weapon: String,
    pub team: String,
    pub win: String,
    pub is_win: bool,
    pub stage_display: Option<String>,
    pub weapon_display: Option<String>,
}

impl PlayerRow {
    /// A null winner never counts as a win.
    pub fn new(mode: &str, stage: &str, weapon: &str, team: &str, win: &str) -> Self {
        PlayerRow {
            mode: mode.to_string(),
            stage: stage.to_string(),
            weapon: weapon.to_string(),
            team: team.to_string(),
            win: win.to_string(),
            is_win: !win.is_empty() && team == win,
            stage_display: None,
            weapon_display: None,
        }
    }

    /// True when `name` is this row's weapon by display name or internal key.
    pub fn uses_weapon(&self, name: &str) -> bool {
        self.weapon == name || self.weapon_display.as_deref() == Some(name)
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub rows: Vec<PlayerRow>,
    pub files_loaded: usize,
    pub failures: Vec<(PathBuf, AppError)>,
}

pub fn read_players_csv(path: &Path) -> Result<Vec<PlayerRow>, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| AppError::csv(path, e))?;
    let headers = reader.headers().map_err(|e| AppError::csv(path, e))?.clone();

    let mut idx = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AppError::MissingColumn {
                file: path.display().to_string(),
                column: column.to_string(),
            })?;
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::csv(path, e))?;
        let get = |i: usize| record.get(idx[i]).unwrap_or("");
        rows.push(PlayerRow::new(get(0), get(1), get(2), get(3), get(4)));
    }

    Ok(rows)
}

/// Loads one explicit file, or every `*_players.csv` under `dir`.
/// No files at all is fatal; an unreadable file is reported and skipped.
pub fn load_players(dir: &Path, file: Option<&Path>) -> Result<LoadReport, AppError> {
    let files = match file {
        Some(f) => vec![f.to_path_buf()],
        None => discover_files(dir, &format!("*{}", PLAYERS_SUFFIX))?,
    };

    let mut report = LoadReport::default();
    for path in files {
        match read_players_csv(&path) {
            Ok(rows) => {
                debug!("{}: {} player rows", path.display(), rows.len());
                report.rows.extend(rows);
                report.files_loaded += 1;
            }
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                report.failures.push((path, e));
            }
        }
    }

    Ok(report)
}
