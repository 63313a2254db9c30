use crate::analysis::aggregate::{AggregatedStat, GroupKey};
use crate::analysis::rank::DeltaStat;
use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};

fn is_unsafe(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Collapses each run of path separators and reserved characters into `_`.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if is_unsafe(c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// `<dir>/<name>.csv`, always directly inside `dir`.
pub fn export_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.csv", safe_filename(name)))
}

fn writer(path: &Path) -> Result<csv::Writer<fs::File>, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    csv::Writer::from_path(path).map_err(|e| AppError::csv(path, e))
}

/// Group key columns, then games, wins and the raw win rate.
pub fn write_stats_csv(path: &Path, keys: &[GroupKey], stats: &[AggregatedStat]) -> Result<(), AppError> {
    let mut w = writer(path)?;

    let mut header: Vec<&str> = keys.iter().map(|k| k.column()).collect();
    header.extend(["games", "wins", "win_rate"]);
    w.write_record(&header).map_err(|e| AppError::csv(path, e))?;

    for stat in stats {
        let mut record = stat.key.clone();
        record.push(stat.games.to_string());
        record.push(stat.wins.to_string());
        record.push(stat.win_rate.to_string());
        w.write_record(&record).map_err(|e| AppError::csv(path, e))?;
    }

    w.flush()?;
    Ok(())
}

pub fn write_delta_csv(path: &Path, keys: &[GroupKey], deltas: &[DeltaStat]) -> Result<(), AppError> {
    let mut w = writer(path)?;

    let mut header: Vec<&str> = keys.iter().map(|k| k.column()).collect();
    header.extend([
        "games_wpn",
        "wins_wpn",
        "win_rate_wpn",
        "games_all",
        "wins_all",
        "win_rate_all",
        "delta",
    ]);
    w.write_record(&header).map_err(|e| AppError::csv(path, e))?;

    for d in deltas {
        let mut record = d.key.clone();
        record.extend([
            d.target.games.to_string(),
            d.target.wins.to_string(),
            d.target.win_rate.to_string(),
            d.baseline.games.to_string(),
            d.baseline.wins.to_string(),
            d.baseline.win_rate.to_string(),
            d.delta.to_string(),
        ]);
        w.write_record(&record).map_err(|e| AppError::csv(path, e))?;
    }

    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(key: &[&str], games: u32, wins: u32) -> AggregatedStat {
        AggregatedStat {
            key: key.iter().map(|s| s.to_string()).collect(),
            games,
            wins,
            win_rate: wins as f64 / games as f64,
        }
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("a/b"), "a_b");
        assert_eq!(safe_filename("../x"), ".._x");
        assert_eq!(safe_filename(r#"w<>:"|?*\\z"#), "w_z");
        assert_eq!(safe_filename("ロングブラスター_stage_winrate"), "ロングブラスター_stage_winrate");
    }

    #[test]
    fn test_export_stays_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Analytics_output");

        let path = export_path(&out, "../escaped/x_stage_winrate");
        assert_eq!(path.parent(), Some(out.as_path()));
        write_stats_csv(&path, &[GroupKey::Mode], &[stat(&["area"], 2, 1)]).unwrap();

        assert!(out.join(".._escaped_x_stage_winrate.csv").is_file());
        assert!(!dir.path().join("escaped").exists());
    }

    #[test]
    fn test_write_stats_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("top.csv");
        write_stats_csv(
            &path,
            &[GroupKey::Mode, GroupKey::Stage],
            &[stat(&["area", "X"], 4, 3)],
        )
        .unwrap();

        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "mode,stage,games,wins,win_rate\narea,X,4,3,0.75\n");
    }

    #[test]
    fn test_write_delta_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.csv");
        let d = DeltaStat {
            key: vec!["area".to_string(), "X".to_string()],
            target: stat(&["area", "X"], 4, 3),
            baseline: stat(&["area", "X"], 8, 4),
            delta: 0.25,
        };
        write_delta_csv(&path, &[GroupKey::Mode, GroupKey::StageDisplay], &[d]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[1], "stage_display");
        assert_eq!(&headers[8], "delta");
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "4");
        assert_eq!(&record[7], "0.5");
        assert_eq!(&record[8], "0.25");
    }
}
