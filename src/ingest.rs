use crate::error::AppError;
use crate::reshape::schema::WideSchema;
use crate::reshape::scrub::FieldScrubber;
use crate::reshape::slot::SlotLayout;
use crate::reshape::unpivot::{unpivot, Cell, PlayerTable};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PLAYERS_SUFFIX: &str = "_players.csv";

#[derive(Debug)]
pub enum FileOutcome {
    Written { rows: usize, matches: usize },
    Skipped,
    Failed(AppError),
}

#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub layout: SlotLayout,
    pub scrubber: FieldScrubber,
    pub force: bool,
}

/// Sorted paths matching `<dir>/<pattern>`; an empty match is fatal.
pub fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    let full = dir.join(pattern);
    let full = full.to_string_lossy().to_string();

    let mut files: Vec<PathBuf> = glob::glob(&full)
        .map_err(|e| AppError::ConfigError(format!("bad glob pattern {}: {}", full, e)))?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!("skipping unreadable path: {}", e);
                None
            }
        })
        .collect();

    if files.is_empty() {
        return Err(AppError::NoInputFiles(full));
    }

    files.sort();
    Ok(files)
}

pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    output_dir.join(format!("{}{}", stem, PLAYERS_SUFFIX))
}

/// Reads a wide CSV: header plus rows of nullable cells.
pub fn read_wide_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| AppError::csv(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::csv(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::csv(path, e))?;
        records.push(
            record
                .iter()
                .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                .collect(),
        );
    }

    Ok((headers, records))
}

pub fn write_players_csv(table: &PlayerTable, path: &Path) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| AppError::csv(path, e))?;

    writer
        .write_record(table.header())
        .map_err(|e| AppError::csv(path, e))?;
    for row in &table.rows {
        writer
            .write_record(table.render_row(row))
            .map_err(|e| AppError::csv(path, e))?;
    }
    writer.flush()?;

    Ok(())
}

/// Unpivots and scrubs one wide file into the long player table.
pub fn reshape_file(input: &Path, options: &BatchOptions) -> Result<(PlayerTable, usize), AppError> {
    let (headers, records) = read_wide_csv(input)?;
    let schema = WideSchema::discover(&headers, &options.layout)?;

    let mut table = unpivot(&schema, &records);
    if table.is_empty() {
        if schema.has_player_columns() {
            debug!("{}: no matches", input.display());
        } else {
            warn!("{}: no player columns recognised, producing no rows", input.display());
        }
    }

    let scrubbed = options.scrubber.scrub(&mut table);
    debug!(
        "{}: {} matches -> {} rows, scrubbed {:?} outside slot {}",
        input.display(),
        records.len(),
        table.len(),
        scrubbed,
        options.scrubber.canonical_slot()
    );

    Ok((table, records.len()))
}

fn process_file(input: &Path, output: &Path, options: &BatchOptions) -> FileOutcome {
    if output.exists() && !options.force {
        return FileOutcome::Skipped;
    }

    let result = reshape_file(input, options)
        .and_then(|(table, matches)| write_players_csv(&table, output).map(|_| (table.len(), matches)));

    match result {
        Ok((rows, matches)) => FileOutcome::Written { rows, matches },
        Err(e) => {
            warn!("{}: {}", input.display(), e);
            FileOutcome::Failed(e)
        }
    }
}

/// Files are independent, so they run in parallel; each file's sort and
/// scrub completes before its output is written. Reports keep input order.
pub fn run_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    options: &BatchOptions,
    progress: &ProgressBar,
) -> Result<Vec<FileReport>, AppError> {
    fs::create_dir_all(output_dir)?;

    let reports: Vec<FileReport> = inputs
        .par_iter()
        .map(|input| {
            let output = output_path_for(input, output_dir);
            let outcome = process_file(input, &output, options);
            progress.inc(1);
            FileReport {
                input: input.clone(),
                output,
                outcome,
            }
        })
        .collect();

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::scrub::MEDAL_FIELDS;

    const WIDE_HEADER: &str = "mode,stage,win,medal1-grade,medal1-name,\
A1-weapon,A1-kill,A2-weapon,A2-kill,A3-weapon,A3-kill,A4-weapon,A4-kill,\
B1-weapon,B1-kill,B2-weapon,B2-kill,B3-weapon,B3-kill,B4-weapon,B4-kill";

    const WIDE_ROW: &str = "area,yunohana,alpha,gold,top_kill,\
sshooter,5,wakaba,3,liter4k,7,promodeler,2,\
carbon,4,hydra,1,nzap,6,bucket,0";

    fn options() -> BatchOptions {
        BatchOptions {
            layout: SlotLayout::standard(),
            scrubber: FieldScrubber::medals(),
            force: false,
        }
    }

    fn write_input(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn read_output(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_end_to_end_single_match() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "2022-09-26.csv", &format!("{}\n{}\n", WIDE_HEADER, WIDE_ROW));
        let out_dir = dir.path().join("players");

        let reports = run_batch(&[input], &out_dir, &options(), &ProgressBar::hidden()).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].outcome, FileOutcome::Written { rows: 8, matches: 1 }));
        assert_eq!(reports[0].output, out_dir.join("2022-09-26_players.csv"));

        let (headers, rows) = read_output(&reports[0].output);
        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        assert_eq!(rows.len(), 8);

        for row in &rows {
            assert_eq!(row[col("mode")], "area");
            assert_eq!(row[col("stage")], "yunohana");
            assert_eq!(row[col("match_id")], "0");
        }

        let players: Vec<&str> = rows.iter().map(|r| r[col("player")].as_str()).collect();
        assert_eq!(players, vec!["A1", "A2", "A3", "A4", "B1", "B2", "B3", "B4"]);

        for row in &rows[..4] {
            assert_eq!(row[col("team")], "alpha");
            assert_eq!(row[col("is_win")], "1");
        }
        for row in &rows[4..] {
            assert_eq!(row[col("team")], "bravo");
            assert_eq!(row[col("is_win")], "0");
        }

        assert_eq!(rows[2][col("player_no")], "3");
        assert_eq!(rows[2][col("kill")], "7");

        assert_eq!(rows[4][col("weapon")], "carbon");

        assert_eq!(rows[0][col("medal1-name")], "top_kill");
        for row in &rows[1..] {
            assert_eq!(row[col("medal1-name")], "");
            assert_eq!(row[col("medal1-grade")], "");
        }
    }

    #[test]
    fn test_skip_existing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "d.csv", &format!("{}\n{}\n", WIDE_HEADER, WIDE_ROW));
        let out_dir = dir.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(out_dir.join("d_players.csv"), "stale").unwrap();

        let reports = run_batch(&[input.clone()], &out_dir, &options(), &ProgressBar::hidden()).unwrap();
        assert!(matches!(reports[0].outcome, FileOutcome::Skipped));
        assert_eq!(fs::read_to_string(out_dir.join("d_players.csv")).unwrap(), "stale");

        let mut forced = options();
        forced.force = true;
        let reports = run_batch(&[input], &out_dir, &forced, &ProgressBar::hidden()).unwrap();
        assert!(matches!(reports[0].outcome, FileOutcome::Written { rows: 8, .. }));
    }

    #[test]
    fn test_failed_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_input(dir.path(), "a.csv", &format!("{}\n{}\n", WIDE_HEADER, WIDE_ROW));
        let bad = write_input(dir.path(), "b.csv", "mode,A1-weapon\narea,w,extra\n");
        let out_dir = dir.path().join("out");

        let reports = run_batch(&[good, bad], &out_dir, &options(), &ProgressBar::hidden()).unwrap();
        assert!(matches!(reports[0].outcome, FileOutcome::Written { .. }));
        assert!(matches!(reports[1].outcome, FileOutcome::Failed(AppError::CsvError { .. })));
    }

    #[test]
    fn test_bad_slot_layout_fails_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "x.csv", "mode,AX-weapon\narea,w\n");
        let mut opts = options();
        opts.layout = SlotLayout::new(["A1", "AX"]).unwrap();

        let reports = run_batch(&[input], &dir.path().join("out"), &opts, &ProgressBar::hidden()).unwrap();
        assert!(matches!(&reports[0].outcome, FileOutcome::Failed(AppError::InvalidSlot(l)) if l == "AX"));
    }

    #[test]
    fn test_discover_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(discover_files(dir.path(), "*.csv"), Err(AppError::NoInputFiles(_))));

        write_input(dir.path(), "2022-09-27.csv", "a\n");
        write_input(dir.path(), "2022-09-26.csv", "a\n");
        write_input(dir.path(), "notes.txt", "a\n");
        let files = discover_files(dir.path(), "*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2022-09-26.csv", "2022-09-27.csv"]);
    }

    #[test]
    fn test_medal_field_list_matches_header() {
        let headers: Vec<&str> = WIDE_HEADER.split(',').collect();
        assert!(MEDAL_FIELDS.iter().any(|m| headers.contains(m)));
    }
}
