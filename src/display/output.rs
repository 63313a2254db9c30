use crate::analysis::aggregate::{AggregatedStat, GroupKey};
use crate::analysis::rank::{DeltaStat, Ranked};
use crate::config::ModeLabels;
use crate::ingest::{FileOutcome, FileReport};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FileRow {
    input: String,
    output: String,
    result: String,
    rows: String,
}

#[derive(Tabled)]
struct RankRow {
    rank: String,
    name: String,
    win_rate: String,
    sample: String,
}

#[derive(Tabled)]
struct DeltaRow {
    stage: String,
    delta: String,
    weapon: String,
    baseline: String,
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn sample(stat: &AggregatedStat) -> String {
    format!("n={} (w={})", stat.games, stat.wins)
}

fn heading(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message);
}

pub fn display_batch_summary(reports: &[FileReport]) {
    let mut done = 0;
    let mut skipped = 0;
    let mut failed = 0;

    let rows: Vec<FileRow> = reports
        .iter()
        .map(|report| {
            let (result, rows) = match &report.outcome {
                FileOutcome::Written { rows, matches } => {
                    done += 1;
                    ("OK".green().to_string(), format!("{} ({} matches)", rows, matches))
                }
                FileOutcome::Skipped => {
                    skipped += 1;
                    ("SKIP (exists)".yellow().to_string(), String::new())
                }
                FileOutcome::Failed(e) => {
                    failed += 1;
                    (format!("{} {}", "FAIL".red(), e), String::new())
                }
            };
            FileRow {
                input: file_name(&report.input),
                output: file_name(&report.output),
                result,
                rows,
            }
        })
        .collect();

    heading("📂 UNPIVOT RESULTS");
    print_table(rows);
    println!(
        "\n{} {} done / {} skipped / {} failed\n",
        "Summary:".bold(),
        done.to_string().green(),
        skipped.to_string().yellow(),
        failed.to_string().red()
    );
}

/// Top weapons per (mode, stage) partition, modes in presentation order.
pub fn display_top_weapons(ranked: &[Ranked], modes: &ModeLabels, top_k: usize, min_games: u32) {
    if ranked.is_empty() {
        display_warning(&format!("No weapon reached n>={} in any stage", min_games));
        return;
    }

    for mode in modes.order(ranked.iter().map(|r| r.partition[0].as_str())) {
        for part in ranked.iter().filter(|r| r.partition[0] == mode) {
            heading(&format!(
                "🏆 {} / {}: win rate TOP{} weapons (n>={})",
                modes.label(&mode),
                part.partition[1],
                top_k,
                min_games
            ));
            let rows = part
                .rows
                .iter()
                .enumerate()
                .map(|(idx, stat)| RankRow {
                    rank: format!("#{}", idx + 1),
                    name: stat.key.last().cloned().unwrap_or_default(),
                    win_rate: pct(stat.win_rate),
                    sample: sample(stat),
                })
                .collect();
            print_table(rows);
        }
    }
    println!();
}

/// One weapon's win rate by stage, one table per mode.
pub fn display_stage_winrate(weapon: &str, ranked: &[Ranked], modes: &ModeLabels, min_games: u32) {
    let present: Vec<&str> = ranked.iter().map(|r| r.partition[0].as_str()).collect();
    if present.is_empty() {
        display_warning(&format!("{}: no stage with n>={}", weapon, min_games));
        return;
    }

    for mode in modes.order(present) {
        let Some(part) = ranked.iter().find(|r| r.partition[0] == mode) else {
            continue;
        };
        heading(&format!(
            "🗺️ {}: {} win rate by stage (n>={})",
            weapon,
            modes.label(&mode),
            min_games
        ));
        let rows = part
            .rows
            .iter()
            .enumerate()
            .map(|(idx, stat)| RankRow {
                rank: format!("#{}", idx + 1),
                name: stat.key[1].clone(),
                win_rate: pct(stat.win_rate),
                sample: sample(stat),
            })
            .collect();
        print_table(rows);
    }
    println!();
}

/// Per-stage delta against the baseline for one mode, already ordered.
pub fn display_deltas(weapon: &str, mode_label: &str, deltas: &[&DeltaStat], min_base: u32, min_weapon: u32) {
    if deltas.is_empty() {
        display_warning(&format!("{}: no data after filters", mode_label));
        return;
    }

    heading(&format!(
        "📈 {}: {} stage win rate delta vs all weapons (baseline n>={}, weapon n>={})",
        weapon, mode_label, min_base, min_weapon
    ));

    let rows = deltas
        .iter()
        .map(|d| {
            let delta = format!("{:+.1}%", d.delta * 100.0);
            DeltaRow {
                stage: d.key[1].clone(),
                delta: if d.delta >= 0.0 {
                    delta.green().to_string()
                } else {
                    delta.red().to_string()
                },
                weapon: format!("{} (n={})", pct(d.target.win_rate), d.target.games),
                baseline: format!("{} (n={})", pct(d.baseline.win_rate), d.baseline.games),
            }
        })
        .collect();
    print_table(rows);
}

pub fn display_aggregation(keys: &[GroupKey], stats: &[AggregatedStat]) {
    if stats.is_empty() {
        display_warning("No groups reached the minimum sample size");
        return;
    }

    let columns: Vec<&str> = keys.iter().map(|k| k.column()).collect();
    heading(&format!("📊 Win rate by {}", columns.join(" × ")));

    let rows = stats
        .iter()
        .enumerate()
        .map(|(idx, stat)| RankRow {
            rank: format!("{}", idx + 1),
            name: stat.key.join(" / "),
            win_rate: pct(stat.win_rate),
            sample: sample(stat),
        })
        .collect();
    print_table(rows);
    println!();
}
