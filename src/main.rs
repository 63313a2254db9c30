mod analysis;
mod api;
mod cache;
mod config;
mod display;
mod error;
mod ingest;
mod players;
mod reshape;

use analysis::aggregate::{aggregate, AggregatedStat, GroupKey};
use analysis::dictionary::NameDictionary;
use analysis::rank::{delta, rank_all, rank_within, SortKey, StatField, BY_WIN_RATE};
use anyhow::{Context, Result};
use api::client::StatInkClient;
use cache::DictionaryCache;
use clap::{Args as ClapArgs, Parser, Subcommand};
use config::{Config, ModeLabels};
use display::export::{export_path, write_delta_csv, write_stats_csv};
use display::output::{
    display_aggregation, display_batch_summary, display_deltas, display_error, display_info,
    display_stage_winrate, display_success, display_top_weapons, display_warning,
};
use indicatif::ProgressBar;
use ingest::{discover_files, run_batch, BatchOptions, FileOutcome};
use players::{load_players, PlayerRow};
use reshape::scrub::FieldScrubber;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Splat Winrate")]
#[command(about = "Unpivot battle results and report weapon win rates", long_about = None)]
struct Args {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reshape wide battle-result CSVs into per-player CSVs
    Unpivot {
        /// Directory of wide battle-result CSVs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory for <stem>_players.csv outputs
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Rewrite outputs that already exist
        #[arg(long)]
        force: bool,
    },

    /// Best weapons per mode and stage
    TopWeapons {
        #[arg(long, default_value = "10")]
        min_games: u32,

        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Group by localized stage and weapon names
        #[arg(long)]
        localized: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// One weapon's win rate on every stage
    StageWinrate {
        /// Weapon key or localized name
        weapon: String,

        #[arg(long, default_value = "1")]
        min_games: u32,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// One weapon's per-stage win rate against all weapons
    Delta {
        /// Weapon key or localized name
        weapon: String,

        #[arg(long, default_value = "300")]
        min_games_base: u32,

        #[arg(long, default_value = "150")]
        min_games_weapon: u32,

        /// Show at most this many stages per mode
        #[arg(long)]
        max_stages: Option<usize>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Win rates grouped by any combination of keys
    Aggregate {
        #[arg(long, value_enum, value_delimiter = ',', required = true)]
        by: Vec<GroupKey>,

        #[arg(long, default_value = "0")]
        min_games: u32,

        /// Order groups by this stat, highest first
        #[arg(long, value_enum)]
        sort: Option<StatField>,

        /// Lowest first instead
        #[arg(long, requires = "sort")]
        ascending: bool,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct SourceArgs {
    /// Directory of *_players.csv files
    #[arg(long)]
    players_dir: Option<PathBuf>,

    /// Analyze a single players CSV instead
    #[arg(long)]
    file: Option<PathBuf>,

    /// Refetch the name dictionary (ignore cache)
    #[arg(long)]
    refresh: bool,

    /// Also write the result rows as CSV into the analytics output directory
    #[arg(long)]
    export: bool,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    match args.command {
        Commands::Unpivot {
            input_dir,
            output_dir,
            force,
        } => run_unpivot(&config, input_dir, output_dir, force),
        Commands::TopWeapons {
            min_games,
            top_k,
            localized,
            source,
        } => run_top_weapons(&config, &source, min_games, top_k, localized),
        Commands::StageWinrate {
            weapon,
            min_games,
            source,
        } => run_stage_winrate(&config, &source, &weapon, min_games),
        Commands::Delta {
            weapon,
            min_games_base,
            min_games_weapon,
            max_stages,
            source,
        } => run_delta(&config, &source, &weapon, min_games_base, min_games_weapon, max_stages),
        Commands::Aggregate {
            by,
            min_games,
            sort,
            ascending,
            source,
        } => {
            let order = sort.map(|field| if ascending { SortKey::asc(field) } else { SortKey::desc(field) });
            run_aggregate(&config, &source, &by, min_games, order)
        }
    }
}

fn run_unpivot(config: &Config, input_dir: Option<PathBuf>, output_dir: Option<PathBuf>, force: bool) -> Result<()> {
    let input_dir = input_dir.unwrap_or_else(|| config.battle_results_dir.clone());
    let output_dir = output_dir.unwrap_or_else(|| config.players_dir.clone());

    let inputs = discover_files(&input_dir, "*.csv").context("discovering battle-result files")?;
    display_info(&format!(
        "Unpivoting {} files from {} into {}",
        inputs.len(),
        input_dir.display(),
        output_dir.display()
    ));

    let options = BatchOptions {
        layout: config.slots.clone(),
        scrubber: FieldScrubber::new(config.canonical_fields.iter(), &config.canonical_slot),
        force,
    };

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_message("Unpivoting battle results");
    let reports = run_batch(&inputs, &output_dir, &options, &pb).context("running unpivot batch")?;
    pb.finish_with_message("✓ Unpivot finished");

    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, FileOutcome::Failed(_)))
        .count();
    info!("unpivot: {} files, {} failed", reports.len(), failed);

    display_batch_summary(&reports);
    Ok(())
}

/// Restores the dictionary from cache when fresh, otherwise fetches it.
fn load_dictionary(config: &Config, refresh: bool) -> Result<NameDictionary> {
    let path = DictionaryCache::default_path(&config.locale);

    if !refresh {
        match DictionaryCache::load(&path) {
            Ok(Some(cache)) if cache.is_usable(&config.locale, config.dictionary_max_age_hours) => {
                debug!("dictionary restored from {}", path.display());
                display_success("⚡ Using cached name dictionary");
                return Ok(cache.into_dictionary());
            }
            Ok(_) => {}
            Err(e) => warn!("ignoring dictionary cache: {}", e),
        }
    }

    display_info("Fetching stage and weapon names from stat.ink...");
    let client = StatInkClient::new(config);
    let mut dict = NameDictionary::new();
    dict.load(&client, &config.locale)
        .context("loading stage/weapon name dictionary")?;
    display_success(&format!(
        "Loaded {} stages and {} weapons",
        dict.stages().len(),
        dict.weapons().len()
    ));

    match DictionaryCache::from_dictionary(&dict, &config.locale).and_then(|c| c.save(&path)) {
        Ok(()) => debug!("dictionary cached at {}", path.display()),
        Err(e) => warn!("could not cache dictionary: {}", e),
    }

    Ok(dict)
}

/// Loads player rows, enriching them with display names when asked.
fn load_rows(config: &Config, source: &SourceArgs, localized: bool) -> Result<Vec<PlayerRow>> {
    let dir = source.players_dir.as_deref().unwrap_or(&config.players_dir);
    let report = load_players(dir, source.file.as_deref()).context("loading player rows")?;

    for (path, e) in &report.failures {
        display_warning(&format!("skipped {}: {}", path.display(), e));
    }
    display_success(&format!(
        "Loaded {} player rows from {} files",
        report.rows.len(),
        report.files_loaded
    ));

    let mut rows = report.rows;
    if localized {
        let dict = load_dictionary(config, source.refresh)?;
        dict.enrich(&mut rows).context("enriching player rows")?;
    }
    Ok(rows)
}

fn export_stats(path: &Path, keys: &[GroupKey], stats: &[AggregatedStat]) -> Result<()> {
    write_stats_csv(path, keys, stats).with_context(|| format!("exporting {}", path.display()))?;
    display_success(&format!("Exported {}", path.display()));
    Ok(())
}

fn run_top_weapons(config: &Config, source: &SourceArgs, min_games: u32, top_k: usize, localized: bool) -> Result<()> {
    let rows = load_rows(config, source, localized)?;
    let keys = if localized {
        [GroupKey::Mode, GroupKey::StageDisplay, GroupKey::WeaponDisplay]
    } else {
        [GroupKey::Mode, GroupKey::Stage, GroupKey::Weapon]
    };

    let agg = aggregate(&rows, &keys, min_games)?;
    let ranked = rank_within(&agg, &keys[..2], &BY_WIN_RATE, top_k)?;
    display_top_weapons(&ranked, &ModeLabels::default(), top_k, min_games);

    if source.export {
        let stats: Vec<AggregatedStat> = ranked.into_iter().flat_map(|r| r.rows).collect();
        let name = format!("top_weapons_min{}_top{}", min_games, top_k);
        export_stats(&export_path(&config.output_dir, &name), &keys, &stats)?;
    }
    Ok(())
}

fn run_stage_winrate(config: &Config, source: &SourceArgs, weapon: &str, min_games: u32) -> Result<()> {
    let rows = load_rows(config, source, true)?;
    let keys = [GroupKey::Mode, GroupKey::StageDisplay];

    let agg = aggregate(rows.iter().filter(|r| r.uses_weapon(weapon)), &keys, min_games)?;
    if agg.is_empty() {
        warn!("no rows for weapon {}", weapon);
    }
    let ranked = rank_all(&agg, &keys[..1])?;
    display_stage_winrate(weapon, &ranked, &ModeLabels::default(), min_games);

    if source.export {
        let stats: Vec<AggregatedStat> = ranked.into_iter().flat_map(|r| r.rows).collect();
        let name = format!("{}_stage_winrate", weapon);
        export_stats(&export_path(&config.output_dir, &name), &keys, &stats)?;
    }
    Ok(())
}

fn run_delta(
    config: &Config,
    source: &SourceArgs,
    weapon: &str,
    min_games_base: u32,
    min_games_weapon: u32,
    max_stages: Option<usize>,
) -> Result<()> {
    let rows = load_rows(config, source, true)?;
    let keys = [GroupKey::Mode, GroupKey::StageDisplay];

    let baseline = aggregate(&rows, &keys, min_games_base)?;
    let target = aggregate(rows.iter().filter(|r| r.uses_weapon(weapon)), &keys, min_games_weapon)?;
    let deltas = delta(&target, &baseline, &keys)?;

    let modes = ModeLabels::default();
    let present: Vec<&str> = rows.iter().map(|r| r.mode.as_str()).collect();
    for mode in modes.order(present) {
        let shown: Vec<_> = deltas
            .iter()
            .filter(|d| d.key[0] == mode)
            .take(max_stages.unwrap_or(usize::MAX))
            .collect();
        display_deltas(weapon, modes.label(&mode), &shown, min_games_base, min_games_weapon);
    }

    if source.export {
        let name = format!("{}_delta_base{}_wpn{}", weapon, min_games_base, min_games_weapon);
        let path = export_path(&config.output_dir, &name);
        write_delta_csv(&path, &keys, &deltas).with_context(|| format!("exporting {}", path.display()))?;
        display_success(&format!("Exported {}", path.display()));
    }
    Ok(())
}

fn run_aggregate(
    config: &Config,
    source: &SourceArgs,
    by: &[GroupKey],
    min_games: u32,
    order: Option<SortKey>,
) -> Result<()> {
    let localized = by
        .iter()
        .any(|k| matches!(k, GroupKey::StageDisplay | GroupKey::WeaponDisplay));
    let rows = load_rows(config, source, localized)?;

    let agg = aggregate(&rows, by, min_games)?;
    info!("aggregate: {} groups with n>={}", agg.len(), min_games);

    let stats: Vec<AggregatedStat> = match order {
        Some(primary) => rank_within(&agg, &[], &[primary, SortKey::desc(StatField::Games)], usize::MAX)?
            .into_iter()
            .flat_map(|r| r.rows)
            .collect(),
        None => agg.stats().to_vec(),
    };
    display_aggregation(by, &stats);

    if source.export {
        let columns: Vec<&str> = by.iter().map(|k| k.column()).collect();
        let name = format!("winrate_by_{}", columns.join("_"));
        export_stats(&export_path(&config.output_dir, &name), by, &stats)?;
    }
    Ok(())
}
