use super::aggregate::{AggregatedStat, Aggregation, GroupKey};
use crate::error::AppError;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A stat column rows can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatField {
    WinRate,
    Games,
    Wins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: StatField,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: StatField) -> Self {
        SortKey { field, descending: false }
    }

    pub fn desc(field: StatField) -> Self {
        SortKey { field, descending: true }
    }

    fn compare(&self, a: &AggregatedStat, b: &AggregatedStat) -> Ordering {
        let ord = match self.field {
            StatField::WinRate => a.win_rate.partial_cmp(&b.win_rate).unwrap_or(Ordering::Equal),
            StatField::Games => a.games.cmp(&b.games),
            StatField::Wins => a.wins.cmp(&b.wins),
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Win rate first, then sample size, both descending.
pub const BY_WIN_RATE: [SortKey; 2] = [
    SortKey { field: StatField::WinRate, descending: true },
    SortKey { field: StatField::Games, descending: true },
];

/// The top rows of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub partition: Vec<String>,
    pub rows: Vec<AggregatedStat>,
}

fn project(stat: &AggregatedStat, positions: &[usize]) -> Vec<String> {
    positions.iter().map(|&p| stat.key[p].clone()).collect()
}

/// Sorts each partition by `order_by` and keeps its first `top_k` rows.
/// Partitions come out in key order; remaining ties keep aggregation order.
pub fn rank_within(
    agg: &Aggregation,
    partition: &[GroupKey],
    order_by: &[SortKey],
    top_k: usize,
) -> Result<Vec<Ranked>, AppError> {
    let positions = partition
        .iter()
        .map(|k| agg.position(*k))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sorted: Vec<&AggregatedStat> = agg.stats().iter().collect();
    sorted.sort_by(|a, b| {
        project(a, &positions)
            .cmp(&project(b, &positions))
            .then_with(|| {
                order_by
                    .iter()
                    .map(|k| k.compare(a, b))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            })
    });

    let mut ranked: Vec<Ranked> = Vec::new();
    for stat in sorted {
        let key = project(stat, &positions);
        let same_partition = ranked.last().map_or(false, |last| last.partition == key);
        if same_partition {
            if let Some(last) = ranked.last_mut() {
                if last.rows.len() < top_k {
                    last.rows.push(stat.clone());
                }
            }
        } else if top_k > 0 {
            ranked.push(Ranked {
                partition: key,
                rows: vec![stat.clone()],
            });
        }
    }

    Ok(ranked)
}

/// Every row of each partition, best win rate first.
pub fn rank_all(agg: &Aggregation, partition: &[GroupKey]) -> Result<Vec<Ranked>, AppError> {
    rank_within(agg, partition, &BY_WIN_RATE, usize::MAX)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaStat {
    /// Join key values, aligned with the `join_keys` passed to `delta`.
    pub key: Vec<String>,
    pub target: AggregatedStat,
    pub baseline: AggregatedStat,
    pub delta: f64,
}

/// Inner-joins two aggregations on `join_keys` and computes
/// `target.win_rate - baseline.win_rate`, highest delta first.
pub fn delta(
    target: &Aggregation,
    baseline: &Aggregation,
    join_keys: &[GroupKey],
) -> Result<Vec<DeltaStat>, AppError> {
    let target_pos = join_keys
        .iter()
        .map(|k| target.position(*k))
        .collect::<Result<Vec<_>, _>>()?;
    let base_pos = join_keys
        .iter()
        .map(|k| baseline.position(*k))
        .collect::<Result<Vec<_>, _>>()?;

    let mut index: HashMap<Vec<String>, Vec<&AggregatedStat>> = HashMap::new();
    for stat in baseline.stats() {
        index.entry(project(stat, &base_pos)).or_default().push(stat);
    }

    let mut deltas = Vec::new();
    for stat in target.stats() {
        let key = project(stat, &target_pos);
        if let Some(bases) = index.get(&key) {
            for base in bases {
                deltas.push(DeltaStat {
                    key: key.clone(),
                    target: stat.clone(),
                    baseline: (*base).clone(),
                    delta: stat.win_rate - base.win_rate,
                });
            }
        }
    }

    deltas.sort_by(|a, b| b.delta.partial_cmp(&a.delta).unwrap_or(Ordering::Equal));
    Ok(deltas)
}
