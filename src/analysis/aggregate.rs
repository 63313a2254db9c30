use crate::error::AppError;
use crate::players::PlayerRow;
use std::collections::BTreeMap;

/// A column a player row can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GroupKey {
    Mode,
    Stage,
    Weapon,
    StageDisplay,
    WeaponDisplay,
}

impl GroupKey {
    pub fn column(&self) -> &'static str {
        match self {
            GroupKey::Mode => "mode",
            GroupKey::Stage => "stage",
            GroupKey::Weapon => "weapon",
            GroupKey::StageDisplay => "stage_display",
            GroupKey::WeaponDisplay => "weapon_display",
        }
    }

    pub fn value<'a>(&self, row: &'a PlayerRow) -> Result<&'a str, AppError> {
        match self {
            GroupKey::Mode => Ok(row.mode.as_str()),
            GroupKey::Stage => Ok(row.stage.as_str()),
            GroupKey::Weapon => Ok(row.weapon.as_str()),
            GroupKey::StageDisplay => row
                .stage_display
                .as_deref()
                .ok_or(AppError::ColumnNotPopulated(self.column())),
            GroupKey::WeaponDisplay => row
                .weapon_display
                .as_deref()
                .ok_or(AppError::ColumnNotPopulated(self.column())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedStat {
    /// Group values, aligned with `Aggregation::keys`.
    pub key: Vec<String>,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
}

#[derive(Debug, Default)]
struct Tally {
    games: u32,
    wins: u32,
}

impl Tally {
    fn add(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    // Every tally holds at least one game.
    fn win_rate(&self) -> f64 {
        self.wins as f64 / self.games as f64
    }
}

/// Grouped win rates, ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    keys: Vec<GroupKey>,
    stats: Vec<AggregatedStat>,
}

impl Aggregation {
    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    pub fn stats(&self) -> &[AggregatedStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn position(&self, key: GroupKey) -> Result<usize, AppError> {
        self.keys
            .iter()
            .position(|k| *k == key)
            .ok_or(AppError::KeyNotInAggregation(key.column()))
    }

    /// The stat for an exact group key, if the group survived.
    #[cfg(test)]
    pub fn get(&self, key: &[&str]) -> Option<&AggregatedStat> {
        self.stats
            .iter()
            .find(|s| s.key.len() == key.len() && s.key.iter().zip(key).all(|(a, b)| a == b))
    }
}

/// Groups rows by `keys` and computes games, wins and win rate, dropping
/// groups with fewer than `min_games` rows.
pub fn aggregate<'a, I>(rows: I, keys: &[GroupKey], min_games: u32) -> Result<Aggregation, AppError>
where
    I: IntoIterator<Item = &'a PlayerRow>,
{
    let mut tallies: BTreeMap<Vec<String>, Tally> = BTreeMap::new();

    for row in rows {
        let key = keys
            .iter()
            .map(|k| k.value(row).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        tallies.entry(key).or_default().add(row.is_win);
    }

    let stats = tallies
        .into_iter()
        .filter(|(_, t)| t.games >= min_games)
        .map(|(key, t)| AggregatedStat {
            win_rate: t.win_rate(),
            key,
            games: t.games,
            wins: t.wins,
        })
        .collect();

    Ok(Aggregation {
        keys: keys.to_vec(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(mode: &str, stage: &str, weapon: &str, won: bool) -> PlayerRow {
        PlayerRow::new(mode, stage, weapon, "alpha", if won { "alpha" } else { "bravo" })
    }

    #[test]
    fn test_aggregate_counts_and_rates() {
        let rows = vec![
            row("area", "s1", "w1", true),
            row("area", "s1", "w1", false),
            row("area", "s1", "w1", true),
            row("area", "s1", "w2", true),
            row("area", "s1", "w2", true),
            row("hoko", "s1", "w1", false),
        ];
        let agg = aggregate(&rows, &[GroupKey::Mode, GroupKey::Stage, GroupKey::Weapon], 0).unwrap();

        assert_eq!(agg.len(), 3);
        let w1 = agg.get(&["area", "s1", "w1"]).unwrap();
        assert_eq!((w1.games, w1.wins), (3, 2));
        assert!((w1.win_rate - 2.0 / 3.0).abs() < 1e-12);

        let w2 = agg.get(&["area", "s1", "w2"]).unwrap();
        assert_eq!(w2.win_rate, 1.0);

        let hoko = agg.get(&["hoko", "s1", "w1"]).unwrap();
        assert_eq!(hoko.win_rate, 0.0);
    }

    #[test]
    fn test_aggregate_min_games_filter() {
        let rows = vec![
            row("area", "s1", "w1", true),
            row("area", "s1", "w1", false),
            row("area", "s1", "w2", true),
        ];
        let agg = aggregate(&rows, &[GroupKey::Weapon], 2).unwrap();
        assert_eq!(agg.len(), 1);
        assert!(agg.get(&["w1"]).is_some());
        assert!(agg.get(&["w2"]).is_none());

        let empty = aggregate(&rows, &[GroupKey::Weapon], 10).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_aggregate_is_ordered_by_key() {
        let rows = vec![row("yagura", "b", "w", true), row("area", "z", "w", true), row("area", "a", "w", true)];
        let agg = aggregate(&rows, &[GroupKey::Mode, GroupKey::Stage], 0).unwrap();
        let keys: Vec<_> = agg.stats().iter().map(|s| s.key.join("/")).collect();
        assert_eq!(keys, vec!["area/a", "area/z", "yagura/b"]);
    }

    #[test]
    fn test_aggregate_display_key_requires_enrichment() {
        let rows = vec![row("area", "s1", "w1", true)];
        let err = aggregate(&rows, &[GroupKey::Mode, GroupKey::StageDisplay], 0).unwrap_err();
        assert!(matches!(err, AppError::ColumnNotPopulated("stage_display")));
    }

    #[test]
    fn test_aggregate_filtered_iterator() {
        let rows = vec![row("area", "s1", "w1", true), row("area", "s1", "w2", false)];
        let agg = aggregate(rows.iter().filter(|r| r.weapon == "w2"), &[GroupKey::Stage], 0).unwrap();
        assert_eq!(agg.stats()[0].games, 1);
        assert_eq!(agg.stats()[0].wins, 0);
    }

    #[test]
    fn test_position() {
        let rows: Vec<PlayerRow> = Vec::new();
        let agg = aggregate(&rows, &[GroupKey::Mode, GroupKey::Stage], 0).unwrap();
        assert!(agg.is_empty());
        assert_eq!(agg.position(GroupKey::Stage).unwrap(), 1);
        assert!(matches!(
            agg.position(GroupKey::Weapon),
            Err(AppError::KeyNotInAggregation("weapon"))
        ));
    }
}
