use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::champion_stats::{FrequencyEntry, FrequencyTable};

/// Percentage of games won, 0 when there are no games.
pub fn win_rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        (wins as f64 / games as f64) * 100.0
    }
}

/// Share of observed ranked matches in which the champion was played.
pub fn pick_rate(champion_games: u32, ranked_matches: u32) -> f64 {
    if ranked_matches == 0 {
        0.0
    } else {
        (champion_games as f64 / ranked_matches as f64) * 100.0
    }
}

/// Higher win rate first, then more games. Key order keeps the result
/// stable when both tie.
fn by_win_rate<P>(a: &FrequencyEntry<P>, b: &FrequencyEntry<P>) -> Ordering {
    b.win_rate()
        .partial_cmp(&a.win_rate())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.games.cmp(&a.games))
        .then_with(|| a.key.cmp(&b.key))
}

pub fn rank<P>(table: &FrequencyTable<P>) -> Vec<&FrequencyEntry<P>> {
    let mut entries: Vec<&FrequencyEntry<P>> = table.entries().collect();
    entries.sort_by(|a, b| by_win_rate(a, b));
    entries
}

/// Payload of the top-ranked entry, if the table has any.
pub fn best<P: Clone>(table: &FrequencyTable<P>) -> Option<P> {
    rank(table).first().map(|e| e.payload.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStats {
    pub role: String,
    pub games_played: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// Per-role breakdown, in no particular order.
pub fn role_breakdown(roles: &FrequencyTable<()>) -> Vec<RoleStats> {
    roles
        .entries()
        .map(|e| RoleStats {
            role: e.key.clone(),
            games_played: e.games,
            wins: e.wins,
            win_rate: e.win_rate(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, u32, u32)]) -> FrequencyTable<String> {
        let mut table = FrequencyTable::new();
        for (key, games, wins) in rows {
            for i in 0..*games {
                table.record(key.to_string(), i < *wins, || key.to_string());
            }
        }
        table
    }

    #[test]
    fn higher_win_rate_beats_more_games() {
        let t = table(&[("seven-of-ten", 10, 7), ("four-of-four", 4, 4)]);
        let ranked: Vec<&str> = rank(&t).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(ranked, vec!["four-of-four", "seven-of-ten"]);
        assert_eq!(best(&t).as_deref(), Some("four-of-four"));
    }

    #[test]
    fn equal_win_rate_prefers_more_games() {
        let t = table(&[("small", 2, 1), ("large", 8, 4), ("mid", 4, 2)]);
        let ranked: Vec<&str> = rank(&t).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(ranked, vec!["large", "mid", "small"]);
    }

    #[test]
    fn empty_table_has_no_best() {
        let t: FrequencyTable<String> = FrequencyTable::new();
        assert!(best(&t).is_none());
        assert!(rank(&t).is_empty());
    }

    #[test]
    fn rates_never_divide_by_zero() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert_eq!(pick_rate(0, 0), 0.0);
        assert_eq!(pick_rate(5, 0), 0.0);
        assert_eq!(pick_rate(5, 20), 25.0);
        assert_eq!(win_rate(7, 10), 70.0);
    }

    #[test]
    fn role_breakdown_carries_counts() {
        let mut roles = FrequencyTable::new();
        roles.record("MIDDLE".into(), true, || ());
        roles.record("MIDDLE".into(), false, || ());

        let breakdown = role_breakdown(&roles);
        assert_eq!(
            breakdown,
            vec![RoleStats { role: "MIDDLE".into(), games_played: 2, wins: 1, win_rate: 50.0 }]
        );
    }
}
