use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::matches::MatchFetcher;
use super::ranking;
use crate::api::endpoints::RANKED_SOLO_QUEUE_ID;
use crate::api::models::{MatchDto, ParticipantDto, TimelineDto, SKILL_LEVEL_UP};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyEntry<P> {
    pub key: String,
    pub games: u32,
    pub wins: u32,
    /// Representative value for the group, taken from its first occurrence.
    pub payload: P,
}

impl<P> FrequencyEntry<P> {
    /// Percentage in [0, 100]; 0 when no games were recorded.
    pub fn win_rate(&self) -> f64 {
        ranking::win_rate(self.wins, self.games)
    }
}

#[derive(Debug, Clone)]
pub struct FrequencyTable<P> {
    entries: HashMap<String, FrequencyEntry<P>>,
}

impl<P> FrequencyTable<P> {
    pub fn new() -> Self {
        FrequencyTable {
            entries: HashMap::new(),
        }
    }

    pub fn record(&mut self, key: String, won: bool, payload: impl FnOnce() -> P) {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| FrequencyEntry {
            key,
            games: 0,
            wins: 0,
            payload: payload(),
        });

        entry.games += 1;
        if won {
            entry.wins += 1;
        }
    }

    /// Sums games and wins per key; payloads already present win.
    pub fn merge(&mut self, other: FrequencyTable<P>) {
        for (key, incoming) in other.entries {
            match self.entries.get_mut(&key) {
                Some(entry) => {
                    entry.games += incoming.games;
                    entry.wins += incoming.wins;
                }
                None => {
                    self.entries.insert(key, incoming);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FrequencyEntry<P>> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &FrequencyEntry<P>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Default for FrequencyTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub item0: i64,
    pub item1: i64,
    pub item2: i64,
    pub item3: i64,
    pub item4: i64,
    pub item5: i64,
    pub item6: i64,
}

impl Build {
    pub fn slots(&self) -> [i64; 6] {
        [self.item0, self.item1, self.item2, self.item3, self.item4, self.item5]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runes {
    pub stat_perks: Value,
    pub styles: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerSpells {
    pub summoner1_id: i64,
    pub summoner2_id: i64,
}

pub type SkillOrder = Vec<i64>;

/// One frequency table per grouped attribute.
#[derive(Debug, Clone, Default)]
pub struct AggregationAccumulator {
    pub builds: FrequencyTable<Build>,
    pub runes: FrequencyTable<Runes>,
    pub spells: FrequencyTable<SummonerSpells>,
    pub skill_orders: FrequencyTable<SkillOrder>,
    pub roles: FrequencyTable<()>,
}

impl AggregationAccumulator {
    pub fn merge(&mut self, other: AggregationAccumulator) {
        self.builds.merge(other.builds);
        self.runes.merge(other.runes);
        self.spells.merge(other.spells);
        self.skill_orders.merge(other.skill_orders);
        self.roles.merge(other.roles);
    }

    /// Tallies build, runes, spells and role for one qualifying game.
    pub fn record_participant(&mut self, participant: &ParticipantDto) {
        let won = participant.win;
        self.builds.record(build_key(participant), won, || Build {
            item0: participant.item0,
            item1: participant.item1,
            item2: participant.item2,
            item3: participant.item3,
            item4: participant.item4,
            item5: participant.item5,
            item6: participant.item6,
        });

        let runes = runes_of(participant);
        self.runes.record(rune_key(&runes), won, || runes.clone());

        self.spells.record(spell_key(participant), won, || SummonerSpells {
            summoner1_id: participant.summoner1_id,
            summoner2_id: participant.summoner2_id,
        });

        self.roles.record(role_key(participant), won, || ());
    }

    pub fn record_skill_order(&mut self, order: SkillOrder, won: bool) {
        self.skill_orders.record(skill_order_key(&order), won, || order);
    }
}

/// The six inventory slots in slot order; the trinket slot is not part of it.
pub fn build_key(p: &ParticipantDto) -> String {
    [p.item0, p.item1, p.item2, p.item3, p.item4, p.item5]
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn runes_of(p: &ParticipantDto) -> Runes {
    let field = |name: &str| {
        p.perks
            .as_ref()
            .and_then(|perks| perks.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    };
    Runes {
        stat_perks: field("statPerks"),
        styles: field("styles"),
    }
}

/// Serialized as received: field order inside the perk objects is kept, so
/// equal pages sent with different key order land in different groups.
pub fn rune_key(runes: &Runes) -> String {
    json!({ "statPerks": runes.stat_perks, "styles": runes.styles }).to_string()
}

pub fn spell_key(p: &ParticipantDto) -> String {
    format!("{}-{}", p.summoner1_id, p.summoner2_id)
}

pub fn role_key(p: &ParticipantDto) -> String {
    if !p.team_position.is_empty() {
        p.team_position.clone()
    } else if !p.role.is_empty() {
        p.role.clone()
    } else {
        "UNKNOWN".to_string()
    }
}

pub fn skill_order_key(order: &[i64]) -> String {
    order.iter().map(|slot| slot.to_string()).collect::<Vec<_>>().join("-")
}

/// Skill slots levelled by `participant_id` (1-based), in frame order.
pub fn skill_order(timeline: &TimelineDto, participant_id: i64) -> SkillOrder {
    timeline
        .info
        .frames
        .iter()
        .flat_map(|frame| frame.events.iter())
        .filter(|ev| ev.kind == SKILL_LEVEL_UP && ev.participant_id == Some(participant_id))
        .filter_map(|ev| ev.skill_slot)
        .collect()
}

/// 1-based participant id of `puuid` from the match's metadata ordering.
pub fn participant_id(game: &MatchDto, puuid: &str) -> Option<i64> {
    game.metadata
        .participants
        .iter()
        .position(|p| p == puuid)
        .map(|index| index as i64 + 1)
}

#[derive(Debug, Clone)]
pub struct StatsQuery {
    pub champion_id: i64,
    pub patch_prefix: Option<String>,
    pub include_timeline: bool,
}

/// One account's contribution to a champion run.
#[derive(Debug, Clone, Default)]
pub struct AccountStats {
    pub tallies: AggregationAccumulator,
    pub games_played: u32,
    pub wins: u32,
    /// Ranked solo matches on the requested patch, whoever was played.
    pub ranked_matches: u32,
    /// Match ids pulled from history; this is what the budget is charged.
    pub matches_fetched: usize,
}

/// Aggregation for one account stopped partway. Ids already read from its
/// history still count against the run's match budget.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct AccountError {
    pub matches_fetched: usize,
    pub source: AppError,
}

pub struct StatsAggregator<'a> {
    fetcher: &'a MatchFetcher,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(fetcher: &'a MatchFetcher) -> Self {
        StatsAggregator { fetcher }
    }

    pub fn compute_for_account(
        &self,
        region: &str,
        puuid: &str,
        query: &StatsQuery,
        max_matches: usize,
    ) -> Result<AccountStats, AccountError> {
        let match_ids = self
            .fetcher
            .list_match_ids(region, puuid, max_matches)
            .map_err(|source| AccountError { matches_fetched: 0, source })?;
        let mut stats = AccountStats {
            matches_fetched: match_ids.len(),
            ..AccountStats::default()
        };

        for match_id in &match_ids {
            let game = self
                .fetcher
                .fetch_match(region, match_id)
                .map_err(|source| AccountError { matches_fetched: match_ids.len(), source })?;
            if game.info.queue_id != RANKED_SOLO_QUEUE_ID {
                continue;
            }
            if let Some(prefix) = query.patch_prefix.as_deref() {
                if !game.info.game_version.starts_with(prefix) {
                    continue;
                }
            }
            stats.ranked_matches += 1;

            let Some(participant) = game
                .info
                .participants
                .iter()
                .find(|p| p.puuid == puuid && p.champion_id == query.champion_id)
            else {
                continue;
            };

            stats.games_played += 1;
            if participant.win {
                stats.wins += 1;
            }
            stats.tallies.record_participant(participant);

            if query.include_timeline {
                self.tally_skill_order(region, &game, puuid, participant.win, &mut stats.tallies);
            }
        }

        tracing::debug!(
            account = puuid,
            fetched = stats.matches_fetched,
            ranked = stats.ranked_matches,
            games = stats.games_played,
            "account aggregated"
        );
        Ok(stats)
    }

    fn tally_skill_order(
        &self,
        region: &str,
        game: &MatchDto,
        puuid: &str,
        won: bool,
        tallies: &mut AggregationAccumulator,
    ) {
        let match_id = game.metadata.match_id.as_str();
        let Some(participant_id) = participant_id(game, puuid) else {
            tracing::debug!(match_id, "account missing from match metadata, no skill order");
            return;
        };

        match self.fetcher.fetch_timeline(region, match_id) {
            Ok(timeline) => tallies.record_skill_order(skill_order(&timeline, participant_id), won),
            Err(e) => tracing::warn!(match_id, error = %e, "timeline fetch failed, skipping skill order"),
        }
    }
}
