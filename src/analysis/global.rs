//! Champion-wide statistics across high-rank seed accounts.
//!
//! A run resolves the champion, samples the challenger / grandmaster /
//! master ladders for seed accounts and aggregates their recent ranked games
//! one account at a time under a shared match budget. Accounts are never
//! processed concurrently: budget accounting and governor state stay
//! deterministic that way.

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::champion_stats::{
    AccountStats, AggregationAccumulator, Build, Runes, SkillOrder, StatsAggregator, StatsQuery,
    SummonerSpells,
};
use super::matches::MatchFetcher;
use super::ranking::{self, RoleStats};
use crate::api::client::{ChampionRef, RiotApiClient};
use crate::api::endpoints::{self, SeedTier};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionGlobalSummary {
    pub champion_name: String,
    pub champion_id: i64,
    pub patch: String,
    pub games_played: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub pick_rate: f64,
    pub best_build: Option<Build>,
    pub best_runes: Option<Runes>,
    pub best_spells: Option<SummonerSpells>,
    pub best_skill_order: SkillOrder,
    pub roles: Vec<RoleStats>,
    pub processed_account_ids: Vec<String>,
}

/// Running totals across every processed account.
#[derive(Debug, Default)]
struct RunTotals {
    tallies: AggregationAccumulator,
    games_played: u32,
    wins: u32,
    ranked_matches: u32,
}

impl RunTotals {
    fn absorb(&mut self, stats: AccountStats) {
        self.games_played += stats.games_played;
        self.wins += stats.wins;
        self.ranked_matches += stats.ranked_matches;
        self.tallies.merge(stats.tallies);
    }

    fn into_summary(
        self,
        champion: &ChampionRef,
        patch: &str,
        processed_account_ids: Vec<String>,
    ) -> ChampionGlobalSummary {
        let tallies = &self.tallies;
        ChampionGlobalSummary {
            champion_name: champion.name.clone(),
            champion_id: champion.id,
            patch: patch.to_string(),
            games_played: self.games_played,
            wins: self.wins,
            win_rate: ranking::win_rate(self.wins, self.games_played),
            pick_rate: ranking::pick_rate(self.games_played, self.ranked_matches),
            best_build: ranking::best(&tallies.builds),
            best_runes: ranking::best(&tallies.runes),
            best_spells: ranking::best(&tallies.spells),
            best_skill_order: ranking::best(&tallies.skill_orders).unwrap_or_default(),
            roles: ranking::role_breakdown(&tallies.roles),
            processed_account_ids,
        }
    }
}

pub struct GlobalStatsOrchestrator {
    client: Arc<RiotApiClient>,
    fetcher: MatchFetcher,
    include_timelines: bool,
    progress: ProgressBar,
}

impl GlobalStatsOrchestrator {
    pub fn new(client: Arc<RiotApiClient>) -> Self {
        GlobalStatsOrchestrator {
            fetcher: MatchFetcher::new(Arc::clone(&client)),
            client,
            include_timelines: false,
            progress: ProgressBar::hidden(),
        }
    }

    /// Also fetch timelines so skill order can be ranked. Costs one extra
    /// call per qualifying match.
    pub fn with_timelines(mut self, include: bool) -> Self {
        self.include_timelines = include;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Unique account ids from the top three ladders, in ladder order. A
    /// ladder or summoner lookup that fails is logged and skipped.
    pub fn discover_seed_accounts(&self, region: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut accounts = Vec::new();

        for tier in SeedTier::ALL {
            let league = match self.client.league_entries(region, tier) {
                Ok(league) => league,
                Err(e) => {
                    tracing::warn!(tier = tier.name(), error = %e, "failed to fetch league entries");
                    continue;
                }
            };

            for entry in league.entries {
                let puuid = match (entry.puuid, entry.summoner_id) {
                    (Some(puuid), _) => puuid,
                    (None, Some(summoner_id)) => {
                        match self.client.puuid_for_summoner(region, &summoner_id) {
                            Ok(puuid) => puuid,
                            Err(e) => {
                                tracing::warn!(summoner_id = %summoner_id, error = %e, "failed to resolve summoner");
                                continue;
                            }
                        }
                    }
                    (None, None) => continue,
                };
                if seen.insert(puuid.clone()) {
                    accounts.push(puuid);
                }
            }
        }

        accounts
    }

    /// Builds the summary for `champion_name` on the latest patch, reading at
    /// most `match_budget` match ids across all seed accounts. The API key is
    /// the one the client's transport was built with.
    ///
    /// Returns `Ok(None)` when the name matches no champion. An account that
    /// fails partway is skipped, but the ids it already read are still charged.
    pub fn get_champion_global_stats(
        &self,
        champion_name: &str,
        region: &str,
        match_budget: usize,
    ) -> Result<Option<ChampionGlobalSummary>, AppError> {
        let region = endpoints::platform_region(region)?;
        let version = self.client.latest_version()?;
        let Some(champion) = self.client.resolve_champion(champion_name, &version.version)? else {
            tracing::info!(champion = champion_name, "champion not found in catalog");
            return Ok(None);
        };
        tracing::info!(
            champion = %champion.name,
            id = champion.id,
            patch = %version.patch,
            "champion resolved"
        );

        let static_data = self.client.static_data(&version.version, &champion.file_name)?;
        tracing::debug!(items = static_data.items.data.len(), "static data ready");

        let seeds = self.discover_seed_accounts(region);
        tracing::info!(region, seeds = seeds.len(), match_budget, "seed accounts discovered");

        let query = StatsQuery {
            champion_id: champion.id,
            patch_prefix: Some(version.patch.clone()),
            include_timeline: self.include_timelines,
        };
        let aggregator = StatsAggregator::new(&self.fetcher);

        let mut totals = RunTotals::default();
        let mut processed = Vec::new();
        let mut remaining = match_budget;

        self.progress.set_length(seeds.len() as u64);
        self.progress.set_message(format!("Aggregating {}", champion.name));

        for puuid in &seeds {
            if remaining == 0 {
                tracing::info!(processed = processed.len(), "match budget exhausted");
                break;
            }

            match aggregator.compute_for_account(region, puuid, &query, remaining) {
                Ok(stats) => {
                    remaining = remaining.saturating_sub(stats.matches_fetched);
                    tracing::info!(
                        account = %puuid,
                        fetched = stats.matches_fetched,
                        games = stats.games_played,
                        remaining,
                        "seed account processed"
                    );
                    totals.absorb(stats);
                    processed.push(puuid.clone());
                }
                Err(e) => {
                    remaining = remaining.saturating_sub(e.matches_fetched);
                    tracing::warn!(
                        account = %puuid,
                        fetched = e.matches_fetched,
                        remaining,
                        error = %e,
                        "skipping seed account"
                    );
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        let summary = totals.into_summary(&champion, &version.patch, processed);
        tracing::info!(
            champion = %summary.champion_name,
            games = summary.games_played,
            win_rate = summary.win_rate,
            pick_rate = summary.pick_rate,
            cached_matches = self.fetcher.cached_matches(),
            "summary ready"
        );
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::HttpResponse;
    use crate::testing::{
        client_with, json_response, match_json, participant, response, timeline_json, FakeBackend,
    };
    use serde_json::json;

    const AHRI: i64 = 103;
    const BUILD_A: [i64; 6] = [3089, 3157, 3020, 3135, 4645, 0];
    const BUILD_B: [i64; 6] = [6655, 3020, 4645, 3089, 3157, 0];

    fn query_param(url: &str, name: &str) -> usize {
        url.split(['?', '&'])
            .find_map(|kv| kv.strip_prefix(&format!("{}=", name)))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn ids_page(url: &str, prefix: &str, total: usize) -> HttpResponse {
        let (start, count) = (query_param(url, "start"), query_param(url, "count"));
        let ids: Vec<String> = (start..total.min(start + count))
            .map(|i| format!("LA2_{}{}", prefix, i))
            .collect();
        json_response(json!(ids))
    }

    /// acct-a: 60 ranked games, Ahri in the first 40, every fourth one lost.
    /// acct-b: 5 ranked Ahri wins.
    fn account_match(match_id: &str) -> HttpResponse {
        let (account, index) = if let Some(i) = match_id.strip_prefix("LA2_A") {
            ("acct-a", i.parse::<usize>().unwrap())
        } else {
            ("acct-b", match_id.trim_start_matches("LA2_B").parse::<usize>().unwrap())
        };

        let me = if account == "acct-a" {
            let champion = if index < 40 { AHRI } else { 157 };
            let build = if index < 10 { BUILD_A } else { BUILD_B };
            participant(account, champion, index % 4 != 0, build)
        } else {
            participant(account, AHRI, true, BUILD_A)
        };
        let other = participant("someone-else", 238, false, [0; 6]);
        json_response(match_json(match_id, 420, "14.23.1", vec![me, other]))
    }

    fn world(first_account_fails: bool) -> Arc<FakeBackend> {
        Arc::new(FakeBackend::new(move |url| {
            if url.ends_with("/api/versions.json") {
                json_response(json!(["14.23.1", "14.22.1"]))
            } else if url.ends_with("/champion.json") {
                json_response(json!({ "data": {
                    "Ahri": { "id": "Ahri", "name": "Ahri", "key": "103" },
                    "Zed": { "id": "Zed", "name": "Zed", "key": "238" }
                }}))
            } else if url.ends_with("/item.json") {
                json_response(json!({ "data": { "3089": { "name": "Rabadon's Deathcap" } } }))
            } else if url.contains("/champion/") {
                json_response(json!({ "data": {} }))
            } else if url.contains("challengerleagues") {
                json_response(json!({ "entries": [{ "puuid": "acct-a" }, { "summonerId": "sum-b" }] }))
            } else if url.contains("grandmasterleagues") {
                response(500, "ladder unavailable")
            } else if url.contains("masterleagues") {
                json_response(json!({ "entries": [
                    { "puuid": "acct-a", "summonerId": "sum-a" },
                    { "summonerId": "sum-b" },
                    {}
                ]}))
            } else if url.contains("/summoners/sum-b") {
                json_response(json!({ "puuid": "acct-b" }))
            } else if url.contains("by-puuid/acct-a/ids") {
                if first_account_fails {
                    response(500, "history unavailable")
                } else {
                    ids_page(url, "A", 60)
                }
            } else if url.contains("by-puuid/acct-b/ids") {
                ids_page(url, "B", 5)
            } else if url.ends_with("/timeline") {
                json_response(timeline_json(vec![vec![(1, 1), (1, 2)], vec![(1, 3), (1, 1)]]))
            } else {
                account_match(url.rsplit('/').next().unwrap())
            }
        }))
    }

    #[test]
    fn budget_spent_by_first_account_leaves_nothing_for_the_second() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let summary = orchestrator
            .get_champion_global_stats("ahri ", "la2", 50)
            .unwrap()
            .unwrap();

        assert_eq!(summary.champion_name, "Ahri");
        assert_eq!(summary.champion_id, 103);
        assert_eq!(summary.patch, "14.23");
        assert_eq!(summary.processed_account_ids, vec!["acct-a".to_string()]);
        assert_eq!(backend.calls_containing("by-puuid/acct-b"), 0);
        assert_eq!(backend.calls_containing("start=0&count=50"), 1);

        assert_eq!((summary.games_played, summary.wins), (40, 30));
        assert_eq!(summary.win_rate, 75.0);
        assert_eq!(summary.pick_rate, 80.0);

        // BUILD_B wins 23 of 30 (76.7%) against BUILD_A's 7 of 10.
        assert_eq!(summary.best_build.unwrap().slots(), BUILD_B);
        assert_eq!(
            summary.best_spells,
            Some(SummonerSpells { summoner1_id: 4, summoner2_id: 14 })
        );
        assert!(summary.best_runes.is_some());
        assert!(summary.best_skill_order.is_empty());
        assert_eq!(summary.roles.len(), 1);
        assert_eq!(summary.roles[0].role, "MIDDLE");
        assert_eq!(summary.roles[0].games_played, 40);
    }

    #[test]
    fn seeds_are_deduplicated_and_summoner_ids_resolved_once() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let seeds = orchestrator.discover_seed_accounts("la2");

        assert_eq!(seeds, vec!["acct-a".to_string(), "acct-b".to_string()]);
        assert_eq!(backend.calls_containing("/summoners/sum-b"), 1);
        assert_eq!(backend.calls_containing("/summoners/sum-a"), 0);
    }

    #[test]
    fn unknown_champion_returns_none_without_sampling() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let result = orchestrator.get_champion_global_stats("Not A Champ", "la2", 50).unwrap();

        assert!(result.is_none());
        assert_eq!(backend.calls_containing("leagues"), 0);
        assert_eq!(backend.calls_containing("/matches/"), 0);
    }

    #[test]
    fn account_failing_before_listing_is_skipped_without_charge() {
        let backend = world(true);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let summary = orchestrator
            .get_champion_global_stats("AHRI", "la2", 50)
            .unwrap()
            .unwrap();

        assert_eq!(summary.processed_account_ids, vec!["acct-b".to_string()]);
        assert_eq!((summary.games_played, summary.wins), (5, 5));
        assert_eq!(summary.pick_rate, 100.0);
        assert_eq!(backend.calls_containing("by-puuid/acct-b/ids?type=ranked&queue=420&start=0&count=50"), 1);
    }

    #[test]
    fn timelines_rank_skill_order_when_enabled() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend)).with_timelines(true);

        let summary = orchestrator
            .get_champion_global_stats("Ahri", "la2", 10)
            .unwrap()
            .unwrap();

        assert_eq!(summary.games_played, 10);
        assert_eq!(summary.best_skill_order, vec![1, 2, 3, 1]);
        assert_eq!(backend.calls_containing("/timeline"), 10);
    }

    #[test]
    fn summary_serializes_with_camel_case_fields() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));
        let summary = orchestrator
            .get_champion_global_stats("ahri", "la2", 5)
            .unwrap()
            .unwrap();

        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("pickRate").is_some());
        assert!(value.get("bestSkillOrder").unwrap().as_array().unwrap().is_empty());
        assert_eq!(value["processedAccountIds"], json!(["acct-a"]));
    }

    /// Five seeds with 50 ids each; match `_2` of every history is gone.
    fn broken_histories() -> Arc<FakeBackend> {
        Arc::new(FakeBackend::new(|url| {
            if url.ends_with("/api/versions.json") {
                json_response(json!(["14.23.1"]))
            } else if url.ends_with("/champion.json") {
                json_response(json!({ "data": { "Ahri": { "id": "Ahri", "name": "Ahri", "key": "103" } } }))
            } else if url.ends_with("/item.json") || url.contains("/champion/") {
                json_response(json!({ "data": {} }))
            } else if url.contains("challengerleagues") {
                let entries: Vec<_> = (0..5).map(|i| json!({ "puuid": format!("acct-{}", i) })).collect();
                json_response(json!({ "entries": entries }))
            } else if url.contains("leagues/by-queue") {
                json_response(json!({ "entries": [] }))
            } else if url.contains("/ids?") {
                let account = url.split("by-puuid/").nth(1).unwrap().split('/').next().unwrap().to_string();
                let ids: Vec<String> = (0..query_param(url, "count")).map(|i| format!("LA2_{}_{}", account, i)).collect();
                json_response(json!(ids))
            } else if url.ends_with("_2") {
                response(404, "match not found")
            } else {
                let match_id = url.rsplit('/').next().unwrap();
                let account = match_id.trim_start_matches("LA2_").rsplit_once('_').unwrap().0;
                json_response(match_json(match_id, 420, "14.23.1", vec![participant(account, AHRI, true, BUILD_A)]))
            }
        }))
    }

    #[test]
    fn failed_accounts_are_charged_for_ids_already_read() {
        let backend = broken_histories();
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let summary = orchestrator
            .get_champion_global_stats("Ahri", "la2", 50)
            .unwrap()
            .unwrap();

        assert!(summary.processed_account_ids.is_empty());
        assert_eq!(summary.games_played, 0);
        // The first account reads the whole budget; nobody else is listed.
        assert_eq!(backend.calls_containing("/ids?"), 1);
        assert_eq!(backend.calls_containing("by-puuid/acct-1"), 0);
        assert_eq!(backend.calls_containing("/matches/LA2_"), 3);
    }

    #[test]
    fn unknown_region_is_rejected_before_any_request() {
        let backend = world(false);
        let orchestrator = GlobalStatsOrchestrator::new(client_with(&backend));

        let err = orchestrator
            .get_champion_global_stats("Ahri", "evil.example/x#", 50)
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownRegion(_)));
        assert_eq!(backend.call_count(), 0);
    }
}
