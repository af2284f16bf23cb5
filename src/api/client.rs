use crate::cache::MemoCache;
use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::thread;

use super::endpoints::{self, ApiRequest, SeedTier};
use super::models::*;
use super::transport::RetryingTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameVersion {
    /// Full Data Dragon version, e.g. "14.23.1".
    pub version: String,
    /// Major.minor prefix used to filter matches, e.g. "14.23".
    pub patch: String,
}

impl GameVersion {
    pub fn parse(version: &str) -> Self {
        let patch = version.split('.').take(2).collect::<Vec<_>>().join(".");
        GameVersion {
            version: version.to_string(),
            patch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionRef {
    pub id: i64,
    pub name: String,
    pub file_name: String,
}

#[derive(Debug)]
pub struct StaticData {
    pub items: DataDragonItems,
    pub champion: Value,
}

impl StaticData {
    pub fn item_name(&self, item_id: i64) -> Option<&str> {
        self.items
            .data
            .get(&item_id.to_string())
            .map(|item| item.name.as_str())
    }

    /// Epithet from the champion's own file, e.g. "the Nine-Tailed Fox".
    pub fn champion_title(&self) -> Option<&str> {
        self.champion
            .get("data")?
            .as_object()?
            .values()
            .next()?
            .get("title")?
            .as_str()
    }
}

/// Lowercase and keep only ASCII letters and digits: "Kai'Sa " -> "kaisa".
pub fn normalize_champion_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub struct RiotApiClient {
    transport: RetryingTransport,
    catalogs: MemoCache<Arc<DataDragonChampions>>,
    champions: MemoCache<ChampionRef>,
    static_data: MemoCache<Arc<StaticData>>,
    summoner_puuids: MemoCache<String>,
}

impl RiotApiClient {
    pub fn new(transport: RetryingTransport) -> Self {
        RiotApiClient {
            transport,
            catalogs: MemoCache::new(),
            champions: MemoCache::new(),
            static_data: MemoCache::new(),
            summoner_puuids: MemoCache::new(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, AppError> {
        let body = self.transport.send(request)?;
        serde_json::from_str(&body).map_err(|e| {
            AppError::Json(format!("{}: {}", request.path, e))
        })
    }

    pub fn latest_version(&self) -> Result<GameVersion, AppError> {
        let versions: Vec<String> = self.get_json(&endpoints::versions())?;
        let latest = versions
            .first()
            .ok_or_else(|| AppError::Json("versions.json is empty".to_string()))?;
        Ok(GameVersion::parse(latest))
    }

    pub fn champion_catalog(&self, version: &str) -> Result<Arc<DataDragonChampions>, AppError> {
        self.catalogs.get_or_try_insert_with(version, || {
            self.get_json(&endpoints::champions(version)).map(Arc::new)
        })
    }

    /// Matches the normalised input against each champion's display name and
    /// static-data id. `Ok(None)` means the catalog has no such champion.
    pub fn resolve_champion(
        &self,
        champion_name: &str,
        version: &str,
    ) -> Result<Option<ChampionRef>, AppError> {
        let wanted = normalize_champion_name(champion_name);
        if let Some(found) = self.champions.get(&wanted) {
            return Ok(Some(found));
        }

        let catalog = self.champion_catalog(version)?;
        let found = catalog.data.values().find(|c| {
            normalize_champion_name(&c.name) == wanted || normalize_champion_name(&c.id) == wanted
        });
        let Some(info) = found else {
            return Ok(None);
        };

        let id = info.key.parse::<i64>().map_err(|_| {
            AppError::Json(format!("champion {} has a non-numeric key {:?}", info.id, info.key))
        })?;
        let champion = ChampionRef {
            id,
            name: info.name.clone(),
            file_name: info.id.clone(),
        };
        self.champions.insert(wanted, champion.clone());
        Ok(Some(champion))
    }

    /// Item list and the champion's own file, downloaded side by side.
    pub fn static_data(&self, version: &str, file_name: &str) -> Result<Arc<StaticData>, AppError> {
        let key = format!("{}-{}", version, file_name);
        self.static_data.get_or_try_insert_with(&key, || {
            let (items, champion) = thread::scope(|scope| {
                let items = scope.spawn(|| self.get_json::<DataDragonItems>(&endpoints::items(version)));
                let champion = self.get_json::<Value>(&endpoints::champion(version, file_name));
                let items = items
                    .join()
                    .map_err(|_| AppError::Transport("item download thread panicked".to_string()))?;
                Ok::<_, AppError>((items?, champion?))
            })?;
            Ok(Arc::new(StaticData { items, champion }))
        })
    }

    pub fn league_entries(&self, region: &str, tier: SeedTier) -> Result<LeagueListDto, AppError> {
        self.get_json(&endpoints::league(region, tier))
    }

    pub fn puuid_for_summoner(&self, region: &str, summoner_id: &str) -> Result<String, AppError> {
        self.summoner_puuids.get_or_try_insert_with(summoner_id, || {
            let summoner: SummonerDto = self.get_json(&endpoints::summoner_by_id(region, summoner_id))?;
            Ok(summoner.puuid)
        })
    }

    pub fn match_ids_page(
        &self,
        region: &str,
        puuid: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<String>, AppError> {
        self.get_json(&endpoints::match_ids(region, puuid, start, count))
    }

    pub fn get_match(&self, region: &str, match_id: &str) -> Result<MatchDto, AppError> {
        self.get_json(&endpoints::match_by_id(region, match_id))
    }

    pub fn get_timeline(&self, region: &str, match_id: &str) -> Result<TimelineDto, AppError> {
        self.get_json(&endpoints::timeline(region, match_id))
    }
}
