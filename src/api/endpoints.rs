//! Endpoint path templates and URL builders.
//! Templates double as rate-limit bucket keys, so ids never appear in them.

use crate::error::AppError;

pub const DATA_DRAGON_HOST: &str = "https://ddragon.leagueoflegends.com";

pub const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";
pub const RANKED_SOLO_QUEUE_ID: i64 = 420;
pub const MATCH_IDS_PAGE_SIZE: usize = 100;

pub const VERSIONS_PATH: &str = "/api/versions.json";
pub const CHAMPIONS_PATH: &str = "/cdn/{version}/data/en_US/champion.json";
pub const CHAMPION_PATH: &str = "/cdn/{version}/data/en_US/champion/{championName}.json";
pub const ITEMS_PATH: &str = "/cdn/{version}/data/en_US/item.json";
pub const SUMMONER_PATH: &str = "/lol/summoner/v4/summoners/{encryptedSummonerId}";
pub const MATCH_IDS_PATH: &str = "/lol/match/v5/matches/by-puuid/{puuid}/ids";
pub const MATCH_PATH: &str = "/lol/match/v5/matches/{matchId}";
pub const TIMELINE_PATH: &str = "/lol/match/v5/matches/{matchId}/timeline";

/// One outbound call: the concrete URL plus the template used for quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub path: &'static str,
    /// Riot endpoints need the API key; Data Dragon does not.
    pub authenticated: bool,
}

impl ApiRequest {
    fn riot(url: String, path: &'static str) -> Self {
        ApiRequest {
            url,
            path,
            authenticated: true,
        }
    }

    fn static_content(url: String, path: &'static str) -> Self {
        ApiRequest {
            url,
            path,
            authenticated: false,
        }
    }
}

/// High-rank ladders used as seed sources, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTier {
    Challenger,
    Grandmaster,
    Master,
}

impl SeedTier {
    pub const ALL: [SeedTier; 3] = [SeedTier::Challenger, SeedTier::Grandmaster, SeedTier::Master];

    pub fn name(self) -> &'static str {
        match self {
            SeedTier::Challenger => "CHALLENGER",
            SeedTier::Grandmaster => "GRANDMASTER",
            SeedTier::Master => "MASTER",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            SeedTier::Challenger => "/lol/league/v4/challengerleagues/by-queue/{queue}",
            SeedTier::Grandmaster => "/lol/league/v4/grandmasterleagues/by-queue/{queue}",
            SeedTier::Master => "/lol/league/v4/masterleagues/by-queue/{queue}",
        }
    }
}

/// Known platform regions and the continental route serving their match-v5 data.
const PLATFORMS: [(&str, &str); 17] = [
    ("na1", "americas"),
    ("br1", "americas"),
    ("la1", "americas"),
    ("la2", "americas"),
    ("euw1", "europe"),
    ("eun1", "europe"),
    ("tr1", "europe"),
    ("ru", "europe"),
    ("me1", "europe"),
    ("kr", "asia"),
    ("jp1", "asia"),
    ("oc1", "sea"),
    ("ph2", "sea"),
    ("sg2", "sea"),
    ("th2", "sea"),
    ("tw2", "sea"),
    ("vn2", "sea"),
];

/// Canonical name of a known platform region. The region becomes part of the
/// host name, so anything outside the list is rejected.
pub fn platform_region(region: &str) -> Result<&'static str, AppError> {
    let wanted = region.trim().to_ascii_lowercase();
    PLATFORMS
        .iter()
        .find(|(platform, _)| *platform == wanted)
        .map(|(platform, _)| *platform)
        .ok_or_else(|| AppError::UnknownRegion(region.to_string()))
}

/// Continental route serving match-v5 for a platform region.
pub fn regional_routing(region: &str) -> &'static str {
    let wanted = region.trim().to_ascii_lowercase();
    PLATFORMS
        .iter()
        .find(|(platform, _)| *platform == wanted)
        .map(|(_, route)| *route)
        .unwrap_or("americas")
}

fn platform_host(region: &str) -> String {
    format!("https://{}.api.riotgames.com", region.to_ascii_lowercase())
}

fn regional_host(region: &str) -> String {
    format!("https://{}.api.riotgames.com", regional_routing(region))
}

pub fn versions() -> ApiRequest {
    ApiRequest::static_content(format!("{}{}", DATA_DRAGON_HOST, VERSIONS_PATH), VERSIONS_PATH)
}

pub fn champions(version: &str) -> ApiRequest {
    ApiRequest::static_content(
        format!("{}/cdn/{}/data/en_US/champion.json", DATA_DRAGON_HOST, version),
        CHAMPIONS_PATH,
    )
}

pub fn champion(version: &str, file_name: &str) -> ApiRequest {
    ApiRequest::static_content(
        format!("{}/cdn/{}/data/en_US/champion/{}.json", DATA_DRAGON_HOST, version, file_name),
        CHAMPION_PATH,
    )
}

pub fn items(version: &str) -> ApiRequest {
    ApiRequest::static_content(
        format!("{}/cdn/{}/data/en_US/item.json", DATA_DRAGON_HOST, version),
        ITEMS_PATH,
    )
}

pub fn league(region: &str, tier: SeedTier) -> ApiRequest {
    let path = tier.path();
    ApiRequest::riot(
        format!("{}{}", platform_host(region), path.replace("{queue}", RANKED_SOLO_QUEUE)),
        path,
    )
}

pub fn summoner_by_id(region: &str, summoner_id: &str) -> ApiRequest {
    ApiRequest::riot(
        format!("{}/lol/summoner/v4/summoners/{}", platform_host(region), summoner_id),
        SUMMONER_PATH,
    )
}

pub fn match_ids(region: &str, puuid: &str, start: usize, count: usize) -> ApiRequest {
    ApiRequest::riot(
        format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?type=ranked&queue={}&start={}&count={}",
            regional_host(region),
            puuid,
            RANKED_SOLO_QUEUE_ID,
            start,
            count
        ),
        MATCH_IDS_PATH,
    )
}

pub fn match_by_id(region: &str, match_id: &str) -> ApiRequest {
    ApiRequest::riot(
        format!("{}/lol/match/v5/matches/{}", regional_host(region), match_id),
        MATCH_PATH,
    )
}

pub fn timeline(region: &str, match_id: &str) -> ApiRequest {
    ApiRequest::riot(
        format!("{}/lol/match/v5/matches/{}/timeline", regional_host(region), match_id),
        TIMELINE_PATH,
    )
}
