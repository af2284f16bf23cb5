use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

// League V4 list response (challenger / grandmaster / master)
#[derive(Debug, Deserialize, Default)]
pub struct LeagueListDto {
    #[serde(default)]
    pub entries: Vec<LeagueItemDto>,
}

// Older payloads only carry the encrypted summoner id
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeagueItemDto {
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub summoner_id: Option<String>,
}

// Summoner V4 response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub puuid: String,
}

// Match V5 response
#[derive(Debug, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub match_id: String,
    /// Participant puuids in participant-id order.
    pub participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(default)]
    pub queue_id: i64,
    #[serde(default)]
    pub game_version: String,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_id: i64,
    pub win: bool,
    #[serde(default)]
    pub team_position: String, // TOP, JUNGLE, MIDDLE, BOTTOM, UTILITY
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub item0: i64,
    #[serde(default)]
    pub item1: i64,
    #[serde(default)]
    pub item2: i64,
    #[serde(default)]
    pub item3: i64,
    #[serde(default)]
    pub item4: i64,
    #[serde(default)]
    pub item5: i64,
    #[serde(default)]
    pub item6: i64,
    #[serde(default)]
    pub summoner1_id: i64,
    #[serde(default)]
    pub summoner2_id: i64,
    /// Kept raw so rune grouping sees the structure exactly as sent.
    #[serde(default)]
    pub perks: Option<Value>,
}

// Match V5 timeline response
#[derive(Debug, Deserialize)]
pub struct TimelineDto {
    pub info: TimelineInfo,
}

#[derive(Debug, Deserialize)]
pub struct TimelineInfo {
    #[serde(default)]
    pub frames: Vec<TimelineFrame>,
}

#[derive(Debug, Deserialize)]
pub struct TimelineFrame {
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub participant_id: Option<i64>,
    #[serde(default)]
    pub skill_slot: Option<i64>,
}

pub const SKILL_LEVEL_UP: &str = "SKILL_LEVEL_UP";

// Data Dragon champion list
#[derive(Debug, Deserialize)]
pub struct DataDragonChampions {
    pub data: HashMap<String, ChampionInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChampionInfo {
    /// Static-data file name, e.g. "MonkeyKing".
    pub id: String,
    pub name: String,
    /// Numeric champion id as a string, e.g. "103".
    pub key: String,
}

// Data Dragon item list
#[derive(Debug, Deserialize)]
pub struct DataDragonItems {
    pub data: HashMap<String, ItemInfo>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ItemInfo {
    pub name: String,
}
