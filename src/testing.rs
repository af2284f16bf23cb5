//! Offline stand-ins for the HTTP backend and sleeper, plus JSON fixtures.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use crate::api::client::RiotApiClient;
use crate::api::transport::{HttpBackend, HttpResponse, RetryingTransport, Sleeper};
use crate::error::AppError;
use crate::rate_limit::RateGovernor;

pub fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub fn json_response(value: Value) -> HttpResponse {
    response(200, &value.to_string())
}

impl HttpResponse {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }
}

type Handler = Box<dyn Fn(&str) -> HttpResponse + Send + Sync>;

/// Answers each GET from a handler and records what was asked.
pub struct FakeBackend {
    handler: Handler,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeBackend {
    pub fn new(handler: impl Fn(&str) -> HttpResponse + Send + Sync + 'static) -> Self {
        FakeBackend {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replays `responses` in order, then 404s.
    pub fn sequence(responses: Vec<HttpResponse>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| response(404, "exhausted"))
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls().iter().filter(|url| url.contains(needle)).count()
    }

    pub fn sent_headers(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().unwrap().iter().map(|(_, h)| h.clone()).collect()
    }
}

impl HttpBackend for FakeBackend {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, AppError> {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.calls.lock().unwrap().push((url.to_string(), headers));
        Ok((self.handler)(url))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub fn client_with(backend: &Arc<FakeBackend>) -> Arc<RiotApiClient> {
    let transport = RetryingTransport::new(
        backend.clone(),
        Arc::new(RateGovernor::new(10_000, 100_000)),
        "RGAPI-test".to_string(),
    )
    .with_sleeper(Arc::new(RecordingSleeper::default()));
    Arc::new(RiotApiClient::new(transport))
}

pub fn participant(puuid: &str, champion_id: i64, win: bool, items: [i64; 6]) -> Value {
    json!({
        "puuid": puuid,
        "championId": champion_id,
        "championName": "Ahri",
        "win": win,
        "teamPosition": "MIDDLE",
        "role": "SOLO",
        "item0": items[0],
        "item1": items[1],
        "item2": items[2],
        "item3": items[3],
        "item4": items[4],
        "item5": items[5],
        "item6": 3340,
        "summoner1Id": 4,
        "summoner2Id": 14,
        "perks": {
            "statPerks": { "defense": 5001, "flex": 5008, "offense": 5005 },
            "styles": [
                { "description": "primaryStyle", "style": 8100, "selections": [{ "perk": 8112 }] },
                { "description": "subStyle", "style": 8200, "selections": [{ "perk": 8226 }] }
            ]
        }
    })
}

pub fn match_json(match_id: &str, queue_id: i64, game_version: &str, participants: Vec<Value>) -> Value {
    let puuids: Vec<Value> = participants.iter().map(|p| p["puuid"].clone()).collect();
    json!({
        "metadata": { "matchId": match_id, "participants": puuids },
        "info": {
            "queueId": queue_id,
            "gameVersion": game_version,
            "participants": participants
        }
    })
}

/// Timeline whose frames carry SKILL_LEVEL_UP events as `(participantId, slot)`.
pub fn timeline_json(frames: Vec<Vec<(i64, i64)>>) -> Value {
    let frames: Vec<Value> = frames
        .into_iter()
        .map(|events| {
            let mut events: Vec<Value> = events
                .into_iter()
                .map(|(participant_id, slot)| {
                    json!({
                        "type": "SKILL_LEVEL_UP",
                        "participantId": participant_id,
                        "skillSlot": slot,
                        "levelUpType": "NORMAL"
                    })
                })
                .collect();
            events.push(json!({ "type": "ITEM_PURCHASED", "participantId": 1, "itemId": 1056 }));
            json!({ "events": events, "timestamp": 0 })
        })
        .collect();
    json!({ "info": { "frames": frames } })
}
