use std::sync::Arc;

use crate::api::client::RiotApiClient;
use crate::api::endpoints::MATCH_IDS_PAGE_SIZE;
use crate::api::models::{MatchDto, TimelineDto};
use crate::cache::MemoCache;
use crate::error::AppError;

/// Match history access with per-id memoization. Match ids are globally
/// unique (platform-prefixed), so one cache serves every region.
pub struct MatchFetcher {
    client: Arc<RiotApiClient>,
    matches: MemoCache<Arc<MatchDto>>,
    timelines: MemoCache<Arc<TimelineDto>>,
}

impl MatchFetcher {
    pub fn new(client: Arc<RiotApiClient>) -> Self {
        MatchFetcher {
            client,
            matches: MemoCache::new(),
            timelines: MemoCache::new(),
        }
    }

    /// Most recent ranked solo match ids, newest first, at most `limit`.
    pub fn list_match_ids(&self, region: &str, puuid: &str, limit: usize) -> Result<Vec<String>, AppError> {
        let mut ids: Vec<String> = Vec::new();

        while ids.len() < limit {
            let count = MATCH_IDS_PAGE_SIZE.min(limit - ids.len());
            let page = self.client.match_ids_page(region, puuid, ids.len(), count)?;
            let exhausted = page.len() < count;
            ids.extend(page);
            if exhausted {
                break;
            }
        }

        ids.truncate(limit);
        Ok(ids)
    }

    pub fn fetch_match(&self, region: &str, match_id: &str) -> Result<Arc<MatchDto>, AppError> {
        self.matches.get_or_try_insert_with(match_id, || {
            self.client.get_match(region, match_id).map(Arc::new)
        })
    }

    pub fn fetch_timeline(&self, region: &str, match_id: &str) -> Result<Arc<TimelineDto>, AppError> {
        self.timelines.get_or_try_insert_with(match_id, || {
            self.client.get_timeline(region, match_id).map(Arc::new)
        })
    }

    pub fn cached_matches(&self) -> usize {
        self.matches.len()
    }
}
