//! One unit of queued work: `{"championName": "...", "region": "..."}`.
//!
//! Every payload is acknowledged once processed, whatever the outcome.
//! Malformed payloads are dropped without a record; everything else leaves
//! a ready or error record in the store under the requested champion name.

use serde::Deserialize;

use crate::analysis::global::GlobalStatsOrchestrator;
use crate::api::endpoints;
use crate::error::AppError;
use crate::store::{ChampionRecord, ResultStore};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub champion_name: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl JobPayload {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let mut payload: JobPayload =
            serde_json::from_str(raw).map_err(|e| AppError::InvalidJob(e.to_string()))?;
        if payload.champion_name.trim().is_empty() {
            return Err(AppError::InvalidJob("championName missing in message body".to_string()));
        }
        if let Some(region) = payload.region.as_deref() {
            let region = endpoints::platform_region(region)
                .map_err(|e| AppError::InvalidJob(e.to_string()))?;
            payload.region = Some(region.to_string());
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Ready { champion_name: String },
    Failed { champion_name: String, message: String },
    Discarded { reason: String },
}

pub struct JobRunner<'a> {
    orchestrator: &'a GlobalStatsOrchestrator,
    store: &'a ResultStore,
    default_region: String,
    match_budget: usize,
}

impl<'a> JobRunner<'a> {
    pub fn new(
        orchestrator: &'a GlobalStatsOrchestrator,
        store: &'a ResultStore,
        default_region: impl Into<String>,
        match_budget: usize,
    ) -> Self {
        JobRunner {
            orchestrator,
            store,
            default_region: default_region.into(),
            match_budget,
        }
    }

    pub fn process(&self, raw: &str) -> JobOutcome {
        let payload = match JobPayload::parse(raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "discarding malformed job");
                return JobOutcome::Discarded { reason: e.to_string() };
            }
        };

        let champion_name = payload.champion_name;
        let region = payload.region.as_deref().unwrap_or(&self.default_region);

        let result = self
            .orchestrator
            .get_champion_global_stats(&champion_name, region, self.match_budget)
            .and_then(|summary| summary.ok_or_else(|| AppError::ChampionNotFound(champion_name.clone())));

        let (record, outcome) = match result {
            Ok(summary) => {
                tracing::info!(champion = %champion_name, "champion stats saved");
                (
                    ChampionRecord::ready(summary),
                    JobOutcome::Ready { champion_name: champion_name.clone() },
                )
            }
            Err(e) => {
                tracing::error!(
                    champion = %champion_name,
                    status = ?e.status(),
                    error = %e,
                    "champion stats failed"
                );
                (
                    ChampionRecord::error(e.to_string()),
                    JobOutcome::Failed {
                        champion_name: champion_name.clone(),
                        message: e.to_string(),
                    },
                )
            }
        };

        if let Err(e) = self.store.save(&champion_name, &record) {
            tracing::error!(champion = %champion_name, error = %e, "failed to store result");
        }
        outcome
    }
}
