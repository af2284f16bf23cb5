//! Outbound HTTP with quota admission and 429 backoff.
//!
//! Every call goes through [`RetryingTransport::send`]: optional client-side
//! pacing, governor admission, the request itself, then header resync and
//! endpoint token consumption on success. A 429 sleeps
//! `retry_after * 1000 * 2^attempt` ms and resubmits the same request.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::endpoints::ApiRequest;
use crate::error::AppError;
use crate::rate_limit::RateGovernor;

pub const MAX_RATE_LIMIT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

const USER_AGENT: &str = "league_stats/0.1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const APP_RATE_LIMIT_HEADER: &str = "x-app-rate-limit";
pub const METHOD_RATE_LIMIT_HEADER: &str = "x-method-rate-limit";
pub const SERVICE_RATE_LIMIT_HEADER: &str = "x-service-rate-limit";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw GET. Error statuses come back as responses; only network failures
/// are errors.
pub trait HttpBackend: Send + Sync {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, AppError>;
}

pub struct UreqBackend {
    agent: ureq::Agent,
}

impl UreqBackend {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        UreqBackend { agent }
    }

    fn read(resp: ureq::Response) -> Result<HttpResponse, AppError> {
        let status = resp.status();
        let headers = resp
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = resp.header(&name)?.to_string();
                Some((name.to_ascii_lowercase(), value))
            })
            .collect();
        let body = resp
            .into_string()
            .map_err(|e| AppError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, headers, body })
    }
}

impl Default for UreqBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBackend for UreqBackend {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, AppError> {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        match request.call() {
            Ok(resp) => Self::read(resp),
            Err(ureq::Error::Status(_, resp)) => Self::read(resp),
            Err(ureq::Error::Transport(e)) => Err(AppError::Transport(e.to_string())),
        }
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Backoff before retry number `attempt` (1-based).
pub fn backoff_delay(retry_after_secs: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(retry_after_secs.saturating_mul(1000).saturating_mul(factor))
}

fn retry_after_secs(response: &HttpResponse) -> u64 {
    response
        .header(RETRY_AFTER_HEADER)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

pub struct RetryingTransport {
    backend: Arc<dyn HttpBackend>,
    governor: Arc<RateGovernor>,
    sleeper: Arc<dyn Sleeper>,
    pacer: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    api_key: String,
}

impl RetryingTransport {
    pub fn new(backend: Arc<dyn HttpBackend>, governor: Arc<RateGovernor>, api_key: String) -> Self {
        RetryingTransport {
            backend,
            governor,
            sleeper: Arc::new(ThreadSleeper),
            pacer: None,
            api_key,
        }
    }

    #[cfg(test)]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Spreads calls to at most `per_second`; 0 turns pacing off.
    pub fn with_pacing(mut self, per_second: u32) -> Self {
        self.pacer = NonZeroU32::new(per_second).map(|n| RateLimiter::direct(Quota::per_second(n)));
        self
    }

    #[cfg(test)]
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    fn pace(&self) {
        let Some(pacer) = &self.pacer else {
            return;
        };
        while let Err(not_until) = pacer.check() {
            self.sleeper
                .sleep(not_until.wait_time_from(DefaultClock::default().now()));
        }
    }

    fn resync(&self, request: &ApiRequest, response: &HttpResponse) {
        if let Some(header) = response.header(APP_RATE_LIMIT_HEADER) {
            tracing::debug!(header, "app rate limit resync");
            self.governor.resync_global(header);
        }
        for name in [METHOD_RATE_LIMIT_HEADER, SERVICE_RATE_LIMIT_HEADER] {
            if let Some(header) = response.header(name) {
                tracing::debug!(path = request.path, header, "endpoint rate limit resync");
                self.governor.resync_endpoint(header, request.path);
            }
        }
    }

    /// Sends `request` and returns the body of the first 2xx response.
    pub fn send(&self, request: &ApiRequest) -> Result<String, AppError> {
        let auth = [("X-Riot-Token", self.api_key.as_str())];
        let headers: &[(&str, &str)] = if request.authenticated { &auth } else { &[] };

        let mut attempt: u32 = 0;
        loop {
            self.pace();
            self.governor.admit(request.path);
            tracing::debug!(url = %request.url, attempt, "riot api request");

            let response = self.backend.get(&request.url, headers)?;
            match response.status {
                200..=299 => {
                    self.resync(request, &response);
                    self.governor.consume(request.path);
                    return Ok(response.body);
                }
                429 => {
                    attempt += 1;
                    if attempt >= MAX_RATE_LIMIT_ATTEMPTS {
                        tracing::warn!(url = %request.url, attempts = attempt, "rate limited, giving up");
                        return Err(AppError::RateLimitExceeded { attempts: attempt });
                    }
                    let delay = backoff_delay(retry_after_secs(&response), attempt);
                    tracing::warn!(
                        url = %request.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    self.sleeper.sleep(delay);
                }
                status => {
                    tracing::debug!(url = %request.url, status, "riot api error");
                    return Err(AppError::Http {
                        status,
                        url: request.url.clone(),
                    });
                }
            }
        }
    }
}
