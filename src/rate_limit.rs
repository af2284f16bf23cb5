//! Riot quota governor.
//!
//! Two global buckets (10 s and 600 s windows) plus any number of endpoint
//! buckets keyed by `(path template, window)`. A caller is admitted only when
//! both global buckets and every endpoint bucket for its path hold a token.
//! Buckets reset to capacity on their own fixed timers; admission is strict
//! FIFO, so a blocked head request holds back everything queued behind it.
//!
//! Endpoint tokens are taken by [`RateGovernor::consume`] after the response,
//! not at admission. A refill landing between the two can let a few more calls
//! through than the nominal capacity; the server's 429 handling covers that.

use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const SHORT_WINDOW_SECS: u64 = 10;
pub const LONG_WINDOW_SECS: u64 = 600;

const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    window: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, window: Duration, now: Instant) -> Self {
        TokenBucket {
            capacity,
            tokens: capacity,
            window,
            last_refill: now,
        }
    }

    #[cfg(test)]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[cfg(test)]
    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    /// Resets to full capacity if at least one window boundary passed since
    /// the last reset. Boundaries stay aligned to the bucket's first timer.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed < self.window {
            return;
        }
        let rem = elapsed.as_nanos() % self.window.as_nanos().max(1);
        self.last_refill = now - Duration::from_nanos(rem as u64);
        self.tokens = self.capacity;
    }

    fn next_refill(&self) -> Instant {
        self.last_refill + self.window
    }

    fn has_token(&self) -> bool {
        self.tokens > 0
    }

    fn take(&mut self) {
        self.tokens = self.tokens.saturating_sub(1);
    }

    fn resize(&mut self, capacity: u32) {
        self.capacity = capacity;
        self.tokens = self.tokens.min(capacity);
    }
}

/// Identifies one endpoint bucket. `path` is a template such as
/// `/lol/match/v5/matches/{matchId}`, so every id of a method shares quota.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub path: String,
    pub window_secs: u64,
}

impl EndpointKey {
    pub fn new(path: impl Into<String>, window_secs: u64) -> Self {
        EndpointKey {
            path: path.into(),
            window_secs,
        }
    }
}

/// Parses a `limit:window,limit:window` rate-limit header. Malformed pairs
/// and zero-length windows are dropped.
pub fn parse_rate_limit_header(header: &str) -> Vec<(u32, u64)> {
    header
        .split(',')
        .filter_map(|part| {
            let (limit, window) = part.trim().split_once(':')?;
            let limit = limit.trim().parse::<u32>().ok()?;
            let window = window.trim().parse::<u64>().ok()?;
            (window > 0).then_some((limit, window))
        })
        .collect()
}

#[derive(Debug)]
struct GovernorState {
    short: TokenBucket,
    long: TokenBucket,
    endpoints: HashMap<EndpointKey, TokenBucket>,
    queue: VecDeque<u64>,
    next_ticket: u64,
}

impl GovernorState {
    /// Takes one token from each global bucket if the caller may proceed,
    /// otherwise returns the instant at which every blocking bucket refills.
    fn try_take(&mut self, path: &str, now: Instant) -> Result<(), Instant> {
        self.short.refill(now);
        self.long.refill(now);

        let mut blocked_until: Option<Instant> = None;
        let mut block = |bucket: &TokenBucket| {
            if !bucket.has_token() {
                let at = bucket.next_refill();
                blocked_until = Some(blocked_until.map_or(at, |prev| prev.max(at)));
            }
        };

        block(&self.short);
        block(&self.long);
        for (_, bucket) in self.endpoints.iter_mut().filter(|(key, _)| key.path == path) {
            bucket.refill(now);
            block(bucket);
        }

        match blocked_until {
            Some(at) => Err(at),
            None => {
                self.short.take();
                self.long.take();
                Ok(())
            }
        }
    }
}

/// Shared quota state for one API key. Construct one per process (or per
/// test) and hand it to the transport.
#[derive(Debug)]
pub struct RateGovernor {
    state: Mutex<GovernorState>,
    ready: Condvar,
}

impl RateGovernor {
    pub fn new(per_10sec: u32, per_10min: u32) -> Self {
        Self::new_at(per_10sec, per_10min, Instant::now())
    }

    pub fn new_at(per_10sec: u32, per_10min: u32, now: Instant) -> Self {
        RateGovernor {
            state: Mutex::new(GovernorState {
                short: TokenBucket::new(per_10sec, Duration::from_secs(SHORT_WINDOW_SECS), now),
                long: TokenBucket::new(per_10min, Duration::from_secs(LONG_WINDOW_SECS), now),
                endpoints: HashMap::new(),
                queue: VecDeque::new(),
                next_ticket: 0,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GovernorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the caller reaches the head of the queue and every
    /// bucket that applies to `path` holds a token.
    pub fn admit(&self, path: &str) {
        let mut state = self.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.queue.push_back(ticket);

        loop {
            if state.queue.front() == Some(&ticket) {
                let now = Instant::now();
                match state.try_take(path, now) {
                    Ok(()) => {
                        state.queue.pop_front();
                        self.ready.notify_all();
                        return;
                    }
                    Err(refill_at) => {
                        let wait = refill_at.saturating_duration_since(now).max(MIN_WAIT);
                        tracing::debug!(
                            path,
                            wait_ms = wait.as_millis() as u64,
                            queued = state.queue.len(),
                            "rate limit reached, waiting for refill"
                        );
                        state = match self.ready.wait_timeout(state, wait) {
                            Ok((guard, _)) => guard,
                            Err(poisoned) => poisoned.into_inner().0,
                        };
                    }
                }
            } else {
                state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        }
    }

    /// Non-blocking admission at a given instant. Fails while other callers
    /// are queued, so it never overtakes the FIFO.
    #[cfg(test)]
    pub fn try_admit_at(&self, path: &str, now: Instant) -> bool {
        let mut state = self.lock();
        state.queue.is_empty() && state.try_take(path, now).is_ok()
    }

    /// Applies an `x-app-rate-limit` header to the global buckets.
    pub fn resync_global(&self, header: &str) {
        let mut state = self.lock();
        for (limit, window) in parse_rate_limit_header(header) {
            match window {
                SHORT_WINDOW_SECS => state.short.resize(limit),
                LONG_WINDOW_SECS => state.long.resize(limit),
                other => tracing::debug!(window = other, "ignoring app rate limit window"),
            }
        }
        self.ready.notify_all();
    }

    /// Applies an `x-method-rate-limit` / `x-service-rate-limit` header,
    /// replacing the buckets for `path` with fresh, full ones.
    pub fn resync_endpoint(&self, header: &str, path: &str) {
        self.resync_endpoint_at(header, path, Instant::now());
    }

    pub fn resync_endpoint_at(&self, header: &str, path: &str, now: Instant) {
        let mut state = self.lock();
        for (limit, window) in parse_rate_limit_header(header) {
            state.endpoints.insert(
                EndpointKey::new(path, window),
                TokenBucket::new(limit, Duration::from_secs(window), now),
            );
        }
        self.ready.notify_all();
    }

    /// Takes one token from every endpoint bucket tracked for `path`.
    pub fn consume(&self, path: &str) {
        self.consume_at(path, Instant::now());
    }

    pub fn consume_at(&self, path: &str, now: Instant) {
        let mut state = self.lock();
        for (_, bucket) in state.endpoints.iter_mut().filter(|(key, _)| key.path == path) {
            bucket.refill(now);
            bucket.take();
        }
    }

    /// Snapshot of a global bucket (10 or 600 second window).
    #[cfg(test)]
    pub fn global_bucket(&self, window_secs: u64) -> Option<TokenBucket> {
        let state = self.lock();
        match window_secs {
            SHORT_WINDOW_SECS => Some(state.short.clone()),
            LONG_WINDOW_SECS => Some(state.long.clone()),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn endpoint_bucket(&self, key: &EndpointKey) -> Option<TokenBucket> {
        self.lock().endpoints.get(key).cloned()
    }
}
