// src/aggregate.rs
//! # Aggregator
//! Drives fetch cycles over two listing sources and owns the [`FetchState`]
//! machine the dashboard renders.
//!
//! A cycle dispatches both sources together, aborts on the first failure
//! (all-or-nothing), merges provider A before provider B and sorts by
//! `posted_at` descending with a stable sort. Every cycle is stamped with a
//! generation; a cycle that finishes after a newer one was started is
//! discarded instead of overwriting the newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::Serialize;

use crate::model::{JobListing, ProviderKind, SearchQuery};
use crate::providers::JobProvider;

/// Something that yields normalized listings for a query.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<JobListing>>;
    fn kind(&self) -> ProviderKind;
}

/// Calls the upstream provider in-process and normalizes its body.
pub struct DirectSource {
    provider: Arc<dyn JobProvider>,
}

impl DirectSource {
    pub fn new(provider: Arc<dyn JobProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ListingSource for DirectSource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<JobListing>> {
        let raw = self.provider.fetch_raw(&query.to_proxy_query()).await?;
        self.provider.kind().normalize(&raw)
    }

    fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }
}

/// Calls this service's own `/api/<provider>/jobs` endpoint over HTTP.
pub struct ProxySource {
    client: Client,
    base_url: String,
    kind: ProviderKind,
}

impl ProxySource {
    pub fn new(client: Client, base_url: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            kind,
        }
    }
}

#[async_trait]
impl ListingSource for ProxySource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<JobListing>> {
        let url = format!("{}{}", self.base_url, self.kind.proxy_path());
        let pq = query.to_proxy_query();
        let raw = self
            .client
            .get(&url)
            .query(&[
                ("keywords", pq.keywords.as_str()),
                ("location", pq.location.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("proxy get {url}"))?
            .error_for_status()
            .with_context(|| format!("proxy status {url}"))?
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("proxy body {url}"))?;
        self.kind.normalize(&raw)
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }
}

/// Concatenate `a` then `b` and sort most-recent first.
///
/// `slice::sort_by` is stable, so equal dates keep concatenation order.
/// Listings without a date (`None`) sort after every dated listing.
pub fn merge_listings(a: Vec<JobListing>, b: Vec<JobListing>) -> Vec<JobListing> {
    let mut merged = a;
    merged.extend(b);
    merged.sort_by(|x, y| y.posted_at.cmp(&x.posted_at));
    merged
}

/// What the view renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FetchState {
    Idle,
    Loading,
    Ready { listings: Vec<JobListing> },
    Failed { reason: String },
}

impl FetchState {
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Ready { .. } | FetchState::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub query: Option<SearchQuery>,
    #[serde(flatten)]
    pub state: FetchState,
}

#[derive(Debug)]
struct Inner {
    generation: u64,
    query: Option<SearchQuery>,
    state: FetchState,
}

pub struct Aggregator {
    primary: Arc<dyn ListingSource>,
    secondary: Arc<dyn ListingSource>,
    timeout: Duration,
    next_generation: AtomicU64,
    inner: RwLock<Inner>,
}

impl Aggregator {
    pub fn new(primary: Arc<dyn ListingSource>, secondary: Arc<dyn ListingSource>) -> Self {
        Self {
            primary,
            secondary,
            timeout: Duration::from_secs(10),
            next_generation: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                generation: 0,
                query: None,
                state: FetchState::Idle,
            }),
        }
    }

    /// Bound on each source call; a source exceeding it fails the cycle.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn snapshot(&self) -> Snapshot {
        let g = self.read_inner();
        Snapshot {
            generation: g.generation,
            query: g.query.clone(),
            state: g.state.clone(),
        }
    }

    pub fn state(&self) -> FetchState {
        self.read_inner().state.clone()
    }

    /// Start a new cycle: bump the generation and switch to `Loading`.
    pub fn begin(&self, query: &SearchQuery) -> u64 {
        let mut g = self.write_inner();
        self.begin_locked(&mut g, query)
    }

    // Caller holds the write lock so generations enter `inner` in order.
    fn begin_locked(&self, g: &mut Inner, query: &SearchQuery) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        g.generation = generation;
        g.query = Some(query.clone());
        g.state = FetchState::Loading;
        tracing::debug!(generation, interests = ?query.interests, "fetch cycle started");
        generation
    }

    /// Fetch, merge and publish the outcome of cycle `generation`.
    /// Returns `false` when the result was discarded as stale.
    pub async fn run_cycle(&self, generation: u64, query: &SearchQuery) -> bool {
        let next = match self.fetch_both(query).await {
            Ok(listings) => FetchState::Ready { listings },
            Err(e) => {
                tracing::warn!(error = ?e, generation, "fetch cycle failed");
                FetchState::Failed {
                    reason: failure_reason(&e),
                }
            }
        };

        let mut g = self.write_inner();
        if g.generation != generation {
            tracing::debug!(generation, current = g.generation, "discarding stale fetch cycle");
            counter!("aggregate_stale_discarded_total").increment(1);
            return false;
        }
        let outcome = match &next {
            FetchState::Ready { listings } => {
                tracing::info!(generation, count = listings.len(), "fetch cycle ready");
                "ready"
            }
            _ => "failed",
        };
        counter!("aggregate_cycles_total", "outcome" => outcome).increment(1);
        g.state = next;
        true
    }

    /// Run a full cycle inline and return the state it produced (or the newer one).
    pub async fn refresh(&self, query: &SearchQuery) -> FetchState {
        let generation = self.begin(query);
        self.run_cycle(generation, query).await;
        self.state()
    }

    /// A page mount: start a background cycle unless one for the same query is
    /// loading or already produced listings. A failed cycle is retried.
    /// Returns `true` when a cycle was started.
    pub fn ensure(self: &Arc<Self>, query: &SearchQuery) -> bool {
        self.ensure_with(query, true)
    }

    /// A poll of an already mounted page: start a cycle only when nothing was
    /// fetched yet or the query changed. A failure stays visible.
    pub fn ensure_polled(self: &Arc<Self>, query: &SearchQuery) -> bool {
        self.ensure_with(query, false)
    }

    fn ensure_with(self: &Arc<Self>, query: &SearchQuery, retry_failed: bool) -> bool {
        let generation = {
            let mut g = self.write_inner();
            let unchanged = g.query.as_ref() == Some(query);
            let keep = match g.state {
                FetchState::Idle => false,
                FetchState::Loading | FetchState::Ready { .. } => true,
                FetchState::Failed { .. } => !retry_failed,
            };
            if unchanged && keep {
                return false;
            }
            self.begin_locked(&mut g, query)
        };
        let this = Arc::clone(self);
        let query = query.clone();
        tokio::spawn(async move {
            this.run_cycle(generation, &query).await;
        });
        true
    }

    async fn fetch_both(&self, query: &SearchQuery) -> Result<Vec<JobListing>> {
        let (a, b) = tokio::try_join!(
            self.fetch_one(self.primary.as_ref(), query),
            self.fetch_one(self.secondary.as_ref(), query),
        )?;
        Ok(merge_listings(a, b))
    }

    async fn fetch_one(&self, source: &dyn ListingSource, query: &SearchQuery) -> Result<Vec<JobListing>> {
        let kind = source.kind();
        match tokio::time::timeout(self.timeout, source.fetch_listings(query)).await {
            Ok(res) => res.with_context(|| format!("fetching {} listings", kind.label())),
            Err(_) => Err(anyhow!(
                "{} listings timed out after {}ms",
                kind.label(),
                self.timeout.as_millis()
            )),
        }
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

/// Short user-facing reason: the outermost context only, never upstream detail.
fn failure_reason(e: &anyhow::Error) -> String {
    e.to_string()
}
