//! The query adapter.
//!
//! Owns the two catalog namespaces. Interests under `P/query` carry a
//! JSON query in their last name component; the adapter acknowledges the
//! query, translates it to SQL, and streams the result rows into signed,
//! segmented Data under `P/query-results/<version>`. Interests under
//! `P/query-results` are answered from the segment cache.
//!
//! One mutex guards both the active-query registry and the segment
//! cache; it is held only for probes, inserts, and the ACK emission.
//! Query runs execute on a semaphore-bounded pool of worker tasks, so
//! the dispatch loops never touch the database themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};

use stratus_ndn::{Component, Data, Face, FilterHandle, FilterId, Interest, Name};

use crate::backend::CatalogBackend;
use crate::cache::SegmentCache;
use crate::error::{CatalogError, SignError};
use crate::signer::Signer;
use crate::translate::{self, TranslatedQuery};

/// Upper bound on the row bytes packed into one result segment, a
/// conservative fraction of the NDN packet size that leaves room for the
/// name and signature.
pub const PAYLOAD_LIMIT: usize = 7000;
/// Freshness period stamped on every result segment, in milliseconds.
pub const SEGMENT_FRESHNESS_MS: u64 = 10_000;
/// Default bound on concurrently producing query runs.
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 4;

const QUERY_NAMESPACE: &str = "query";
const RESULTS_NAMESPACE: &str = "query-results";
const ACK_SUFFIX: &str = "OK";

/// Shared mutable state: the active-query registry and the segment
/// cache, behind one lock.
struct AdapterState {
    /// Raw JSON query string → the ACK of its (only) producing run.
    active: HashMap<String, Arc<Data>>,
    cache: SegmentCache,
}

impl AdapterState {
    fn lookup(&self, query: &str) -> Option<Arc<Data>> {
        self.active.get(query).cloned()
    }

    /// Claim `query` for a new run. Returns false without overwriting
    /// when some run already owns it.
    fn insert_if_absent(&mut self, query: &str, ack: &Arc<Data>) -> bool {
        if self.active.contains_key(query) {
            return false;
        }
        self.active.insert(query.to_string(), Arc::clone(ack));
        true
    }
}

/// Wall-clock version source with per-instance uniqueness: microseconds
/// since the epoch, ticked forward past the last issued value so
/// concurrent runs in the same microsecond still get distinct versions.
struct VersionClock {
    last: AtomicU64,
}

impl VersionClock {
    fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_micros().max(0) as u64;
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}

pub struct QueryAdapter {
    face: Arc<dyn Face>,
    backend: Arc<dyn CatalogBackend>,
    signer: Arc<Signer>,
    prefix: Name,
    state: Mutex<AdapterState>,
    versions: VersionClock,
    query_permits: Arc<Semaphore>,
    filters: Mutex<Vec<FilterId>>,
}

impl QueryAdapter {
    pub fn new(
        face: Arc<dyn Face>,
        backend: Arc<dyn CatalogBackend>,
        signer: Arc<Signer>,
        prefix: Name,
        cache_capacity: usize,
        max_concurrent_queries: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            face,
            backend,
            signer,
            prefix,
            state: Mutex::new(AdapterState {
                active: HashMap::new(),
                cache: SegmentCache::new(cache_capacity),
            }),
            versions: VersionClock::new(),
            query_permits: Arc::new(Semaphore::new(max_concurrent_queries.max(1))),
            filters: Mutex::new(Vec::new()),
        })
    }

    /// Register both namespaces and start their dispatch loops.
    pub async fn start(self: &Arc<Self>) -> Result<(), CatalogError> {
        let query_filter = self
            .face
            .register_filter(self.prefix.clone().appended(QUERY_NAMESPACE))
            .await?;
        let results_filter = self
            .face
            .register_filter(self.prefix.clone().appended(RESULTS_NAMESPACE))
            .await?;
        {
            let mut filters = self.filters.lock().await;
            filters.push(query_filter.id);
            filters.push(results_filter.id);
        }
        Arc::clone(self).spawn_query_loop(query_filter);
        Arc::clone(self).spawn_results_loop(results_filter);
        tracing::info!("query adapter serving under {}", self.prefix);
        Ok(())
    }

    /// Unregister every interest filter and release the backend.
    pub async fn shutdown(&self) {
        let ids: Vec<FilterId> = self.filters.lock().await.drain(..).collect();
        for id in ids {
            if let Err(error) = self.face.unregister_filter(id).await {
                tracing::warn!("failed to unregister filter {id}: {error}");
            }
        }
        self.backend.close().await;
        tracing::info!("query adapter stopped");
    }

    fn spawn_query_loop(self: Arc<Self>, mut filter: FilterHandle) {
        tokio::spawn(async move {
            while let Some(interest) = filter.interests.recv().await {
                self.on_query_interest(interest).await;
            }
        });
    }

    fn spawn_results_loop(self: Arc<Self>, mut filter: FilterHandle) {
        tokio::spawn(async move {
            while let Some(interest) = filter.interests.recv().await {
                self.on_results_interest(interest).await;
            }
        });
    }

    /// Interests under `P/query`. The name must be exactly
    /// `P/query/<json>`; anything else is dropped.
    async fn on_query_interest(self: &Arc<Self>, interest: Interest) {
        if interest.name().len() != self.prefix.len() + 2 {
            tracing::debug!("dropping malformed query interest {}", interest.name());
            return;
        }
        let permit = match Arc::clone(&self.query_permits).acquire_owned().await {
            Ok(permit) => permit,
            // Semaphore closed: shutting down.
            Err(_) => return,
        };
        let adapter = Arc::clone(self);
        tokio::spawn(async move {
            adapter.run_json_query(interest).await;
            drop(permit);
        });
    }

    /// Interests under `P/query-results`, answered from the cache.
    async fn on_results_interest(&self, interest: Interest) {
        let segment = {
            let mut state = self.state.lock().await;
            state.cache.find(interest.name())
        };
        if let Some(segment) = segment {
            if let Err(error) = self.face.put((*segment).clone()).await {
                tracing::warn!("failed to put cached segment: {error}");
            }
        }
    }

    /// One query run: parse, acknowledge, translate, produce segments.
    async fn run_json_query(&self, interest: Interest) {
        let Some(component) = interest.name().get(self.prefix.len() + 1) else {
            return;
        };
        let Ok(raw_query) = std::str::from_utf8(component.value()).map(str::to_owned) else {
            tracing::debug!("query payload is not UTF-8");
            return;
        };
        if raw_query.is_empty() {
            tracing::debug!("dropping empty query payload");
            return;
        }

        // Replay probe: some run already owns this exact query string.
        let cached = { self.state.lock().await.lookup(&raw_query) };
        if let Some(ack) = cached {
            self.replay_ack(&ack).await;
            return;
        }

        let query = match serde_json::from_str::<Value>(&raw_query) {
            Ok(Value::Object(members)) => members,
            Ok(_) | Err(_) => {
                tracing::debug!("cannot parse query payload {raw_query:?}");
                return;
            }
        };

        let version = Component::from_version(self.versions.tick());
        let ack = match self.make_ack_data(&interest, &version) {
            Ok(ack) => Arc::new(ack),
            Err(error) => {
                tracing::warn!("cannot sign ack for {}: {error}", interest.name());
                return;
            }
        };

        {
            let mut state = self.state.lock().await;
            // Re-check under the lock; a racing duplicate may have won.
            if !state.insert_if_absent(&raw_query, &ack) {
                let existing = state.lookup(&raw_query);
                drop(state);
                if let Some(existing) = existing {
                    self.replay_ack(&existing).await;
                }
                return;
            }
            if let Err(error) = self.face.put((*ack).clone()).await {
                tracing::warn!("failed to emit ack: {error}");
            }
        }

        let TranslatedQuery { sql, autocomplete } = translate::json_to_sql(&query);
        let segment_prefix = self
            .prefix
            .clone()
            .appended(RESULTS_NAMESPACE)
            .appended(version);
        self.prepare_segments(&segment_prefix, &sql, autocomplete).await;
    }

    async fn replay_ack(&self, ack: &Data) {
        if let Err(error) = self.face.put(ack.clone()).await {
            tracing::warn!("failed to replay ack: {error}");
        }
    }

    /// Run the SQL and pack the row names into cache-resident segments.
    /// Rows are buffered until the next one would push the payload past
    /// [`PAYLOAD_LIMIT`]; the terminal segment carries FinalBlockId.
    async fn prepare_segments(&self, segment_prefix: &Name, sql: &str, autocomplete: bool) {
        let mut rows = match self.backend.execute(sql).await {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!("catalog query {sql:?} failed: {error}");
                return;
            }
        };

        let mut buffered: Vec<String> = Vec::new();
        let mut used_bytes = 0usize;
        let mut segment_no = 0u64;
        while let Some(name) = rows.next().await {
            let size = name.len() + 1;
            if used_bytes + size > PAYLOAD_LIMIT {
                if !self
                    .flush_segment(segment_prefix, &buffered, segment_no, false, autocomplete)
                    .await
                {
                    return;
                }
                buffered.clear();
                used_bytes = 0;
                segment_no += 1;
            }
            buffered.push(name);
            used_bytes += size;
        }
        self.flush_segment(segment_prefix, &buffered, segment_no, true, autocomplete)
            .await;
    }

    async fn flush_segment(
        &self,
        segment_prefix: &Name,
        rows: &[String],
        segment_no: u64,
        is_final: bool,
        autocomplete: bool,
    ) -> bool {
        match self.make_reply_data(segment_prefix, rows, segment_no, is_final, autocomplete) {
            Ok(data) => {
                let mut state = self.state.lock().await;
                state.cache.insert(Arc::new(data));
                true
            }
            Err(error) => {
                tracing::warn!("cannot sign segment {segment_no} under {segment_prefix}: {error}");
                false
            }
        }
    }

    fn make_reply_data(
        &self,
        segment_prefix: &Name,
        rows: &[String],
        segment_no: u64,
        is_final: bool,
        autocomplete: bool,
    ) -> Result<Data, SignError> {
        let body = if autocomplete {
            serde_json::json!({ "next": rows })
        } else {
            serde_json::json!({ "results": rows })
        };
        let mut payload = body.to_string().into_bytes();
        payload.push(0);

        let segment = Component::from_segment(segment_no);
        let mut data = Data::new(segment_prefix.clone().appended(segment.clone()));
        data.set_content(payload);
        data.set_freshness_period_ms(SEGMENT_FRESHNESS_MS);
        if is_final {
            data.set_final_block_id(segment);
        }
        self.signer.sign(&mut data)?;
        Ok(data)
    }

    fn make_ack_data(&self, interest: &Interest, version: &Component) -> Result<Data, SignError> {
        let name = interest
            .name()
            .clone()
            .appended(version.clone())
            .appended(ACK_SUFFIX);
        let mut data = Data::new(name);
        self.signer.sign(&mut data)?;
        Ok(data)
    }
}
