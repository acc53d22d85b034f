// Async session facade: owns the engine, drives supplier fetches through the
// CatalogSource seam, and replays results into the engine as discrete events.
// Awaits always complete before the engine lock is taken, so a recompute is
// never preempted mid-pass.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheStatsReport, CatalogCache};
use crate::catalog::{CatalogKind, CatalogSlice};
use crate::controller::{CommitOutcome, EngineConfig, EngineError, EngineStats, PackageEngine};
use crate::defaults::{ComponentDefault, TransferPrefs};
use crate::selection::{RoomSelection, SelectionSet, SelectionTotals};

#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed supplier payload: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("catalog fetch failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

// Read-only supplier-facing seam. Implementations may be HTTP clients,
// database readers, or test fixtures; the session treats them all the same.
#[async_trait]
pub trait CatalogSource: Send + Sync + 'static {
    async fn fetch_catalog_slice(
        &self,
        kind: CatalogKind,
        filter_keys: &[String],
    ) -> Result<CatalogSlice, SourceError>;

    async fn fetch_package_defaults(
        &self,
        tier_id: &str,
    ) -> Result<Vec<ComponentDefault>, SourceError>;
}

// Retry settings for supplier fetches
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

// Exponential backoff with jitter to avoid synchronized retries
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    // Filter keys identifying the event/venue this build is for; passed
    // through to every slice fetch
    pub event_keys: Vec<String>,
}

// Transfer slices load before ticket/room slices so that by the time seeding
// becomes possible, transfer offerings are already in the snapshot.
const SLICE_LOAD_ORDER: [CatalogKind; 5] = [
    CatalogKind::CircuitTransfers,
    CatalogKind::AirportTransfers,
    CatalogKind::LoungePasses,
    CatalogKind::RoomTypes,
    CatalogKind::Tickets,
];

pub struct PackageSession {
    engine: Mutex<PackageEngine>,
    source: Arc<dyn CatalogSource>,
    cache: CatalogCache,
    config: SessionConfig,
}

impl PackageSession {
    pub fn new(config: SessionConfig, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            engine: Mutex::new(PackageEngine::new(config.engine.clone())),
            cache: CatalogCache::new(config.cache.clone()),
            source,
            config,
        }
    }

    // Choose a tier: fetch the defaults and every catalog slice, then replay
    // them into the engine. The last event completes the seed.
    pub async fn select_tier(&self, tier_id: &str) -> Result<SelectionSet, SessionError> {
        let defaults = self.source.fetch_package_defaults(tier_id).await?;

        let fetches = SLICE_LOAD_ORDER
            .iter()
            .map(|kind| self.fetch_slice_with_retry(*kind));
        let slices = futures::future::try_join_all(fetches).await?;

        let mut engine = self.engine.lock();
        engine.on_tier_changed(tier_id)?;
        engine.on_package_defaults_loaded(tier_id, defaults)?;
        for slice in slices {
            engine.on_catalog_loaded(slice)?;
        }
        Ok(engine.current_selection_set().clone())
    }

    // Deliver a single externally-obtained slice, e.g. a supplier push
    pub fn deliver_slice(&self, slice: CatalogSlice) -> Result<CommitOutcome, EngineError> {
        self.engine.lock().on_catalog_loaded(slice)
    }

    pub fn set_travelers(&self, count: u32) -> Result<CommitOutcome, EngineError> {
        self.engine.lock().on_traveler_count_changed(count)
    }

    pub fn update_rooms(&self, rooms: Vec<RoomSelection>) -> Result<CommitOutcome, EngineError> {
        self.engine.lock().on_hotel_selection_changed(rooms)
    }

    pub fn set_transfer_prefs(&self, prefs: TransferPrefs) {
        self.engine.lock().set_transfer_prefs(prefs);
    }

    // Resume a previously persisted build
    pub fn restore(&self, set: SelectionSet) -> Result<CommitOutcome, EngineError> {
        self.engine.lock().restore(set)
    }

    pub fn selection_set(&self) -> SelectionSet {
        self.engine.lock().current_selection_set().clone()
    }

    pub fn totals(&self) -> SelectionTotals {
        self.engine.lock().totals()
    }

    pub fn engine_stats(&self) -> EngineStats {
        self.engine.lock().stats()
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.cache.stats()
    }

    async fn fetch_slice_with_retry(&self, kind: CatalogKind) -> Result<CatalogSlice, SourceError> {
        if let Some(slice) = self.cache.get(kind, &self.config.event_keys) {
            debug!(kind = kind.as_str(), "catalog slice served from cache");
            return Ok(slice);
        }

        let mut attempt = 0;
        loop {
            match self
                .source
                .fetch_catalog_slice(kind, &self.config.event_keys)
                .await
            {
                Ok(slice) => {
                    self.cache
                        .store(kind, &self.config.event_keys, slice.clone(), None);
                    return Ok(slice);
                }
                Err(err) if attempt < self.config.retry.max_retries => {
                    attempt += 1;
                    let backoff = calculate_backoff(attempt, &self.config.retry);
                    warn!(
                        kind = kind.as_str(),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "catalog fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RoomType, TicketType};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Fixture source with injectable failures, in the style of our mock
    // supplier servers
    struct MockCatalogSource {
        slices: HashMap<CatalogKind, CatalogSlice>,
        defaults: HashMap<String, Vec<ComponentDefault>>,
        fail_next: AtomicUsize,
        fetch_count: AtomicUsize,
    }

    impl MockCatalogSource {
        fn new() -> Self {
            let mut slices = HashMap::new();
            slices.insert(
                CatalogKind::Tickets,
                CatalogSlice::Tickets(vec![TicketType {
                    id: "t-grandstand".to_string(),
                    name: "Grandstand".to_string(),
                    quantity_available: Some(100),
                    provisional: false,
                    price: 100.0,
                }]),
            );
            slices.insert(
                CatalogKind::RoomTypes,
                CatalogSlice::RoomTypes(vec![RoomType {
                    id: "r-double".to_string(),
                    hotel_id: "h1".to_string(),
                    name: "Double".to_string(),
                    max_people: Some(2),
                    quantity_available: Some(3),
                    provisional: false,
                    price: 180.0,
                    check_in: Some("2025-06-05".parse().unwrap()),
                    check_out: Some("2025-06-09".parse().unwrap()),
                }]),
            );
            slices.insert(
                CatalogKind::CircuitTransfers,
                CatalogSlice::CircuitTransfers(vec![]),
            );
            slices.insert(
                CatalogKind::AirportTransfers,
                CatalogSlice::AirportTransfers(vec![]),
            );
            slices.insert(
                CatalogKind::LoungePasses,
                CatalogSlice::LoungePasses(vec![]),
            );

            let mut defaults = HashMap::new();
            defaults.insert(
                "gold".to_string(),
                vec![
                    ComponentDefault {
                        kind: CatalogKind::Tickets,
                        component_id: "t-grandstand".to_string(),
                    },
                    ComponentDefault {
                        kind: CatalogKind::RoomTypes,
                        component_id: "r-double".to_string(),
                    },
                ],
            );

            Self {
                slices,
                defaults,
                fail_next: AtomicUsize::new(0),
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn fail_next_fetches(&self, count: usize) {
            self.fail_next.store(count, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CatalogSource for MockCatalogSource {
        async fn fetch_catalog_slice(
            &self,
            kind: CatalogKind,
            _filter_keys: &[String],
        ) -> Result<CatalogSlice, SourceError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);

            let failures = self.fail_next.load(Ordering::SeqCst);
            if failures > 0 {
                self.fail_next.store(failures - 1, Ordering::SeqCst);
                return Err(SourceError::Unavailable("supplier timeout".to_string()));
            }

            self.slices
                .get(&kind)
                .cloned()
                .ok_or_else(|| SourceError::Unavailable(format!("no slice for {}", kind.as_str())))
        }

        async fn fetch_package_defaults(
            &self,
            tier_id: &str,
        ) -> Result<Vec<ComponentDefault>, SourceError> {
            self.defaults
                .get(tier_id)
                .cloned()
                .ok_or_else(|| SourceError::Unavailable(format!("unknown tier {}", tier_id)))
        }
    }

    fn quick_retry_config() -> SessionConfig {
        SessionConfig {
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                backoff_multiplier: 1.5,
                jitter_factor: 0.1,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_select_tier_seeds_and_resolves() {
        let source = Arc::new(MockCatalogSource::new());
        let session = PackageSession::new(quick_retry_config(), source);

        let set = session.select_tier("gold").await.unwrap();
        assert_eq!(set.tickets.len(), 1);
        assert_eq!(set.hotel_rooms.len(), 1);

        // Traveler change flows through the same engine
        session.set_travelers(4).unwrap();
        let set = session.selection_set();
        assert_eq!(set.tickets[0].quantity, 4);
        assert_eq!(set.hotel_rooms[0].quantity, 2);
        assert_eq!(session.totals().tickets, 400.0);
    }

    #[tokio::test]
    async fn test_transient_fetch_failures_are_retried() {
        let source = Arc::new(MockCatalogSource::new());
        source.fail_next_fetches(2);
        let session = PackageSession::new(quick_retry_config(), Arc::clone(&source) as Arc<dyn CatalogSource>);

        let set = session.select_tier("gold").await.unwrap();
        assert!(!set.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_source_error() {
        let source = Arc::new(MockCatalogSource::new());
        // More failures than one fetch's retry budget
        source.fail_next_fetches(20);
        let session = PackageSession::new(quick_retry_config(), Arc::clone(&source) as Arc<dyn CatalogSource>);

        let result = session.select_tier("gold").await;
        assert!(matches!(result, Err(SessionError::Source(_))));
        // The engine never saw a partial event: nothing selected
        assert!(session.selection_set().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_tier_selection_hits_cache() {
        let source = Arc::new(MockCatalogSource::new());
        let session = PackageSession::new(quick_retry_config(), Arc::clone(&source) as Arc<dyn CatalogSource>);

        session.select_tier("gold").await.unwrap();
        let fetches_after_first = source.fetch_count.load(Ordering::SeqCst);

        session.select_tier("gold").await.unwrap();
        // Slices came from the cache the second time
        assert_eq!(source.fetch_count.load(Ordering::SeqCst), fetches_after_first);
        assert!(session.cache_stats().hit_count >= 5);
    }

    #[tokio::test]
    async fn test_unknown_tier_fails_before_touching_engine() {
        let source = Arc::new(MockCatalogSource::new());
        let session = PackageSession::new(quick_retry_config(), source);

        assert!(session.select_tier("platinum").await.is_err());
        assert!(session.selection_set().is_empty());
        assert_eq!(session.engine_stats().events_processed, 0);
    }

    #[test]
    fn test_backoff_growth_is_bounded() {
        let config = RetryConfig::default();
        let first = calculate_backoff(1, &config);
        let tenth = calculate_backoff(10, &config);
        assert!(first < tenth);
        // Cap plus maximum jitter
        let ceiling = config.max_backoff_ms as f64 * (1.0 + config.jitter_factor);
        assert!((tenth.as_millis() as f64) <= ceiling);
    }
}
