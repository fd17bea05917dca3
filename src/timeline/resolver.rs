// SPDX-License-Identifier: MPL-2.0
//! Cached resolution of content references into playable locators.
//!
//! # Design
//!
//! - **Reference-keyed**: clips cut from the same media share one entry
//! - **Expiring**: an entry is refreshed once it is within the refresh margin
//!   of its expiry, so the sink is never handed a locator about to lapse
//! - **Coalesced**: concurrent resolves of one reference share a single
//!   in-flight locator request
//! - **LRU-bounded**: least recently used references are evicted first
//! - **Failures are not cached**: the next resolve asks the locator again
//!
//! # Usage
//!
//! ```ignore
//! let resolver = SourceResolver::new(Arc::new(locator), ResolverSettings::default());
//!
//! // Warm the cache ahead of a clip boundary
//! resolver.prefetch(&next_clip);
//!
//! // Later, the switcher resolves without waiting on the network
//! let source = resolver.resolve(&next_clip).await?;
//! ```

use super::clip_index::ClipIndex;
use super::lock;
use crate::application::port::AssetLocator;
use crate::config::EngineConfig;
use crate::domain::{Clip, ClipId};
use crate::error::{PlaybackError, TimeoutStage};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A playable locator for one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub clip_id: ClipId,
    pub source_ref: String,
    pub locator: String,
    pub expires_at: Instant,
}

impl ResolvedSource {
    /// Returns true if the locator is still usable `margin` after `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: Instant, margin: Duration) -> bool {
        is_fresh(self.expires_at, now, margin)
    }
}

fn is_fresh(expires_at: Instant, now: Instant, margin: Duration) -> bool {
    now.checked_add(margin)
        .is_some_and(|deadline| deadline < expires_at)
}

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Validity window requested from the locator.
    pub validity: Duration,
    /// Entries closer than this to expiry are refreshed.
    pub refresh_margin: Duration,
    /// Bound on a single locator request.
    pub timeout: Duration,
    /// Maximum number of cached references.
    pub capacity: NonZeroUsize,
}

impl ResolverSettings {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            validity: config.locator_validity(),
            refresh_margin: config.refresh_margin(),
            timeout: config.resolve_timeout().duration(),
            capacity: config.resolver_capacity(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Resolver cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Resolves answered from the cache.
    pub hits: u64,
    /// Resolves that had to wait for a locator request.
    pub misses: u64,
    /// Misses that joined a request already in flight.
    pub coalesced: u64,
    /// Entries dropped because they expired, were invalidated or were pushed out.
    pub evictions: u64,
    /// Requests sent to the asset locator.
    pub requests: u64,
    /// Requests that failed or timed out.
    pub failures: u64,
}

impl ResolverStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedLocator {
    locator: String,
    expires_at: Instant,
}

type PendingLocator = Shared<BoxFuture<'static, Result<CachedLocator, PlaybackError>>>;

enum Lookup {
    Cached(CachedLocator),
    Pending(PendingLocator),
}

struct ResolverState {
    cache: LruCache<String, CachedLocator>,
    in_flight: HashMap<String, PendingLocator>,
    refs_by_clip: HashMap<ClipId, String>,
    stats: ResolverStats,
}

/// Content reference resolver shared by the engine and the media switcher.
///
/// Cloning is cheap; clones share the cache.
pub struct SourceResolver<L> {
    locator: Arc<L>,
    settings: ResolverSettings,
    state: Arc<Mutex<ResolverState>>,
}

impl<L> Clone for SourceResolver<L> {
    fn clone(&self) -> Self {
        Self {
            locator: Arc::clone(&self.locator),
            settings: self.settings,
            state: Arc::clone(&self.state),
        }
    }
}

impl<L: AssetLocator> SourceResolver<L> {
    #[must_use]
    pub fn new(locator: Arc<L>, settings: ResolverSettings) -> Self {
        Self {
            locator,
            settings,
            state: Arc::new(Mutex::new(ResolverState {
                cache: LruCache::new(settings.capacity),
                in_flight: HashMap::new(),
                refs_by_clip: HashMap::new(),
                stats: ResolverStats::default(),
            })),
        }
    }

    /// Resolves the clip's content reference.
    ///
    /// The cache lookup happens immediately; only the wait for a locator
    /// request happens when the returned future is polled.
    ///
    /// # Errors
    ///
    /// The future yields [`PlaybackError::Resolution`] if the locator refuses
    /// the reference and [`PlaybackError::Timeout`] if it does not answer in time.
    pub fn resolve(
        &self,
        clip: &Clip,
    ) -> impl Future<Output = Result<ResolvedSource, PlaybackError>> + Send + 'static {
        let clip_id = clip.id.clone();
        let source_ref = clip.source_ref.clone();
        let lookup = self.lookup_or_request(&clip_id, &source_ref);
        async move {
            let entry = match lookup {
                Lookup::Cached(entry) => entry,
                Lookup::Pending(pending) => pending.await?,
            };
            Ok(ResolvedSource {
                clip_id,
                source_ref,
                locator: entry.locator,
                expires_at: entry.expires_at,
            })
        }
    }

    /// Starts resolving the clip in the background unless it is already cached
    /// or in flight. Errors are dropped; the real resolve will retry.
    ///
    /// Must be called from within a tokio runtime.
    pub fn prefetch(&self, clip: &Clip) {
        if self.is_cached(&clip.source_ref) || self.is_in_flight(&clip.source_ref) {
            return;
        }
        debug!(clip = %clip.id, reference = %clip.source_ref, "prefetching source");
        let resolving = self.resolve(clip);
        tokio::spawn(async move {
            if let Err(err) = resolving.await {
                debug!(%err, "prefetch failed");
            }
        });
    }

    /// Drops the cached locator used by `clip_id`.
    pub fn invalidate(&self, clip_id: &ClipId) {
        let mut state = lock(&self.state);
        if let Some(reference) = state.refs_by_clip.remove(clip_id) {
            if state.cache.pop(&reference).is_some() {
                state.stats.evictions += 1;
                debug!(clip = %clip_id, %reference, "invalidated resolved source");
            }
        }
    }

    /// Evicts entries whose clips are no longer in `index`.
    pub fn prune(&self, index: &ClipIndex) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        state.refs_by_clip.retain(|clip_id, _| index.contains(clip_id));

        let stale: Vec<String> = state
            .cache
            .iter()
            .map(|(reference, _)| reference.clone())
            .filter(|reference| !index.clips().any(|clip| &clip.source_ref == reference))
            .collect();
        for reference in stale {
            state.cache.pop(&reference);
            state.stats.evictions += 1;
            debug!(%reference, "pruned resolved source");
        }
    }

    /// Returns true if a fresh locator for `source_ref` is cached.
    ///
    /// Does not update LRU order.
    #[must_use]
    pub fn is_cached(&self, source_ref: &str) -> bool {
        let state = lock(&self.state);
        state.cache.peek(source_ref).is_some_and(|entry| {
            is_fresh(entry.expires_at, Instant::now(), self.settings.refresh_margin)
        })
    }

    #[must_use]
    pub fn is_in_flight(&self, source_ref: &str) -> bool {
        lock(&self.state).in_flight.contains_key(source_ref)
    }

    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        lock(&self.state).stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.state).cache.is_empty()
    }

    #[must_use]
    pub fn settings(&self) -> ResolverSettings {
        self.settings
    }

    fn lookup_or_request(&self, clip_id: &ClipId, source_ref: &str) -> Lookup {
        let now = Instant::now();
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        state
            .refs_by_clip
            .insert(clip_id.clone(), source_ref.to_string());

        if let Some(entry) = state.cache.get(source_ref).cloned() {
            if is_fresh(entry.expires_at, now, self.settings.refresh_margin) {
                state.stats.hits += 1;
                return Lookup::Cached(entry);
            }
            state.cache.pop(source_ref);
            state.stats.evictions += 1;
            debug!(reference = source_ref, "cached locator about to expire, refreshing");
        }

        state.stats.misses += 1;
        if let Some(pending) = state.in_flight.get(source_ref) {
            state.stats.coalesced += 1;
            return Lookup::Pending(pending.clone());
        }

        let pending = self.request(source_ref.to_string()).boxed().shared();
        state
            .in_flight
            .insert(source_ref.to_string(), pending.clone());
        state.stats.requests += 1;
        Lookup::Pending(pending)
    }

    /// Asks the locator for `source_ref` and records the outcome.
    fn request(
        &self,
        source_ref: String,
    ) -> impl Future<Output = Result<CachedLocator, PlaybackError>> + Send + 'static {
        let locator = Arc::clone(&self.locator);
        let state = Arc::clone(&self.state);
        let ResolverSettings {
            validity, timeout, ..
        } = self.settings;

        async move {
            debug!(reference = %source_ref, "requesting locator");
            let outcome = match tokio::time::timeout(timeout, locator.locate(&source_ref, validity))
                .await
            {
                // A grant never outlives the validity that was asked for.
                Ok(Ok(grant)) => Ok(CachedLocator {
                    locator: grant.locator,
                    expires_at: Instant::now() + grant.valid_for.min(validity),
                }),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(PlaybackError::Timeout {
                    stage: TimeoutStage::Resolve,
                    target: source_ref.clone(),
                    after: timeout,
                }),
            };

            let mut guard = lock(&state);
            guard.in_flight.remove(&source_ref);
            match &outcome {
                Ok(entry) => {
                    if let Some((evicted, _)) = guard.cache.push(source_ref.clone(), entry.clone()) {
                        if evicted != source_ref {
                            guard.stats.evictions += 1;
                        }
                    }
                }
                Err(err) => {
                    guard.stats.failures += 1;
                    warn!(reference = %source_ref, kind = err.kind(), %err, "locator request failed");
                }
            }
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::LocatorGrant;
    use crate::infrastructure::simulated::StaticLocator;

    fn settings() -> ResolverSettings {
        ResolverSettings {
            validity: Duration::from_secs(120),
            refresh_margin: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            capacity: NonZeroUsize::new(16).unwrap(),
        }
    }

    fn resolver(locator: StaticLocator) -> (SourceResolver<StaticLocator>, Arc<StaticLocator>) {
        let locator = Arc::new(locator);
        (SourceResolver::new(Arc::clone(&locator), settings()), locator)
    }

    /// Grants every request with a fixed validity, whatever was asked for.
    struct FixedGrantLocator(Duration);

    impl AssetLocator for FixedGrantLocator {
        async fn locate(
            &self,
            source_ref: &str,
            _valid_for: Duration,
        ) -> Result<LocatorGrant, PlaybackError> {
            Ok(LocatorGrant {
                locator: format!("https://fixed.test/{source_ref}"),
                valid_for: self.0,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_grant_is_capped_to_requested_validity() {
        let resolver = SourceResolver::new(Arc::new(FixedGrantLocator(Duration::MAX)), settings());
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        let source = resolver.resolve(&clip).await.unwrap();
        assert_eq!(source.expires_at, Instant::now() + Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn shorter_grant_is_honoured() {
        let resolver =
            SourceResolver::new(Arc::new(FixedGrantLocator(Duration::from_secs(45))), settings());
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        let source = resolver.resolve(&clip).await.unwrap();
        assert_eq!(source.expires_at, Instant::now() + Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn second_resolve_hits_cache() {
        let (resolver, locator) = resolver(StaticLocator::new("https://cdn.test"));
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        let first = resolver.resolve(&clip).await.unwrap();
        let second = resolver.resolve(&clip).await.unwrap();

        assert_eq!(first.locator, second.locator);
        assert!(first.locator.starts_with("https://cdn.test/media/a.mp4"));
        assert_eq!(locator.requests(), 1);
        let stats = resolver.stats();
        assert_eq!((stats.hits, stats.misses, stats.requests), (1, 1, 1));
        assert!((stats.hit_rate() - 50.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_resolves_share_one_request() {
        let (resolver, locator) =
            resolver(StaticLocator::new("https://cdn.test").with_latency(Duration::from_millis(200)));
        let c1 = Clip::new("c1", 0, 0.0, 5.0, "media/shared.mp4");
        let c2 = Clip::new("c2", 0, 5.0, 8.0, "media/shared.mp4");

        let a = resolver.resolve(&c1);
        let b = resolver.resolve(&c2);
        assert!(resolver.is_in_flight("media/shared.mp4"));
        let (a, b) = tokio::join!(a, b);

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.clip_id, ClipId::new("c1"));
        assert_eq!(b.clip_id, ClipId::new("c2"));
        assert_eq!(a.locator, b.locator);
        assert_eq!(locator.requests(), 1);
        assert_eq!(resolver.stats().coalesced, 1);
        assert!(!resolver.is_in_flight("media/shared.mp4"));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_near_expiry_is_refreshed() {
        let (resolver, locator) = resolver(StaticLocator::new("https://cdn.test"));
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        resolver.resolve(&clip).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        resolver.resolve(&clip).await.unwrap();
        assert_eq!(locator.requests(), 1);

        // 100 s in, the 120 s locator is inside the 30 s refresh margin.
        tokio::time::advance(Duration::from_secs(40)).await;
        let refreshed = resolver.resolve(&clip).await.unwrap();
        assert_eq!(locator.requests(), 2);
        assert!(refreshed.is_fresh_at(Instant::now(), Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let (resolver, locator) = resolver(StaticLocator::new("https://cdn.test"));
        locator.reject("media/missing.mp4");
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/missing.mp4");

        let err = resolver.resolve(&clip).await.unwrap_err();
        assert_eq!(err.kind(), "resolution");
        assert!(!resolver.is_cached("media/missing.mp4"));

        locator.allow("media/missing.mp4");
        resolver.resolve(&clip).await.unwrap();
        assert_eq!(locator.requests(), 2);
        assert_eq!(resolver.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_locator_times_out() {
        let (resolver, _locator) =
            resolver(StaticLocator::new("https://cdn.test").with_latency(Duration::from_secs(30)));
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        let err = resolver.resolve(&clip).await.unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::Timeout {
                stage: TimeoutStage::Resolve,
                ..
            }
        ));
        assert!(!resolver.is_in_flight("media/a.mp4"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_new_request() {
        let (resolver, locator) = resolver(StaticLocator::new("https://cdn.test"));
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        resolver.resolve(&clip).await.unwrap();
        resolver.invalidate(&clip.id);
        assert!(!resolver.is_cached("media/a.mp4"));
        resolver.resolve(&clip).await.unwrap();
        assert_eq!(locator.requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_sources_of_removed_clips() {
        let (resolver, _locator) = resolver(StaticLocator::new("https://cdn.test"));
        let kept = Clip::new("kept", 0, 0.0, 5.0, "media/a.mp4");
        let removed = Clip::new("removed", 0, 5.0, 8.0, "media/b.mp4");
        resolver.resolve(&kept).await.unwrap();
        resolver.resolve(&removed).await.unwrap();
        assert_eq!(resolver.len(), 2);

        resolver.prune(&ClipIndex::build([&kept]));

        assert!(resolver.is_cached("media/a.mp4"));
        assert!(!resolver.is_cached("media/b.mp4"));
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn prefetch_warms_cache() {
        let (resolver, locator) =
            resolver(StaticLocator::new("https://cdn.test").with_latency(Duration::from_millis(50)));
        let clip = Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4");

        resolver.prefetch(&clip);
        resolver.prefetch(&clip);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(resolver.is_cached("media/a.mp4"));
        assert_eq!(locator.requests(), 1);
        resolver.resolve(&clip).await.unwrap();
        assert_eq!(resolver.stats().hits, 1);
    }
}
