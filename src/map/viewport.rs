//! Debounced viewport tracking.
//!
//! [`ViewportWatcher`] keeps the markers on a [`MapSurface`] in sync with the
//! records inside the visible rectangle. Bursts of viewport events collapse
//! into one query after the debounce delay, near-identical rectangles are
//! ignored, and every query carries a generation number so a slow response
//! can never overwrite the result of a newer one.

use crate::api::PropertyApi;
use crate::map::bounds::Bounds;
use crate::map::marker::{MapSurface, MarkerSummary};
use crate::map::registry::{MarkerRegistry, ReconcileOutcome};
use crate::models::PropertyId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct WatcherSettings {
    pub debounce: Duration,
    /// Fractional change below which a viewport counts as unchanged
    pub change_threshold: f64,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            change_threshold: 0.05,
        }
    }
}

/// Result of one refresh attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Viewport too close to the last queried one; nothing fetched
    Skipped,
    /// Markers reconciled against the response
    Applied(ReconcileOutcome),
    /// A newer query was issued while this one was in flight
    Stale,
    /// Query failed; previous markers kept
    Failed,
}

struct ViewportState<S: MapSurface> {
    surface: S,
    registry: MarkerRegistry<S::Marker>,
    last_bounds: Option<Bounds>,
    loading: bool,
}

struct Shared<A, S: MapSurface> {
    api: Arc<A>,
    token: String,
    settings: WatcherSettings,
    state: Mutex<ViewportState<S>>,
    generation: AtomicU64,
}

impl<A: PropertyApi, S: MapSurface> Shared<A, S> {
    async fn refresh(&self, bounds: Bounds) -> RefreshOutcome {
        let generation = {
            let mut state = self.state.lock().await;
            // Any query still in flight belongs to a viewport the user has left
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = state.last_bounds {
                if !bounds.differs_significantly(&previous, self.settings.change_threshold) {
                    debug!("Viewport change below threshold, skipping fetch");
                    if state.loading {
                        state.loading = false;
                        state.surface.set_loading(false);
                    }
                    return RefreshOutcome::Skipped;
                }
            }
            state.loading = true;
            state.surface.set_loading(true);
            generation
        };

        debug!("Querying bounds {:?} (generation {})", bounds, generation);
        let result = self.api.properties_in_bounds(&self.token, &bounds).await;

        let mut guard = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale bounds response (generation {})", generation);
            return RefreshOutcome::Stale;
        }

        let state = &mut *guard;
        state.loading = false;
        state.surface.set_loading(false);

        match result {
            Ok(records) => {
                state.last_bounds = Some(bounds);
                let outcome = state.registry.reconcile(&records, &mut state.surface);
                info!(
                    "{} properties in view (+{} / -{})",
                    state.registry.len(),
                    outcome.added.len(),
                    outcome.removed.len()
                );
                RefreshOutcome::Applied(outcome)
            }
            Err(e) => {
                warn!("Bounds query failed, keeping previous markers: {}", e);
                RefreshOutcome::Failed
            }
        }
    }
}

/// Keeps map markers in sync with the records in the visible rectangle
pub struct ViewportWatcher<A, S: MapSurface> {
    shared: Arc<Shared<A, S>>,
    pending: std::sync::Mutex<Option<JoinHandle<RefreshOutcome>>>,
}

impl<A, S> ViewportWatcher<A, S>
where
    A: PropertyApi + 'static,
    S: MapSurface,
{
    pub fn new(api: Arc<A>, token: impl Into<String>, surface: S) -> Self {
        Self::with_settings(api, token, surface, WatcherSettings::default())
    }

    pub fn with_settings(
        api: Arc<A>,
        token: impl Into<String>,
        surface: S,
        settings: WatcherSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                token: token.into(),
                settings,
                state: Mutex::new(ViewportState {
                    surface,
                    registry: MarkerRegistry::new(),
                    last_bounds: None,
                    loading: false,
                }),
                generation: AtomicU64::new(0),
            }),
            pending: std::sync::Mutex::new(None),
        }
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<RefreshOutcome>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Viewport stopped moving; re-arm the debounce timer
    pub fn on_viewport_settled(&self, bounds: Bounds) {
        let shared = Arc::clone(&self.shared);
        let delay = shared.settings.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Own task for the query; re-arming cancels only the wait
            tokio::spawn(async move { shared.refresh(bounds).await })
                .await
                .unwrap_or(RefreshOutcome::Stale)
        });

        if let Some(previous) = self.pending_slot().replace(task) {
            previous.abort();
        }
    }

    /// Wait for the armed timer, if any, and its query to finish
    pub async fn settle(&self) -> Option<RefreshOutcome> {
        let task = self.pending_slot().take()?;
        task.await.ok()
    }

    /// Query immediately, bypassing the debounce timer
    pub async fn refresh_now(&self, bounds: Bounds) -> RefreshOutcome {
        self.shared.refresh(bounds).await
    }

    /// Remove the marker of a deleted record
    pub async fn evict(&self, id: PropertyId) -> bool {
        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        let removed = state.registry.evict(id, &mut state.surface);
        if removed {
            debug!("Evicted marker for deleted property {}", id);
        }
        removed
    }

    /// Evict markers for every id published on `deletions`
    pub fn follow_deletions(
        &self,
        mut deletions: broadcast::Receiver<PropertyId>,
    ) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            loop {
                match deletions.recv().await {
                    Ok(id) => {
                        let mut guard = shared.state.lock().await;
                        let state = &mut *guard;
                        state.registry.evict(id, &mut state.surface);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} deletion events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Click: popup content for a marker
    pub async fn marker_summary(&self, id: PropertyId) -> Option<MarkerSummary> {
        let state = self.shared.state.lock().await;
        state.registry.get(id).map(|placed| placed.summary.clone())
    }

    /// Hover in/out
    pub async fn emphasize(&self, id: PropertyId, emphasized: bool) -> bool {
        let mut guard = self.shared.state.lock().await;
        let state = &mut *guard;
        match state.registry.get(id) {
            Some(placed) => {
                state.surface.set_emphasis(&placed.handle, emphasized);
                true
            }
            None => false,
        }
    }

    /// Summaries of every marker on the map, by id
    pub async fn markers_in_view(&self) -> Vec<MarkerSummary> {
        let state = self.shared.state.lock().await;
        state
            .registry
            .ids()
            .into_iter()
            .filter_map(|id| state.registry.get(id).map(|placed| placed.summary.clone()))
            .collect()
    }

    pub async fn marker_ids(&self) -> Vec<PropertyId> {
        self.shared.state.lock().await.registry.ids()
    }

    pub async fn last_bounds(&self) -> Option<Bounds> {
        self.shared.state.lock().await.last_bounds
    }

    pub async fn is_loading(&self) -> bool {
        self.shared.state.lock().await.loading
    }

    /// Run `f` against the map surface
    pub async fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.shared.state.lock().await;
        f(&state.surface)
    }

    /// Cancel the pending timer
    pub fn shutdown(&self) {
        if let Some(task) = self.pending_slot().take() {
            task.abort();
        }
    }
}

impl<A, S: MapSurface> Drop for ViewportWatcher<A, S> {
    fn drop(&mut self) {
        let slot = self
            .pending
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, MOCK_TOKEN};
    use crate::models::GeoPoint;

    #[derive(Default)]
    struct RecordingSurface {
        placed: Vec<String>,
        removed: usize,
        loading_flips: usize,
        emphasized: Vec<(usize, bool)>,
    }

    impl MapSurface for RecordingSurface {
        type Marker = usize;

        fn place_marker(&mut self, _at: GeoPoint, summary: &MarkerSummary) -> usize {
            self.placed.push(summary.title.clone());
            self.placed.len() - 1
        }

        fn remove_marker(&mut self, _marker: usize) {
            self.removed += 1;
        }

        fn set_emphasis(&mut self, marker: &usize, emphasized: bool) {
            self.emphasized.push((*marker, emphasized));
        }

        fn set_loading(&mut self, _loading: bool) {
            self.loading_flips += 1;
        }
    }

    fn gangnam() -> Bounds {
        Bounds::new(37.49, 37.52, 127.02, 127.05)
    }

    fn watcher(api: Arc<MockApi>) -> ViewportWatcher<MockApi, RecordingSurface> {
        ViewportWatcher::new(api, MOCK_TOKEN, RecordingSurface::default())
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_issues_one_query() {
        let api = Arc::new(MockApi::seeded());
        let watcher = watcher(Arc::clone(&api));

        let start = gangnam();
        for step in 0..5 {
            watcher.on_viewport_settled(start.panned(0.1 * step as f64, 0.0));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let outcome = watcher.settle().await;

        assert!(matches!(outcome, Some(RefreshOutcome::Applied(_))));
        assert_eq!(api.bounds_query_count(), 1);
        assert_eq!(watcher.last_bounds().await, Some(start.panned(0.4, 0.0)));
    }

    #[tokio::test]
    async fn small_change_skips_the_fetch() {
        let api = Arc::new(MockApi::seeded());
        let watcher = watcher(Arc::clone(&api));

        watcher.refresh_now(gangnam()).await;
        let ids = watcher.marker_ids().await;

        let outcome = watcher.refresh_now(gangnam().panned(0.01, 0.04)).await;

        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(api.bounds_query_count(), 1);
        assert_eq!(watcher.marker_ids().await, ids);
    }

    #[tokio::test]
    async fn failed_query_keeps_previous_state() {
        let api = Arc::new(MockApi::seeded());
        let good = watcher(Arc::clone(&api));
        good.refresh_now(gangnam()).await;
        assert_eq!(good.marker_ids().await, vec![1]);

        let broken = ViewportWatcher::new(Arc::clone(&api), "expired", RecordingSurface::default());
        let outcome = broken.refresh_now(gangnam()).await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(broken.marker_ids().await.is_empty());
        assert_eq!(broken.last_bounds().await, None);
        assert!(!broken.is_loading().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let api = Arc::new(MockApi::seeded());
        api.delay_bounds_queries([Duration::from_secs(2), Duration::from_millis(10)])
            .await;
        let watcher = Arc::new(watcher(Arc::clone(&api)));

        let wide = Bounds::new(37.0, 38.0, 126.0, 128.0);
        let slow = {
            let watcher = Arc::clone(&watcher);
            tokio::spawn(async move { watcher.refresh_now(wide).await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        let second = watcher.refresh_now(gangnam()).await;
        let first = slow.await.unwrap();

        assert_eq!(first, RefreshOutcome::Stale);
        assert!(matches!(second, RefreshOutcome::Applied(_)));
        assert_eq!(watcher.marker_ids().await, vec![1]);
        assert_eq!(watcher.last_bounds().await, Some(gangnam()));
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_last_view_clears_loading_and_drops_inflight_query() {
        let api = Arc::new(MockApi::seeded());
        let watcher = watcher(Arc::clone(&api));
        watcher.refresh_now(gangnam()).await;
        api.delay_bounds_queries([Duration::from_secs(2)]).await;

        watcher.on_viewport_settled(gangnam().panned(0.5, 0.5));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(watcher.is_loading().await);

        watcher.on_viewport_settled(gangnam());
        assert_eq!(watcher.settle().await, Some(RefreshOutcome::Skipped));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!watcher.is_loading().await);
        assert_eq!(api.bounds_query_count(), 2);
        assert_eq!(watcher.last_bounds().await, Some(gangnam()));
        assert_eq!(watcher.marker_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn click_and_hover_reach_the_marker() {
        let api = Arc::new(MockApi::seeded());
        let watcher = watcher(api);
        watcher.refresh_now(gangnam()).await;

        let summary = watcher.marker_summary(1).await.unwrap();
        assert_eq!(summary.title, "강남구 역삼동 오피스텔");
        assert!(watcher.emphasize(1, true).await);
        assert!(!watcher.emphasize(2, true).await);
        assert_eq!(
            watcher.with_surface(|s| s.emphasized.clone()).await,
            vec![(0, true)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timer() {
        let api = Arc::new(MockApi::seeded());
        let watcher = watcher(Arc::clone(&api));

        watcher.on_viewport_settled(gangnam());
        watcher.shutdown();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(api.bounds_query_count(), 0);
        assert_eq!(watcher.settle().await, None);
    }
}
