//! The session facade: one running map.
//!
//! [`MapSession`] wires the engines together: the state store feeds the
//! layer catalog, the catalog feeds the reconciler, the reconciler drives a
//! renderer, and draw gestures route to the analysis and elevation
//! services. All reconciliation happens on a single worker task that owns
//! the renderer outright, so no locking is needed anywhere in the pipeline:
//! state changes arrive over a watch channel (coalescing under load),
//! renderer notifications over a broadcast channel, and imperative requests
//! over a command channel.

use std::sync::Arc;
use std::time::Duration;

use geo::Point;
use geojson::FeatureCollection;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::catalog::{derive_descriptors, CatalogConfig};
use crate::dataset::{datasets, DatasetFetcher, DatasetLoader, HttpFetcher};
use crate::descriptor::DescriptorSet;
use crate::draw::DrawRouter;
use crate::elevation::{ElevationService, GoogleElevationService};
use crate::footprint::{FootprintService, OverpassFootprints};
use crate::geometry::LngLatBounds;
use crate::reconcile::{Reconciler, RendererLifecycle, RendererState};
use crate::renderer::{EngineKind, RendererEvent, RendererHandle};
use crate::store::{HealthStatus, MapStore, SystemHealth};

use super::{HeadlessFactory, RendererFactory, SessionConfig};

/// Half-width in degrees of a live building scan around the view center.
const SCAN_RADIUS_DEG: f64 = 0.005;

/// Health message shown when no tile-provider token was configured.
const TOKEN_MISSING_HEALTH: &str = "Critical: Mapbox Token Missing";

const COMMAND_BUFFER: usize = 16;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while assembling a session's service stack.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

enum SessionCommand {
    ScanBuildings,
    ClearBuildings,
    SwapEngine(EngineKind),
}

/// A running map: store, catalog, reconciler, renderer, and draw routing,
/// assembled and supervised as one unit.
///
/// Interact through the [`store`](Self::store) for layer and view state,
/// through [`draw`](Self::draw) for region gestures, and through the
/// session's own methods for building scans and engine swaps. Observe the
/// renderer through [`renderer_state`](Self::renderer_state).
///
/// # Example
///
/// ```ignore
/// let session = MapSession::start_default(
///     SessionConfig::new().with_access_token("pk.live-token"),
/// )?;
/// session.store().toggle_present_day(PresentDayLayer::Healthcare);
/// session.scan_buildings();
/// // ...
/// session.shutdown().await;
/// ```
pub struct MapSession {
    store: MapStore,
    draw: DrawRouter,
    commands: mpsc::Sender<SessionCommand>,
    state_tx: Arc<watch::Sender<RendererState>>,
    worker: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl MapSession {
    /// Starts a session over an explicit service stack.
    ///
    /// The renderer is built from the factory, mounted, and handed to the
    /// session's worker task together with the loader and footprint
    /// service; the elevation service goes to the draw router. Must be
    /// called from within a Tokio runtime.
    pub fn start<RF, F, E, P>(
        config: SessionConfig,
        mut factory: RF,
        loader: DatasetLoader<F>,
        elevation: E,
        footprints: P,
    ) -> Self
    where
        RF: RendererFactory,
        F: DatasetFetcher + 'static,
        E: ElevationService + 'static,
        P: FootprintService + 'static,
    {
        let store = MapStore::new();
        let draw = DrawRouter::new(loader.clone(), elevation);

        let renderer = factory.build(config.engine());
        let events = renderer.subscribe();
        let reconciler = Reconciler::mount(renderer);

        let (state_tx, _) = watch::channel(reconciler.state());
        let state_tx = Arc::new(state_tx);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let worker = SessionWorker {
            store: store.clone(),
            reconciler,
            factory,
            loader,
            footprints,
            catalog: config.catalog().clone(),
            credential_missing: config.access_token().is_none(),
            scanned: None,
            last_desired: None,
            state_tx: Arc::clone(&state_tx),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run(commands_rx, events));
        info!(engine = %config.engine(), "map session started");

        Self {
            store,
            draw,
            commands: commands_tx,
            state_tx,
            worker: Some(handle),
            cancel,
        }
    }

    /// Starts a session over the standard service stack: headless
    /// renderer, HTTP dataset fetcher, Google elevation, Overpass
    /// footprints, all sharing one HTTP client.
    ///
    /// # Returns
    ///
    /// The running session, or a [`SessionError`] if the HTTP client could
    /// not be built.
    pub fn start_default(config: SessionConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let factory = HeadlessFactory::new(config.access_token().map(str::to_string));
        let fetcher = HttpFetcher::with_client(client.clone(), config.catalog().data_base_url());
        let loader = DatasetLoader::new(fetcher);
        let elevation = GoogleElevationService::new(
            client.clone(),
            config.elevation_api_key().map(str::to_string),
        );
        let footprints = OverpassFootprints::new(client);
        Ok(Self::start(config, factory, loader, elevation, footprints))
    }

    /// The session's state store. Actions on it flow through the catalog
    /// to the renderer automatically.
    pub fn store(&self) -> &MapStore {
        &self.store
    }

    /// The draw router handling region gestures.
    pub fn draw(&self) -> &DrawRouter {
        &self.draw
    }

    /// Subscribes to renderer state snapshots.
    ///
    /// The receiver starts with the current state and signals on every
    /// lifecycle or mounted-id change.
    pub fn renderer_state(&self) -> watch::Receiver<RendererState> {
        self.state_tx.subscribe()
    }

    /// Requests a live building scan around the current view center.
    ///
    /// The scan runs on the worker; its result appears as the live
    /// buildings source and layer once reconciled.
    pub fn scan_buildings(&self) {
        self.signal(SessionCommand::ScanBuildings);
    }

    /// Drops the scanned buildings, removing their layer from the map.
    pub fn clear_buildings(&self) {
        self.signal(SessionCommand::ClearBuildings);
    }

    /// Requests a swap to the given engine.
    ///
    /// The current renderer is torn down wholesale and the latest desired
    /// state is replayed onto a fresh one, which also recovers a session
    /// whose renderer had failed.
    pub fn swap_engine(&self, kind: EngineKind) {
        self.signal(SessionCommand::SwapEngine(kind));
    }

    fn signal(&self, command: SessionCommand) {
        if let Err(err) = self.commands.try_send(command) {
            warn!(error = %err, "session command dropped");
        }
    }

    /// Stops the worker tasks and waits for them to wind down.
    pub async fn shutdown(mut self) {
        info!("map session shutting down");
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                error!(error = %err, "session worker panicked");
            }
        }
        self.draw.shutdown().await;
        info!("map session shutdown complete");
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionWorker<RF: RendererFactory, F, P> {
    store: MapStore,
    reconciler: Reconciler<RF::Handle>,
    factory: RF,
    loader: DatasetLoader<F>,
    footprints: P,
    catalog: CatalogConfig,
    credential_missing: bool,
    scanned: Option<FeatureCollection>,
    last_desired: Option<DescriptorSet>,
    state_tx: Arc<watch::Sender<RendererState>>,
    cancel: CancellationToken,
}

impl<RF, F, P> SessionWorker<RF, F, P>
where
    RF: RendererFactory,
    F: DatasetFetcher + 'static,
    P: FootprintService + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut events: broadcast::Receiver<RendererEvent>,
    ) {
        if self.credential_missing {
            warn!("no access token configured, hosted tile sources will fail");
            self.store
                .set_health(SystemHealth::failed(TOKEN_MISSING_HEALTH));
        }
        let mut store_rx = self.store.subscribe();

        // Warm the loader so the first drawn region analyzes without a
        // network round trip.
        let (zoning, infrastructure) = tokio::join!(
            self.loader.load(datasets::ZONING),
            self.loader.load(datasets::INFRASTRUCTURE),
        );
        debug!(
            zoning = zoning.features.len(),
            infrastructure = infrastructure.features.len(),
            "reference datasets preloaded"
        );

        self.sync_catalog();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Some(new_events) = self.handle_command(command).await {
                            events = new_events;
                        }
                    }
                    None => break,
                },
                changed = store_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    store_rx.borrow_and_update();
                    self.sync_catalog();
                }
                event = events.recv() => match event {
                    Ok(event) => self.handle_renderer_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "renderer event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("renderer event channel closed");
                        break;
                    }
                },
            }
        }
        trace!("session worker stopped");
    }

    /// Handles one imperative request. An engine swap returns the event
    /// subscription of the replacement renderer.
    async fn handle_command(
        &mut self,
        command: SessionCommand,
    ) -> Option<broadcast::Receiver<RendererEvent>> {
        match command {
            SessionCommand::ScanBuildings => {
                self.scan_buildings().await;
                None
            }
            SessionCommand::ClearBuildings => {
                if self.scanned.take().is_some() {
                    info!("clearing scanned buildings");
                    self.sync_catalog();
                }
                None
            }
            SessionCommand::SwapEngine(kind) => Some(self.swap_engine(kind)),
        }
    }

    async fn scan_buildings(&mut self) {
        let view = self.store.snapshot().view;
        let center = Point::new(view.longitude, view.latitude);
        let bounds = LngLatBounds::around(center, SCAN_RADIUS_DEG);
        info!(
            west = bounds.west,
            south = bounds.south,
            east = bounds.east,
            north = bounds.north,
            "scanning live buildings around view center"
        );
        let collection = self.footprints.scan(&bounds).await;
        info!(
            features = collection.features.len(),
            "live building scan finished"
        );
        self.scanned = Some(collection);
        self.sync_catalog();
    }

    fn swap_engine(&mut self, kind: EngineKind) -> broadcast::Receiver<RendererEvent> {
        let renderer = self.factory.build(kind);
        let events = renderer.subscribe();
        if let Err(err) = self.reconciler.swap_engine(renderer) {
            warn!(error = %err, "replay onto swapped engine failed");
        }
        self.mirror_health();
        self.publish_state();
        events
    }

    /// Derives the descriptor catalog from the latest snapshot and syncs
    /// the renderer to it. Skips the reconciler entirely when the derived
    /// set is unchanged, which is the common case for view-only updates.
    fn sync_catalog(&mut self) {
        let snapshot = self.store.snapshot();
        let desired = derive_descriptors(&snapshot, self.scanned.as_ref(), &self.catalog);
        if self.last_desired.as_ref() == Some(&desired) {
            return;
        }
        match self.reconciler.sync(&desired) {
            Ok(mutations) if !mutations.is_empty() => {
                debug!(mutations = mutations.len(), "catalog synchronized");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "catalog sync failed"),
        }
        self.last_desired = Some(desired);
        self.mirror_health();
        self.publish_state();
    }

    fn handle_renderer_event(&mut self, event: &RendererEvent) {
        if let Err(err) = self.reconciler.handle_event(event) {
            warn!(error = %err, "renderer event handling failed");
        }
        self.mirror_health();
        self.publish_state();
    }

    /// Projects the reconciler lifecycle onto the store's health
    /// indicator. The first failure wins; later errors keep the original
    /// message, matching the reconciler's own error retention.
    fn mirror_health(&self) {
        match self.reconciler.lifecycle() {
            RendererLifecycle::Error => {
                if self.store.snapshot().health.status != HealthStatus::Failed {
                    let message = self
                        .reconciler
                        .error_message()
                        .unwrap_or("Renderer Failure")
                        .to_string();
                    self.store.set_health(SystemHealth::failed(message));
                }
            }
            RendererLifecycle::Ready => self.store.set_health(SystemHealth::healthy()),
            RendererLifecycle::Uninitialized | RendererLifecycle::StyleLoading => {}
        }
    }

    fn publish_state(&self) {
        let state = self.reconciler.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::catalog::ids;
    use crate::dataset::{FailureCache, MockFetcher};
    use crate::descriptor::SourceId;
    use crate::draw::DrawEvent;
    use crate::elevation::MockElevationService;
    use crate::footprint::MockFootprints;
    use crate::renderer::{HeadlessRenderer, RendererControl};
    use crate::store::PresentDayLayer;

    /// Factory that keeps a control handle for every renderer it builds.
    struct TestFactory {
        access_token: Option<String>,
        auto_load: bool,
        controls: Arc<Mutex<Vec<RendererControl>>>,
    }

    impl TestFactory {
        fn new() -> (Self, Arc<Mutex<Vec<RendererControl>>>) {
            let controls = Arc::new(Mutex::new(Vec::new()));
            let factory = Self {
                access_token: Some("pk.test".to_string()),
                auto_load: true,
                controls: Arc::clone(&controls),
            };
            (factory, controls)
        }

        fn without_token(mut self) -> Self {
            self.access_token = None;
            self
        }

        fn deferred_style_load(mut self) -> Self {
            self.auto_load = false;
            self
        }
    }

    impl RendererFactory for TestFactory {
        type Handle = HeadlessRenderer;

        fn build(&mut self, kind: EngineKind) -> HeadlessRenderer {
            let renderer = HeadlessRenderer::new(kind, self.access_token.clone());
            if self.auto_load {
                renderer.control().complete_style_load();
            }
            self.controls.lock().unwrap().push(renderer.control());
            renderer
        }
    }

    fn zoning_body() -> String {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"zone_name": "Residential"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [0.004, 0.004], [0.006, 0.004], [0.006, 0.006],
                    [0.004, 0.006], [0.004, 0.004]
                ]]}
            }]
        })
        .to_string()
    }

    fn infrastructure_body() -> String {
        serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "Central Metro"},
                "geometry": {"type": "Point", "coordinates": [0.005, 0.005]}
            }]
        })
        .to_string()
    }

    fn test_loader() -> DatasetLoader<MockFetcher> {
        let fetcher = MockFetcher::new()
            .with_body(datasets::ZONING, &zoning_body())
            .with_body(datasets::INFRASTRUCTURE, &infrastructure_body());
        DatasetLoader::with_failure_cache(fetcher, FailureCache::new())
    }

    fn polygon_geometry(side: f64) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![side, 0.0],
            vec![side, side],
            vec![0.0, side],
            vec![0.0, 0.0],
        ]]))
    }

    fn start_session(factory: TestFactory) -> MapSession {
        MapSession::start(
            SessionConfig::new().with_access_token("pk.test"),
            factory,
            test_loader(),
            MockElevationService::new(vec![]),
            MockFootprints::single_building(),
        )
    }

    async fn wait_for_state<C>(session: &MapSession, predicate: C) -> RendererState
    where
        C: Fn(&RendererState) -> bool,
    {
        let mut rx = session.renderer_state();
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if predicate(&state) {
                        return state.clone();
                    }
                }
                rx.changed().await.expect("renderer state channel closed");
            }
        })
        .await
        .expect("timed out waiting for renderer state")
    }

    async fn wait_for_health(session: &MapSession, status: HealthStatus) -> SystemHealth {
        let mut rx = session.store().subscribe();
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let snapshot = rx.borrow_and_update();
                    if snapshot.health.status == status {
                        return snapshot.health.clone();
                    }
                }
                rx.changed().await.expect("store channel closed");
            }
        })
        .await
        .expect("timed out waiting for health status")
    }

    fn mounted(state: &RendererState) -> bool {
        state.lifecycle == RendererLifecycle::Ready && !state.active_layer_ids.is_empty()
    }

    #[tokio::test]
    async fn test_session_mounts_full_catalog() {
        let (factory, _controls) = TestFactory::new();
        let session = start_session(factory);

        let state = wait_for_state(&session, mounted).await;
        assert_eq!(state.engine, EngineKind::Mapbox);
        assert_eq!(state.active_source_ids.len(), 6);
        assert_eq!(state.active_layer_ids.len(), 10);
        assert_eq!(session.store().snapshot().health, SystemHealth::healthy());

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_deferred_style_load_buffers_catalog() {
        let (factory, controls) = TestFactory::new();
        let session = start_session(factory.deferred_style_load());

        let state =
            wait_for_state(&session, |s| s.lifecycle == RendererLifecycle::StyleLoading).await;
        assert!(state.active_layer_ids.is_empty());

        controls.lock().unwrap()[0].complete_style_load();

        let state = wait_for_state(&session, mounted).await;
        assert_eq!(state.active_layer_ids.len(), 10);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_token_fails_health() {
        let (factory, _controls) = TestFactory::new();
        let session = MapSession::start(
            SessionConfig::new(),
            factory.without_token(),
            test_loader(),
            MockElevationService::new(vec![]),
            MockFootprints::single_building(),
        );

        let health = wait_for_health(&session, HealthStatus::Failed).await;
        assert_eq!(health.message, "Critical: Mapbox Token Missing");

        let state = wait_for_state(&session, |s| s.lifecycle == RendererLifecycle::Error).await;
        let message = state.error_message.expect("error message should be set");
        assert!(message.contains("access token missing"));

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_source_error_fails_health_and_swap_recovers() {
        let (factory, controls) = TestFactory::new();
        let session = start_session(factory);
        wait_for_state(&session, mounted).await;

        controls.lock().unwrap()[0]
            .emit_source_error(Some(SourceId::new(ids::DEM_SOURCE)), "tile fetch failed");

        let health = wait_for_health(&session, HealthStatus::Failed).await;
        assert_eq!(health.message, "Failed [mapbox-dem]: tile fetch failed");

        session.swap_engine(EngineKind::MapLibre);

        let state = wait_for_state(&session, |s| {
            s.engine == EngineKind::MapLibre && mounted(s)
        })
        .await;
        assert_eq!(state.active_layer_ids.len(), 10);
        assert!(state.error_message.is_none());

        let health = wait_for_health(&session, HealthStatus::Healthy).await;
        assert_eq!(health.message, "System Operational");

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_scan_adds_and_clear_removes_live_buildings() {
        let (factory, _controls) = TestFactory::new();
        let session = start_session(factory);
        wait_for_state(&session, mounted).await;

        session.scan_buildings();
        let state = wait_for_state(&session, |s| {
            s.active_layer_ids
                .iter()
                .any(|id| id.as_str() == ids::LIVE_BUILDINGS)
        })
        .await;
        assert_eq!(state.active_layer_ids.len(), 11);
        assert!(state
            .active_source_ids
            .contains(&SourceId::new(ids::LIVE_BUILDINGS_SOURCE)));

        session.clear_buildings();
        let state = wait_for_state(&session, |s| {
            !s.active_layer_ids
                .iter()
                .any(|id| id.as_str() == ids::LIVE_BUILDINGS)
        })
        .await;
        assert_eq!(state.active_layer_ids.len(), 10);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_store_changes_keep_session_live() {
        let (factory, _controls) = TestFactory::new();
        let session = start_session(factory);
        wait_for_state(&session, mounted).await;

        // Property-only changes produce no structural renderer state, so
        // there is nothing to observe directly; a scan afterwards proves
        // the worker digested them and kept running.
        session.store().toggle_present_day(PresentDayLayer::Healthcare);
        session.store().set_master_plan_visible(false);
        session.store().set_master_plan_opacity(0.4);

        session.scan_buildings();
        wait_for_state(&session, |s| {
            s.active_layer_ids
                .iter()
                .any(|id| id.as_str() == ids::LIVE_BUILDINGS)
        })
        .await;

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_draw_gestures_route_to_analysis() {
        let (factory, _controls) = TestFactory::new();
        let session = start_session(factory);

        let mut analysis = session.draw().analysis();
        session
            .draw()
            .submit(DrawEvent::Create(polygon_geometry(0.01)));

        timeout(Duration::from_secs(2), analysis.changed())
            .await
            .expect("timed out waiting for analysis")
            .expect("analysis channel closed");

        let report = analysis
            .borrow()
            .clone()
            .expect("analysis should be published");
        assert_eq!(report.intersected_zones, vec!["Residential"]);
        assert_eq!(report.amenities, vec!["Central Metro"]);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_completes() {
        let (factory, _controls) = TestFactory::new();
        let session = start_session(factory);

        timeout(Duration::from_secs(2), session.shutdown())
            .await
            .expect("shutdown timed out");
    }
}
