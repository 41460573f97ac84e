//! Integration tests for the map session.
//!
//! These tests drive a full session through its public surface only:
//! - Catalog mounting (store state → derived descriptors → renderer)
//! - Building scans and engine swaps (structural renderer changes)
//! - Failure propagation (source errors → health indicator → recovery)
//! - Draw routing (gestures → sector analysis and elevation profiles)
//!
//! Run with: `cargo test --test session_integration`

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geo_types::LineString;
use geojson::FeatureCollection;
use tokio::sync::watch;
use tokio::time::timeout;

use cartoscope::catalog::ids;
use cartoscope::dataset::{datasets, DatasetError, DatasetFetcher, DatasetLoader};
use cartoscope::descriptor::{LayerId, SourceId};
use cartoscope::draw::DrawEvent;
use cartoscope::elevation::{ElevationSample, ElevationService, SampleLocation};
use cartoscope::footprint::FootprintService;
use cartoscope::geometry::LngLatBounds;
use cartoscope::reconcile::{RendererLifecycle, RendererState};
use cartoscope::renderer::{EngineKind, HeadlessRenderer, RendererControl};
use cartoscope::session::{MapSession, RendererFactory, SessionConfig};
use cartoscope::store::{HealthStatus, MapStore, SystemHealth};

// ============================================================================
// Mock Implementations
// ============================================================================

/// Dataset fetcher serving fixed bodies from memory.
struct StaticFetcher {
    bodies: HashMap<String, String>,
}

impl StaticFetcher {
    fn new() -> Self {
        Self {
            bodies: HashMap::new(),
        }
    }

    fn with_body(mut self, name: &str, body: &str) -> Self {
        self.bodies.insert(name.to_string(), body.to_string());
        self
    }
}

impl DatasetFetcher for StaticFetcher {
    fn fetch(&self, name: &str) -> impl Future<Output = Result<String, DatasetError>> + Send {
        let result = self
            .bodies
            .get(name)
            .cloned()
            .ok_or_else(|| DatasetError::Fetch(format!("no dataset named '{name}'")));
        async move { result }
    }
}

/// Elevation service reporting the same height for every vertex.
struct FlatElevation {
    meters: f64,
}

impl ElevationService for FlatElevation {
    fn profile(&self, line: &LineString<f64>) -> impl Future<Output = Vec<ElevationSample>> + Send {
        let samples: Vec<ElevationSample> = line
            .points()
            .enumerate()
            .map(|(index, point)| ElevationSample {
                distance: index as f64,
                elevation: self.meters,
                location: SampleLocation {
                    lat: point.y(),
                    lng: point.x(),
                },
            })
            .collect();
        async move { samples }
    }
}

/// Footprint service returning one building regardless of bounds.
struct SingleBuilding;

impl FootprintService for SingleBuilding {
    fn scan(&self, _bounds: &LngLatBounds) -> impl Future<Output = FeatureCollection> + Send {
        let mut properties = geojson::JsonObject::new();
        properties.insert("height".to_string(), serde_json::json!(12.0));
        let collection = FeatureCollection {
            bbox: None,
            features: vec![geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
                    vec![76.9360, 8.5238],
                    vec![76.9364, 8.5238],
                    vec![76.9364, 8.5242],
                    vec![76.9360, 8.5242],
                    vec![76.9360, 8.5238],
                ]]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }],
            foreign_members: None,
        };
        async move { collection }
    }
}

/// Renderer factory that keeps a control handle for every renderer it
/// builds, so tests can inject engine-side events after mounting.
struct RecordingFactory {
    controls: Arc<Mutex<Vec<RendererControl>>>,
}

impl RecordingFactory {
    fn new() -> (Self, Arc<Mutex<Vec<RendererControl>>>) {
        let controls = Arc::new(Mutex::new(Vec::new()));
        let factory = Self {
            controls: Arc::clone(&controls),
        };
        (factory, controls)
    }
}

impl RendererFactory for RecordingFactory {
    type Handle = HeadlessRenderer;

    fn build(&mut self, kind: EngineKind) -> HeadlessRenderer {
        let renderer = HeadlessRenderer::new(kind, Some("pk.integration".to_string()));
        renderer.control().complete_style_load();
        self.controls.lock().unwrap().push(renderer.control());
        renderer
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Zoning reference data: one district under the home view, one far away.
fn zoning_body() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"zone_name": "Residential"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [76.92, 8.51], [76.95, 8.51], [76.95, 8.54],
                    [76.92, 8.54], [76.92, 8.51]
                ]]}
            },
            {
                "type": "Feature",
                "properties": {"zone_name": "Industrial"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [77.10, 8.51], [77.13, 8.51], [77.13, 8.54],
                    [77.10, 8.54], [77.10, 8.51]
                ]]}
            }
        ]
    })
    .to_string()
}

/// Infrastructure reference data: one amenity inside the drawn sector, one
/// outside it.
fn infrastructure_body() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "Central Metro"},
                "geometry": {"type": "Point", "coordinates": [76.9366, 8.5241]}
            },
            {
                "type": "Feature",
                "properties": {"name": "Harbour Clinic"},
                "geometry": {"type": "Point", "coordinates": [77.11, 8.52]}
            }
        ]
    })
    .to_string()
}

/// Polygon covering the home-view districts and the Central Metro point.
fn sector_polygon() -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
        vec![76.90, 8.50],
        vec![76.96, 8.50],
        vec![76.96, 8.56],
        vec![76.90, 8.56],
        vec![76.90, 8.50],
    ]]))
}

/// Three-vertex line across the home view.
fn ridge_line() -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::LineString(vec![
        vec![76.90, 8.50],
        vec![76.93, 8.53],
        vec![76.96, 8.56],
    ]))
}

fn start_city_session() -> (MapSession, Arc<Mutex<Vec<RendererControl>>>) {
    let (factory, controls) = RecordingFactory::new();
    let fetcher = StaticFetcher::new()
        .with_body(datasets::ZONING, &zoning_body())
        .with_body(datasets::INFRASTRUCTURE, &infrastructure_body());
    let session = MapSession::start(
        SessionConfig::new().with_access_token("pk.integration"),
        factory,
        DatasetLoader::new(fetcher),
        FlatElevation { meters: 210.0 },
        SingleBuilding,
    );
    (session, controls)
}

fn mounted(state: &RendererState) -> bool {
    state.lifecycle == RendererLifecycle::Ready && !state.active_layer_ids.is_empty()
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

async fn wait_for_health(store: &MapStore, status: HealthStatus) -> SystemHealth {
    let mut rx = store.subscribe();
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

/// Waits until an optional watch channel carries a value.
async fn wait_for_some<T: Clone>(rx: &mut watch::Receiver<Option<T>>) -> T {
    timeout(Duration::from_secs(2), async {
        loop {
            {
                let value = rx.borrow_and_update();
                if let Some(value) = value.as_ref() {
                    return value.clone();
                }
            }
            rx.changed().await.expect("watch channel closed");
        }
    })
    .await
    .expect("timed out waiting for a published value")
}

/// Waits until an optional watch channel is cleared.
async fn wait_for_none<T: Clone>(rx: &mut watch::Receiver<Option<T>>) {
    timeout(Duration::from_secs(2), async {
        loop {
            {
                if rx.borrow_and_update().is_none() {
                    return;
                }
            }
            rx.changed().await.expect("watch channel closed");
        }
    })
    .await
    .expect("timed out waiting for the channel to clear");
}

// ============================================================================
// Catalog Mounting
// ============================================================================

#[tokio::test]
async fn test_session_mounts_catalog_end_to_end() {
    let (session, _controls) = start_city_session();

    let state = wait_for_state(&session, mounted).await;

    assert_eq!(state.engine, EngineKind::Mapbox);
    assert_eq!(state.active_source_ids.len(), 6);
    assert_eq!(state.active_layer_ids.len(), 10);
    assert!(state
        .active_source_ids
        .contains(&SourceId::from(ids::STREETS_SOURCE)));
    assert!(state
        .active_source_ids
        .contains(&SourceId::from(ids::DEM_SOURCE)));
    assert!(state
        .active_layer_ids
        .contains(&LayerId::from(ids::BUILDINGS_3D)));
    assert_eq!(state.error_message, None);
    assert_eq!(session.store().snapshot().health.status, HealthStatus::Healthy);

    session.shutdown().await;
}

#[tokio::test]
async fn test_building_scan_round_trip() {
    let (session, _controls) = start_city_session();
    wait_for_state(&session, mounted).await;

    session.scan_buildings();
    let state = wait_for_state(&session, |s| {
        s.active_source_ids
            .contains(&SourceId::from(ids::LIVE_BUILDINGS_SOURCE))
    })
    .await;
    assert!(state
        .active_layer_ids
        .contains(&LayerId::from(ids::LIVE_BUILDINGS)));
    assert_eq!(state.active_layer_ids.len(), 11);

    session.clear_buildings();
    let state = wait_for_state(&session, |s| {
        !s.active_source_ids
            .contains(&SourceId::from(ids::LIVE_BUILDINGS_SOURCE))
    })
    .await;
    assert_eq!(state.active_layer_ids.len(), 10);

    session.shutdown().await;
}

// ============================================================================
// Engine Swaps and Failure Propagation
// ============================================================================

#[tokio::test]
async fn test_engine_swap_carries_catalog() {
    let (session, _controls) = start_city_session();
    let before = wait_for_state(&session, mounted).await;

    session.swap_engine(EngineKind::MapLibre);
    let after = wait_for_state(&session, |s| {
        s.engine == EngineKind::MapLibre && mounted(s)
    })
    .await;

    assert_eq!(after.active_source_ids, before.active_source_ids);
    assert_eq!(after.active_layer_ids, before.active_layer_ids);
    assert_eq!(after.error_message, None);

    session.shutdown().await;
}

#[tokio::test]
async fn test_source_failure_flows_to_health_indicator() {
    let (session, controls) = start_city_session();
    wait_for_state(&session, mounted).await;

    controls.lock().unwrap()[0]
        .emit_source_error(Some(SourceId::from(ids::DEM_SOURCE)), "tile fetch failed");

    let health = wait_for_health(session.store(), HealthStatus::Failed).await;
    assert_eq!(health.message, "Failed [mapbox-dem]: tile fetch failed");
    let state =
        wait_for_state(&session, |s| s.lifecycle == RendererLifecycle::Error).await;
    assert_eq!(
        state.error_message.as_deref(),
        Some("Failed [mapbox-dem]: tile fetch failed")
    );

    // A swap builds a fresh renderer and replays the catalog onto it.
    session.swap_engine(EngineKind::MapLibre);
    let state = wait_for_state(&session, |s| {
        s.engine == EngineKind::MapLibre && mounted(s)
    })
    .await;
    assert_eq!(state.error_message, None);
    let health = wait_for_health(session.store(), HealthStatus::Healthy).await;
    assert_eq!(health.message, "System Operational");

    session.shutdown().await;
}

// ============================================================================
// Draw Routing
// ============================================================================

#[tokio::test]
async fn test_polygon_draw_produces_sector_report() {
    let (session, _controls) = start_city_session();
    wait_for_state(&session, mounted).await;

    let mut analysis = session.draw().analysis();
    session.draw().submit(DrawEvent::Create(sector_polygon()));

    let report = wait_for_some(&mut analysis).await;
    assert_eq!(report.intersected_zones, vec!["Residential"]);
    assert_eq!(report.amenity_count, 1);
    assert_eq!(report.amenities, vec!["Central Metro"]);
    assert!(report.area_acres > 0.0);

    session.draw().submit(DrawEvent::Delete);
    wait_for_none(&mut analysis).await;

    session.shutdown().await;
}

#[tokio::test]
async fn test_line_draw_produces_elevation_profile() {
    let (session, _controls) = start_city_session();
    wait_for_state(&session, mounted).await;

    let mut profile = session.draw().elevation();
    session.draw().submit(DrawEvent::Create(ridge_line()));

    let samples = wait_for_some(&mut profile).await;
    assert_eq!(samples.len(), 3);
    assert!(samples.iter().all(|sample| sample.elevation == 210.0));
    assert_eq!(samples[0].location.lng, 76.90);
    assert_eq!(samples[2].location.lat, 8.56);

    session.shutdown().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_completes_promptly() {
    let (session, _controls) = start_city_session();
    wait_for_state(&session, mounted).await;

    timeout(Duration::from_secs(2), session.shutdown())
        .await
        .expect("shutdown timed out");
}
