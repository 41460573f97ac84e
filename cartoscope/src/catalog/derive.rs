//! Derivation of the descriptor set from a store snapshot.

use geojson::FeatureCollection;
use serde_json::{json, Value};
use tracing::warn;

use super::config::CatalogConfig;
use crate::dataset::datasets;
use crate::descriptor::{
    DescriptorSet, LayerDescriptor, LayerKind, SourceDescriptor, StyleRule,
};
use crate::store::{MasterPlanOverlay, MasterPlanState, PresentDayLayers, StoreSnapshot};

/// Stable source and layer ids the catalog emits.
pub mod ids {
    /// Base vector tileset carrying POIs, roads and building footprints.
    pub const STREETS_SOURCE: &str = "mapbox-streets";
    /// Digital elevation model for terrain rendering.
    pub const DEM_SOURCE: &str = "mapbox-dem";
    /// Terrain vector tileset carrying contour features.
    pub const TERRAIN_SOURCE: &str = "mapbox-terrain";
    /// Planned metro station points.
    pub const METRO_STATIONS_SOURCE: &str = "metro-stations";
    /// Light-rail alignment lines.
    pub const LRTS_ALIGNMENT_SOURCE: &str = "lrts-alignment";
    /// Proposed land-use zone polygons.
    pub const LAND_USE_ZONES_SOURCE: &str = "land-use-zones";
    /// Footprints from the most recent live building scan.
    pub const LIVE_BUILDINGS_SOURCE: &str = "live-buildings";

    pub const HEALTHCARE: &str = "pd-healthcare";
    pub const EDUCATION: &str = "pd-education";
    pub const COMMERCIAL: &str = "pd-commercial";
    pub const TRANSPORT_STOPS: &str = "pd-transport-stops";
    pub const TRANSPORT_ROADS: &str = "pd-transport-roads";
    pub const BUILDINGS_3D: &str = "pd-3d-buildings";
    pub const CONTOUR_LINES: &str = "contour-lines";
    pub const METRO_STATIONS: &str = "mp-metro-stations";
    pub const LRTS_ALIGNMENT: &str = "mp-lrts-alignment";
    pub const LAND_USE_ZONES: &str = "mp-land-use-zones";
    pub const LIVE_BUILDINGS: &str = "live-buildings";
}

/// Depth hints, higher renders further back. Extrusions sit behind
/// everything, then area fills, then lines, then point markers, with
/// text labels frontmost.
mod depth {
    pub const CITY_BUILDINGS: i32 = 90;
    pub const SCANNED_BUILDINGS: i32 = 80;
    pub const CONTOURS: i32 = 70;
    pub const ZONE_FILLS: i32 = 60;
    pub const ALIGNMENT: i32 = 50;
    pub const ROADS: i32 = 40;
    pub const STATIONS: i32 = 30;
    pub const POI_MARKERS: i32 = 20;
    pub const LABELS: i32 = 10;
}

/// Derives the full descriptor set for a store snapshot.
///
/// This is the single place the application's layer catalog is defined:
/// given the same snapshot it always produces the same set, and the
/// reconciler turns consecutive sets into minimal renderer mutations.
/// Toggles map to `visible` flags rather than presence, so flipping one
/// repaints instead of tearing layers down.
///
/// # Arguments
///
/// * `snapshot` - Current store state
/// * `scanned_buildings` - Footprints from the latest live scan, if any
/// * `config` - Dataset URL configuration
pub fn derive_descriptors(
    snapshot: &StoreSnapshot,
    scanned_buildings: Option<&FeatureCollection>,
    config: &CatalogConfig,
) -> DescriptorSet {
    let mut set = DescriptorSet::new()
        .with_source(SourceDescriptor::vector_tiles(
            ids::STREETS_SOURCE,
            "mapbox://mapbox.mapbox-streets-v8",
        ))
        .with_source(SourceDescriptor::raster_dem(
            ids::DEM_SOURCE,
            "mapbox://mapbox.mapbox-terrain-dem-v1",
            512,
            14,
        ))
        .with_source(SourceDescriptor::vector_tiles(
            ids::TERRAIN_SOURCE,
            "mapbox://mapbox.mapbox-terrain-v2",
        ))
        .with_source(SourceDescriptor::geojson_url(
            ids::METRO_STATIONS_SOURCE,
            config.dataset_url(datasets::METRO_STATIONS),
        ))
        .with_source(SourceDescriptor::geojson_url(
            ids::LRTS_ALIGNMENT_SOURCE,
            config.dataset_url(datasets::LRTS_ALIGNMENT),
        ))
        .with_source(SourceDescriptor::geojson_url(
            ids::LAND_USE_ZONES_SOURCE,
            config.dataset_url(datasets::LAND_USE_ZONES),
        ));

    let present_day = &snapshot.present_day;
    let master_plan = &snapshot.master_plan;

    set = set
        .with_layer(city_buildings(present_day))
        .with_layer(contour_lines(present_day))
        .with_layer(land_use_zones(master_plan))
        .with_layer(lrts_alignment(master_plan))
        .with_layer(transport_roads(present_day))
        .with_layer(metro_stations(master_plan))
        .with_layer(healthcare(present_day))
        .with_layer(education(present_day))
        .with_layer(transport_stops(present_day))
        .with_layer(commercial(present_day));

    if let Some(buildings) = scanned_buildings {
        match serde_json::to_value(buildings) {
            Ok(data) => {
                set = set
                    .with_source(SourceDescriptor::geojson_inline(
                        ids::LIVE_BUILDINGS_SOURCE,
                        data,
                    ))
                    .with_layer(scanned_buildings_layer());
            }
            Err(err) => {
                warn!(error = %err, "dropping unencodable building scan from catalog");
            }
        }
    }

    set
}

/// Filter matching a single POI class, tolerating features without one.
fn poi_class_filter(class: &str) -> Value {
    json!(["==", ["coalesce", ["get", "class"], ""], class])
}

fn healthcare(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::HEALTHCARE, LayerKind::Circle, ids::STREETS_SOURCE)
        .with_source_layer("poi_label")
        .with_visible(flags.healthcare)
        .with_z_order_hint(depth::POI_MARKERS)
        .with_style(
            StyleRule::new()
                .with_paint("circle-color", json!("#EF4444"))
                .with_paint("circle-radius", json!(4))
                .with_filter(poi_class_filter("hospital")),
        )
}

fn education(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::EDUCATION, LayerKind::Circle, ids::STREETS_SOURCE)
        .with_source_layer("poi_label")
        .with_visible(flags.education)
        .with_z_order_hint(depth::POI_MARKERS)
        .with_style(
            StyleRule::new()
                .with_paint("circle-color", json!("#F59E0B"))
                .with_paint("circle-radius", json!(4))
                .with_filter(poi_class_filter("school")),
        )
}

fn commercial(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::COMMERCIAL, LayerKind::Symbol, ids::STREETS_SOURCE)
        .with_source_layer("poi_label")
        .with_visible(flags.commercial)
        .with_z_order_hint(depth::LABELS)
        .with_style(
            StyleRule::new()
                .with_layout("text-field", json!(["coalesce", ["get", "name"], "Facility"]))
                .with_layout("text-size", json!(12))
                .with_paint("text-color", json!("#10B981"))
                .with_paint("text-halo-color", json!("#064E3B"))
                .with_paint("text-halo-width", json!(1))
                .with_filter(json!([
                    "in",
                    ["coalesce", ["get", "class"], ""],
                    ["literal", ["shop", "mall", "grocery"]]
                ])),
        )
}

fn transport_stops(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::TRANSPORT_STOPS, LayerKind::Circle, ids::STREETS_SOURCE)
        .with_source_layer("transit_stop_label")
        .with_visible(flags.transport)
        .with_z_order_hint(depth::POI_MARKERS)
        .with_style(
            StyleRule::new()
                .with_paint("circle-color", json!("#3B82F6"))
                .with_paint("circle-radius", json!(4)),
        )
}

fn transport_roads(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::TRANSPORT_ROADS, LayerKind::Line, ids::STREETS_SOURCE)
        .with_source_layer("road")
        .with_visible(flags.transport)
        .with_z_order_hint(depth::ROADS)
        .with_style(
            StyleRule::new()
                .with_paint("line-color", json!("#06b6d4"))
                .with_paint("line-width", json!(2))
                .with_filter(poi_class_filter("major")),
        )
}

fn city_buildings(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::BUILDINGS_3D, LayerKind::Extrusion, ids::STREETS_SOURCE)
        .with_source_layer("building")
        .with_visible(flags.buildings_3d)
        .with_opacity(0.8)
        .with_z_order_hint(depth::CITY_BUILDINGS)
        .with_style(
            StyleRule::new()
                .with_paint(
                    "fill-extrusion-color",
                    json!([
                        "step",
                        ["coalesce", ["get", "height"], 0],
                        "#475569",
                        15,
                        "#0EA5E9",
                        50,
                        "#22D3EE"
                    ]),
                )
                .with_paint(
                    "fill-extrusion-height",
                    json!(["coalesce", ["get", "height"], 0]),
                )
                .with_paint(
                    "fill-extrusion-base",
                    json!(["coalesce", ["get", "min_height"], 0]),
                )
                .with_filter(json!(["==", "extrude", "true"])),
        )
}

/// Index contours every 10m, standard for topo maps.
fn contour_lines(flags: &PresentDayLayers) -> LayerDescriptor {
    LayerDescriptor::new(ids::CONTOUR_LINES, LayerKind::Line, ids::TERRAIN_SOURCE)
        .with_source_layer("contour")
        .with_visible(flags.terrain_3d)
        .with_opacity(0.3)
        .with_z_order_hint(depth::CONTOURS)
        .with_style(
            StyleRule::new()
                .with_paint("line-color", json!("#ffffff"))
                .with_paint("line-width", json!(1))
                .with_filter(json!(["all", ["==", ["%", ["get", "ele"], 10], 0]])),
        )
}

fn metro_stations(master_plan: &MasterPlanState) -> LayerDescriptor {
    LayerDescriptor::new(
        ids::METRO_STATIONS,
        LayerKind::Circle,
        ids::METRO_STATIONS_SOURCE,
    )
    .with_visible(master_plan.overlay_visible(MasterPlanOverlay::MetroStations))
    .with_opacity(master_plan.effective_opacity())
    .with_z_order_hint(depth::STATIONS)
    .with_style(
        StyleRule::new()
            .with_paint("circle-color", json!("#FFFF00"))
            .with_paint("circle-radius", json!(5))
            .with_paint("circle-stroke-color", json!("rgba(255, 255, 255, 0.8)"))
            .with_paint("circle-stroke-width", json!(2)),
    )
}

fn lrts_alignment(master_plan: &MasterPlanState) -> LayerDescriptor {
    LayerDescriptor::new(
        ids::LRTS_ALIGNMENT,
        LayerKind::Line,
        ids::LRTS_ALIGNMENT_SOURCE,
    )
    .with_visible(master_plan.overlay_visible(MasterPlanOverlay::LrtsAlignment))
    .with_opacity(master_plan.effective_opacity())
    .with_z_order_hint(depth::ALIGNMENT)
    .with_style(
        StyleRule::new()
            .with_paint("line-color", json!("#FF8C00"))
            .with_paint("line-width", json!(3)),
    )
}

fn land_use_zones(master_plan: &MasterPlanState) -> LayerDescriptor {
    LayerDescriptor::new(
        ids::LAND_USE_ZONES,
        LayerKind::Fill,
        ids::LAND_USE_ZONES_SOURCE,
    )
    .with_visible(master_plan.overlay_visible(MasterPlanOverlay::LandUseZones))
    .with_opacity(master_plan.effective_opacity())
    .with_z_order_hint(depth::ZONE_FILLS)
    .with_style(
        StyleRule::new()
            .with_paint(
                "fill-color",
                json!([
                    "match",
                    ["slice", ["coalesce", ["get", "zone_code"], ""], 0, 1],
                    "R",
                    "rgba(255, 255, 0, 0.4)",
                    "C",
                    "rgba(255, 0, 0, 0.4)",
                    "I",
                    "rgba(128, 0, 128, 0.4)",
                    "rgba(200, 200, 200, 0.4)"
                ]),
            )
            .with_paint("fill-outline-color", json!("rgba(255, 255, 255, 0.8)")),
    )
}

fn scanned_buildings_layer() -> LayerDescriptor {
    LayerDescriptor::new(
        ids::LIVE_BUILDINGS,
        LayerKind::Extrusion,
        ids::LIVE_BUILDINGS_SOURCE,
    )
    .with_opacity(0.8)
    .with_z_order_hint(depth::SCANNED_BUILDINGS)
    .with_style(
        StyleRule::new()
            .with_paint("fill-extrusion-color", json!("#F0F0F0"))
            .with_paint("fill-extrusion-height", json!(["get", "height"]))
            .with_paint("fill-extrusion-base", json!(0)),
    )
}
