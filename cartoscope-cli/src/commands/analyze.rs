//! Analyze command - sector report for a drawn region.

use clap::Args;
use geojson::GeoJson;

use cartoscope::analysis::analyze_selection;
use cartoscope::dataset::{datasets, DatasetLoader, DirFetcher};
use cartoscope::geometry::polygon_from_geojson;

use crate::error::CliError;

/// Arguments for the analyze command.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// GeoJSON file holding the drawn region (a Polygon geometry, or a
    /// Feature wrapping one)
    #[arg(long)]
    pub region: String,

    /// Directory containing the reference datasets (zoning.json,
    /// infrastructure.json)
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the analyze command.
pub async fn run(args: AnalyzeArgs) -> Result<(), CliError> {
    let body = std::fs::read_to_string(&args.region).map_err(|error| CliError::FileRead {
        path: args.region.clone(),
        error,
    })?;
    let geometry = extract_geometry(&body)?;
    let region = polygon_from_geojson(&geometry)
        .ok_or_else(|| CliError::InvalidRegion("geometry is not a Polygon".to_string()))?;

    let loader = DatasetLoader::new(DirFetcher::new(&args.data_dir));
    let (zoning, infrastructure) = tokio::join!(
        loader.load(datasets::ZONING),
        loader.load(datasets::INFRASTRUCTURE),
    );

    let report = analyze_selection(Some(&region), &zoning, &infrastructure);

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::Json(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    println!("Sector analysis for {}:", args.region);
    println!(
        "  Area: {} acres ({} hectares)",
        report.area_acres, report.area_hectares
    );
    if report.intersected_zones.is_empty() {
        println!("  Zoning: no districts intersected");
    } else {
        println!("  Zoning: {}", report.intersected_zones.join(", "));
    }
    println!("  Amenities: {}", report.amenity_count);
    for name in &report.amenities {
        println!("    - {}", name);
    }
    Ok(())
}

/// Pulls the first usable geometry out of a GeoJSON document.
fn extract_geometry(body: &str) -> Result<geojson::Geometry, CliError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e: geojson::Error| CliError::InvalidRegion(e.to_string()))?;
    match geojson {
        GeoJson::Geometry(geometry) => Ok(geometry),
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| CliError::InvalidRegion("feature has no geometry".to_string())),
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|feature| feature.geometry)
            .ok_or_else(|| {
                CliError::InvalidRegion("collection has no feature with geometry".to_string())
            }),
    }
}
