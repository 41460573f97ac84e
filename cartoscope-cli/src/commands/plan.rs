//! Plan command - dry-run the mutations of a fresh renderer mount.

use clap::Args;

use cartoscope::catalog::{derive_descriptors, CatalogConfig};
use cartoscope::reconcile::Reconciler;
use cartoscope::renderer::{EngineKind, HeadlessRenderer};

use super::common::{EngineChoice, StateFlags};
use crate::error::CliError;

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Engine to plan against
    #[arg(long, value_enum, default_value = "mapbox")]
    pub engine: EngineChoice,

    /// Base URL reference datasets are served from
    #[arg(long, default_value = "/data")]
    pub data_url: String,

    #[command(flatten)]
    pub state: StateFlags,
}

/// Run the plan command.
pub fn run(args: PlanArgs) -> Result<(), CliError> {
    let snapshot = args.state.snapshot();
    let config = CatalogConfig::new().with_data_base_url(args.data_url.clone());
    let desired = derive_descriptors(&snapshot, None, &config);

    let engine = EngineKind::from(args.engine);
    let reconciler = Reconciler::mount(HeadlessRenderer::new(engine, None));
    let plan = reconciler
        .plan(&desired)
        .map_err(|e| CliError::InvalidDescriptors(e.to_string()))?;

    println!("Mount plan for {} ({} mutations):", engine, plan.len());
    for (index, mutation) in plan.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, mutation);
    }
    Ok(())
}
