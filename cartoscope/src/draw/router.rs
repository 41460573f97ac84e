//! Routes draw-tool events into analysis and elevation lookups.

use std::sync::Arc;

use geo_types::LineString;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

use super::events::DrawEvent;
use super::mode::DrawMode;
use super::tracker::{DrawOutcome, DrawTracker};
use crate::analysis::{analyze_selection, SectorAnalysis};
use crate::dataset::{datasets, DatasetFetcher, DatasetLoader};
use crate::elevation::{ElevationSample, ElevationService};

/// Backpressure bound for inbound draw commands. Draw events are
/// human-paced, so this never fills in practice.
const COMMAND_BUFFER: usize = 32;

enum Command {
    Event(DrawEvent),
    Mode(DrawMode),
    /// A finished elevation lookup reporting back with the generation it
    /// was started under.
    ProfileReady {
        generation: u64,
        samples: Vec<ElevationSample>,
    },
}

/// Owns the draw state machine and publishes its derived results.
///
/// Draw events go in through [`submit`](Self::submit); the latest sector
/// analysis and elevation profile come out over `watch` channels, each
/// always describing the current region (`None` when no region of the
/// matching kind is drawn). All routing happens on one worker task, so a
/// superseded result can never overwrite a newer one.
///
/// # Example
///
/// ```ignore
/// use cartoscope::draw::{DrawEvent, DrawRouter};
///
/// let router = DrawRouter::new(loader, elevation_service);
/// let mut analysis = router.analysis();
///
/// router.submit(DrawEvent::Create(polygon_geometry));
/// analysis.changed().await?;
/// if let Some(report) = analysis.borrow().as_ref() {
///     println!("{} acres", report.area_acres);
/// }
/// ```
pub struct DrawRouter {
    commands: mpsc::Sender<Command>,
    analysis_tx: Arc<watch::Sender<Option<SectorAnalysis>>>,
    profile_tx: Arc<watch::Sender<Option<Vec<ElevationSample>>>>,
    worker: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl DrawRouter {
    /// Spawns the routing worker.
    ///
    /// # Arguments
    ///
    /// * `loader` - Reference-dataset loader for zoning and infrastructure
    /// * `elevation` - Service resolving drawn lines to elevation profiles
    pub fn new<F, E>(loader: DatasetLoader<F>, elevation: E) -> Self
    where
        F: DatasetFetcher + 'static,
        E: ElevationService + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (analysis_tx, _) = watch::channel(None);
        let (profile_tx, _) = watch::channel(None);
        let analysis_tx = Arc::new(analysis_tx);
        let profile_tx = Arc::new(profile_tx);
        let cancel = CancellationToken::new();

        let worker = RouterWorker {
            tracker: DrawTracker::new(),
            loader,
            elevation: Arc::new(elevation),
            commands: commands_tx.clone(),
            analysis_tx: Arc::clone(&analysis_tx),
            profile_tx: Arc::clone(&profile_tx),
            generation: 0,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run(commands_rx));

        Self {
            commands: commands_tx,
            analysis_tx,
            profile_tx,
            worker: Some(handle),
            cancel,
        }
    }

    /// Hands a draw-tool event to the worker.
    ///
    /// Non-blocking; an event submitted after shutdown is dropped with a
    /// warning.
    pub fn submit(&self, event: DrawEvent) {
        if let Err(err) = self.commands.try_send(Command::Event(event)) {
            warn!(error = %err, "draw event dropped");
        }
    }

    /// Records a tool mode change. Mode changes trigger no analysis.
    pub fn set_mode(&self, mode: DrawMode) {
        if let Err(err) = self.commands.try_send(Command::Mode(mode)) {
            warn!(error = %err, "draw mode change dropped");
        }
    }

    /// Subscribes to the sector analysis of the current region.
    pub fn analysis(&self) -> watch::Receiver<Option<SectorAnalysis>> {
        self.analysis_tx.subscribe()
    }

    /// Subscribes to the elevation profile of the current region.
    pub fn elevation(&self) -> watch::Receiver<Option<Vec<ElevationSample>>> {
        self.profile_tx.subscribe()
    }

    /// Stops the worker and waits for it to wind down. Safe to call more
    /// than once.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                error!(error = %err, "draw router worker panicked");
            }
        }
    }
}

impl Drop for DrawRouter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct RouterWorker<F: DatasetFetcher, E: ElevationService> {
    tracker: DrawTracker,
    loader: DatasetLoader<F>,
    elevation: Arc<E>,
    commands: mpsc::Sender<Command>,
    analysis_tx: Arc<watch::Sender<Option<SectorAnalysis>>>,
    profile_tx: Arc<watch::Sender<Option<Vec<ElevationSample>>>>,
    /// Bumped per draw event; results report back with the generation they
    /// started under so superseded lookups are discarded.
    generation: u64,
    cancel: CancellationToken,
}

impl<F, E> RouterWorker<F, E>
where
    F: DatasetFetcher + 'static,
    E: ElevationService + 'static,
{
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                command = commands.recv() => match command {
                    Some(Command::Event(event)) => self.route(event).await,
                    Some(Command::Mode(mode)) => self.tracker.set_mode(mode),
                    Some(Command::ProfileReady { generation, samples }) => {
                        self.finish_profile(generation, samples);
                    }
                    None => break,
                },
            }
        }
        trace!("draw router worker stopped");
    }

    async fn route(&mut self, event: DrawEvent) {
        self.generation += 1;
        let generation = self.generation;

        match self.tracker.apply(event) {
            DrawOutcome::Analyze(polygon) => {
                let (zoning, infrastructure) = tokio::join!(
                    self.loader.load(datasets::ZONING),
                    self.loader.load(datasets::INFRASTRUCTURE),
                );
                let report = analyze_selection(Some(&polygon), &zoning, &infrastructure);
                publish(&self.analysis_tx, Some(report));
                publish(&self.profile_tx, None);
            }
            DrawOutcome::Profile(line) => {
                // Clear both channels now; the profile follows when the
                // lookup lands, unless a newer event gets there first.
                publish(&self.analysis_tx, None);
                publish(&self.profile_tx, None);
                self.spawn_profile(line, generation);
            }
            DrawOutcome::Cleared => {
                publish(&self.analysis_tx, None);
                publish(&self.profile_tx, None);
            }
        }
    }

    /// Runs the elevation lookup off the worker so draw events stay
    /// responsive, reporting back through the command channel.
    fn spawn_profile(&self, line: LineString<f64>, generation: u64) {
        let elevation = Arc::clone(&self.elevation);
        let commands = self.commands.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let samples = tokio::select! {
                _ = cancel.cancelled() => return,
                samples = elevation.profile(&line) => samples,
            };
            let _ = commands
                .send(Command::ProfileReady {
                    generation,
                    samples,
                })
                .await;
        });
    }

    fn finish_profile(&self, generation: u64, samples: Vec<ElevationSample>) {
        if generation == self.generation {
            publish(&self.profile_tx, Some(samples));
        } else {
            trace!(generation, "discarding superseded elevation profile");
        }
    }
}

/// Writes a channel value, notifying only when it actually changed.
fn publish<T: PartialEq>(tx: &watch::Sender<Option<T>>, value: Option<T>) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}
