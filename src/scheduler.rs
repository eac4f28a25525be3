//! Concurrent batch generation.
//!
//! Job indices `0..image_count` are queued up front and the queue is closed
//! before any worker starts. A fixed pool of scoped threads drains it, each
//! job producing exactly one outcome message:
//!
//! ```text
//!              ┌──► worker 0 ──┐
//! job queue ───┼──► worker 1 ──┼──► outcomes ──► orchestrator ──► Batch
//!  (closed)    └──► worker n ──┘   (Result per job)
//! ```
//!
//! Workers share clones of one closed `crossbeam` receiver. The orchestrator
//! counts outcomes off against the submitted jobs and stops receiving once
//! every job has reported (or every worker has exited after an abort).

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

use crate::asset::{AssetBuilder, AssetFactory, GeneratedAsset};
use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult, JobFailure};
use crate::layer::PieceSource;
use crate::resolver::CollisionResolver;
use crate::rng::entropy_seed;

/// What to do when a job fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first failing job aborts the run.
    FailFast,
    /// Failed jobs are recorded and the rest keep going. Run-fatal errors
    /// still abort.
    #[default]
    Collect,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Batch {
    /// Finished assets, ordered by job index.
    pub assets: Vec<GeneratedAsset>,
    /// Jobs that failed under [`ErrorPolicy::Collect`].
    pub failures: Vec<JobFailure>,
    /// CSV column labels matching the metadata rows.
    pub csv_heading: Vec<String>,
    /// Seed the run's random streams were derived from.
    pub seed: u64,
    /// Generation time in unix seconds.
    pub generated_at: i64,
    /// Regeneration passes the collision resolver needed.
    pub collision_passes: usize,
}

impl Batch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

type Outcome = (usize, GenerateResult<GeneratedAsset>);

// ============================================================================
// Generator
// ============================================================================

/// Runs a batch of asset jobs over a worker pool.
pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    source: &'a dyn PieceSource,
    image_count: usize,
    workers: usize,
    seed: Option<u64>,
    policy: ErrorPolicy,
}

impl<'a> Generator<'a> {
    /// Takes image count, worker count and seed from `config`.
    pub fn new(config: &'a GeneratorConfig, source: &'a dyn PieceSource) -> Self {
        Self {
            config,
            source,
            image_count: config.output.image_count,
            workers: config.worker_count(),
            seed: config.settings.seed,
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_image_count(mut self, image_count: usize) -> Self {
        self.image_count = image_count;
        self
    }

    /// Sets the pool size. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generates the batch, then regenerates duplicates until every image
    /// is unique.
    pub fn run(&self) -> GenerateResult<Batch> {
        let mut batch = self.generate()?;
        let builder = AssetBuilder::new(self.config, self.source, batch.seed, batch.generated_at);
        let resolver = CollisionResolver::new(self.config.collision_passes());
        batch.collision_passes = resolver.resolve(&builder, &mut batch.assets)?;
        Ok(batch)
    }

    /// Generates one asset per job without collision resolution.
    pub fn generate(&self) -> GenerateResult<Batch> {
        let seed = self.seed.unwrap_or_else(entropy_seed);
        let generated_at = chrono::Utc::now().timestamp();
        let builder = AssetBuilder::new(self.config, self.source, seed, generated_at);

        let mut batch = Batch {
            assets: Vec::with_capacity(self.image_count),
            failures: Vec::new(),
            csv_heading: builder.heading().to_vec(),
            seed,
            generated_at,
            collision_passes: 0,
        };
        if self.image_count == 0 {
            return Ok(batch);
        }
        builder.preflight()?;

        let workers = self.workers.clamp(1, self.image_count);
        tracing::info!(workers, jobs = self.image_count, seed, "spinning up workers");

        let (job_tx, job_rx) = channel::bounded::<usize>(self.image_count);
        for job in 0..self.image_count {
            job_tx
                .send(job)
                .map_err(|_| GenerateError::invalid_config("job queue closed while filling"))?;
        }
        drop(job_tx);

        let abort = AtomicBool::new(false);
        let (out_tx, out_rx) = channel::unbounded::<Outcome>();

        let drained = std::thread::scope(|scope| {
            for worker in 0..workers {
                let jobs = job_rx.clone();
                let out_tx = out_tx.clone();
                let (abort, builder) = (&abort, &builder);
                scope.spawn(move || work(worker, jobs, abort, builder, out_tx));
            }
            drop(out_tx);
            drain(&out_rx, self.image_count, self.policy, &abort)
        });
        batch.assets = drained.assets;
        batch.failures = drained.failures;

        if let Some(job) = drained.aborted_by {
            tracing::debug!(skipped = drained.outstanding, "run aborted");
            let mut failures = std::mem::take(&mut batch.failures);
            let position = failures
                .iter()
                .position(|f| f.job == job)
                .ok_or_else(|| GenerateError::invalid_config("aborting job left no failure"))?;
            let source = failures.remove(position).error;
            return Err(GenerateError::Aborted {
                job,
                source: Box::new(source),
                failures,
            });
        }
        if drained.outstanding != 0 {
            return Err(GenerateError::invalid_config(format!(
                "{} job(s) never reported an outcome",
                drained.outstanding
            )));
        }

        batch.assets.sort_by_key(|a| a.job);
        batch.failures.sort_by_key(|f| f.job);
        tracing::info!(
            assets = batch.assets.len(),
            failures = batch.failures.len(),
            "batch generated"
        );
        Ok(batch)
    }
}

/// Outcomes gathered by the orchestrator.
#[derive(Debug, Default)]
struct Drained {
    assets: Vec<GeneratedAsset>,
    failures: Vec<JobFailure>,
    aborted_by: Option<usize>,
    /// Submitted jobs that never reported.
    outstanding: usize,
}

/// Receives outcomes until every submitted job has reported or the channel
/// closes. Raises `abort` on the first error that stops the run.
fn drain(
    outcomes: &Receiver<Outcome>,
    submitted: usize,
    policy: ErrorPolicy,
    abort: &AtomicBool,
) -> Drained {
    let mut drained = Drained {
        outstanding: submitted,
        ..Default::default()
    };
    while drained.outstanding > 0 {
        let Ok((job, outcome)) = outcomes.recv() else {
            break;
        };
        drained.outstanding -= 1;
        match outcome {
            Ok(asset) => drained.assets.push(asset),
            Err(error) => {
                let stop = error.is_run_fatal() || policy == ErrorPolicy::FailFast;
                if stop && drained.aborted_by.is_none() {
                    tracing::error!(job, %error, "job failed; stopping run");
                    abort.store(true, Ordering::SeqCst);
                    drained.aborted_by = Some(job);
                } else {
                    tracing::warn!(job, %error, "job failed");
                }
                drained.failures.push(JobFailure { job, error });
            }
        }
    }
    drained
}

/// Worker loop: pull a job, build it, report the outcome.
fn work(
    worker: usize,
    jobs: Receiver<usize>,
    abort: &AtomicBool,
    factory: &dyn AssetFactory,
    outcomes: Sender<Outcome>,
) {
    let _span = tracing::debug_span!("worker", worker).entered();
    for job in jobs {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        if outcomes.send((job, factory.build(job, 0))).is_err() {
            break;
        }
    }
    tracing::debug!("worker done");
}

// ============================================================================
// Tests
// ============================================================================
