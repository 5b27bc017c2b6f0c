use crate::archive::CrashArchive;
use crate::config::{CampaignSettings, TargetSettings};
use crate::corpus::CorpusStore;
use crate::mutator::{Mutator, RandomByteMutator};
use crate::runner::{ExecutionResult, SIGSEGV, TargetRunner};
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Campaign-wide counters shared by all workers.
///
/// The case counter is atomic so concurrent increments are never lost;
/// readers only need an eventually-consistent view.
#[derive(Debug)]
pub struct CampaignStats {
    cases: AtomicU64,
    start: Instant,
}

impl CampaignStats {
    fn new() -> Self {
        Self {
            cases: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    pub fn record_case(&self) {
        self.cases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_cases(&self) -> u64 {
        self.cases.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn cases_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total_cases() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Everything one worker thread needs, cloned per worker before spawn.
struct WorkerContext {
    id: usize,
    corpus: Arc<CorpusStore<Vec<u8>>>,
    archive: Arc<CrashArchive>,
    target_command: Vec<String>,
    stats: Arc<CampaignStats>,
    stop: Arc<AtomicBool>,
    max_iterations: Option<u64>,
    rng_seed: u64,
    report_interval: Duration,
}

/// Orchestrates a fixed pool of fuzzing workers over a shared corpus and
/// crash archive.
///
/// Each worker loops sample -> mutate -> run -> classify -> archive-on-fault
/// independently; the only shared mutable state is the atomic case counter
/// and the archive directory. Workers run until the stop flag is raised,
/// their iteration bound is reached, or the process is killed.
pub struct FuzzCampaign {
    corpus: Arc<CorpusStore<Vec<u8>>>,
    archive: Arc<CrashArchive>,
    target_command: Vec<String>,
    workers: usize,
    max_iterations: Option<u64>,
    report_interval: Duration,
    rng_seed: u64,
    stats: Arc<CampaignStats>,
    stop: Arc<AtomicBool>,
}

impl FuzzCampaign {
    pub fn new(
        corpus: Arc<CorpusStore<Vec<u8>>>,
        archive: Arc<CrashArchive>,
        target: TargetSettings,
        settings: CampaignSettings,
    ) -> Self {
        Self {
            corpus,
            archive,
            target_command: target.command,
            workers: settings.workers,
            max_iterations: settings.max_iterations,
            report_interval: Duration::from_millis(settings.report_interval_ms),
            rng_seed: settings.rng_seed.unwrap_or_else(rand::random),
            stats: Arc::new(CampaignStats::new()),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared counters; readable while the campaign runs.
    pub fn stats(&self) -> Arc<CampaignStats> {
        Arc::clone(&self.stats)
    }

    /// Raising this flag winds down every worker at its next iteration.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs the campaign to completion: preflights the target, spawns the
    /// worker pool, joins every worker, and propagates the first fatal
    /// worker error.
    pub fn run(&self) -> Result<(), anyhow::Error> {
        self.preflight()?;

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let context = WorkerContext {
                id,
                corpus: Arc::clone(&self.corpus),
                archive: Arc::clone(&self.archive),
                target_command: self.target_command.clone(),
                stats: Arc::clone(&self.stats),
                stop: Arc::clone(&self.stop),
                max_iterations: self.max_iterations,
                // Distinct stream per worker so mutations stay uncorrelated.
                rng_seed: self.rng_seed.wrapping_add(id as u64),
                report_interval: self.report_interval,
            };
            let handle = std::thread::Builder::new()
                .name(format!("fuzz-worker-{id}"))
                .spawn(move || worker_loop(context))?;
            handles.push(handle);
        }

        let mut first_error: Option<anyhow::Error> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(_) => {
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("fuzz worker panicked"));
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Executes the target once on an unmutated seed before any worker
    /// starts. A target that cannot be spawned at all (missing executable,
    /// bad permissions) is fatal here rather than once per worker.
    fn preflight(&self) -> Result<(), anyhow::Error> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.rng_seed);
        let mut runner = TargetRunner::new(self.target_command.clone())?;
        let seed = self.corpus.sample(&mut rng);
        runner
            .run(seed)
            .map_err(|e| anyhow::anyhow!("target preflight failed: {e}"))?;
        Ok(())
    }
}

fn worker_loop(context: WorkerContext) -> Result<(), anyhow::Error> {
    let result = fuzz_worker(&context);
    if result.is_err() {
        // A worker that cannot start is not replaced; wind down the pool so
        // run() can report the failure instead of fuzzing short-handed.
        context.stop.store(true, Ordering::Relaxed);
    }
    result
}

fn fuzz_worker(context: &WorkerContext) -> Result<(), anyhow::Error> {
    let mut rng = ChaCha8Rng::seed_from_u64(context.rng_seed);
    let mutator = RandomByteMutator;
    let mut runner = TargetRunner::new(context.target_command.clone())
        .map_err(|e| anyhow::anyhow!("worker {}: {e}", context.id))?;

    let mut iterations: u64 = 0;
    let mut last_report = Instant::now();

    while !context.stop.load(Ordering::Relaxed) {
        if let Some(max) = context.max_iterations {
            if iterations >= max {
                break;
            }
        }

        let seed = context.corpus.sample(&mut rng);
        let candidate = mutator.mutate(seed, &mut rng);

        match runner.run(&candidate) {
            Ok(ExecutionResult::Success) => {}
            Ok(ExecutionResult::NonZeroExit(code)) => {
                println!("worker {}: target exited with {code}", context.id);
            }
            Ok(ExecutionResult::Signaled(SIGSEGV)) => {
                println!("worker {}: target segfaulted, archiving input", context.id);
                if let Err(e) = context.archive.record(&candidate) {
                    // Recoverable: the crash is lost but the campaign is not.
                    eprintln!("worker {}: failed to archive crash: {e}", context.id);
                }
            }
            Ok(ExecutionResult::Signaled(signal)) => {
                println!(
                    "worker {}: target killed by signal {signal}, not archived",
                    context.id
                );
            }
            Err(e) => {
                // Transient spawn or scratch-file failure. The candidate is
                // dropped; no input is ever re-run.
                eprintln!("worker {}: execution failed, skipping case: {e}", context.id);
            }
        }

        context.stats.record_case();
        iterations += 1;

        // One designated reporter keeps progress lines from interleaving.
        if context.id == 0 && last_report.elapsed() >= context.report_interval {
            println!(
                "[{:10.4}] cases {:10} | {:10.4} fcps",
                context.stats.elapsed().as_secs_f64(),
                context.stats.total_cases(),
                context.stats.cases_per_second(),
            );
            last_report = Instant::now();
        }
    }
    Ok(())
}
