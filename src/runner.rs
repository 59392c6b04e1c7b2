//! Bounded-parallel batch execution.
//!
//! Tasks run on a dedicated rayon pool. Each worker converts one file and
//! sends a [`TaskReport`] over a bounded channel; the calling thread is the
//! only reader of that channel and the only owner of the [`RunTally`] and the
//! [`ProgressSink`], so workers never touch shared counters or the console.

use crate::error::{ConvertError, Result};
use crate::pipeline::{self, ConversionOutcome, ImageTask};
use rayon::prelude::*;
use std::panic;
use std::sync::{mpsc, Once};
use std::thread;

const WORKER_THREAD_PREFIX: &str = "img-fit-worker-";

fn is_worker_thread(name: Option<&str>) -> bool {
    name.is_some_and(|name| name.starts_with(WORKER_THREAD_PREFIX))
}

/// Keeps the default panic report off the console for worker threads. The
/// pipeline catches those panics and reports them as failed tasks; panics on
/// any other thread still reach the previous hook.
fn silence_worker_panics() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !is_worker_thread(thread::current().name()) {
                previous(info);
            }
        }));
    });
}

/// Counts for one run. `processed == succeeded + failed` once the run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subset of `succeeded` copied without re-encoding.
    pub copied: usize,
    /// Subset of `succeeded` that missed the byte budget.
    pub warnings: usize,
}

impl RunTally {
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        self.processed += 1;
        match outcome {
            ConversionOutcome::Failed(_) => self.failed += 1,
            ConversionOutcome::Copied => {
                self.succeeded += 1;
                self.copied += 1;
            }
            ConversionOutcome::ConvertedWithWarning { .. } => {
                self.succeeded += 1;
                self.warnings += 1;
            }
            ConversionOutcome::Converted { .. } => self.succeeded += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.processed == self.succeeded + self.failed
    }
}

/// Completion event for one task.
#[derive(Debug)]
pub struct TaskReport {
    pub display_name: String,
    pub outcome: ConversionOutcome,
}

/// Receives progress from [`BatchRunner`]. All calls happen on the thread
/// that called `run`, one at a time.
pub trait ProgressSink {
    fn on_start(&mut self, _total: usize) {}

    fn on_complete(&mut self, report: &TaskReport, tally: &RunTally);

    fn on_finish(&mut self, _tally: &RunTally) {}
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    workers: usize,
}

impl BatchRunner {
    /// `workers` of `None` uses one worker per logical CPU.
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.filter(|&n| n > 0).unwrap_or_else(num_cpus::get);
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, tasks: &[ImageTask], sink: &mut dyn ProgressSink) -> Result<RunTally> {
        self.run_with(tasks, sink, pipeline::convert)
    }

    /// Runs `convert` over every task and tallies the outcomes.
    pub fn run_with<F>(
        &self,
        tasks: &[ImageTask],
        sink: &mut dyn ProgressSink,
        convert: F,
    ) -> Result<RunTally>
    where
        F: Fn(&ImageTask) -> ConversionOutcome + Sync,
    {
        let mut tally = RunTally::default();
        sink.on_start(tasks.len());
        if tasks.is_empty() {
            sink.on_finish(&tally);
            return Ok(tally);
        }

        let workers = self.workers.min(tasks.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("{}{}", WORKER_THREAD_PREFIX, i))
            .build()
            .map_err(|e| ConvertError::Unexpected(format!("failed to start worker pool: {}", e)))?;
        tracing::debug!(workers, tasks = tasks.len(), "starting batch");
        silence_worker_panics();

        let (tx, rx) = mpsc::sync_channel::<TaskReport>(workers);
        let convert = &convert;

        thread::scope(|scope| {
            scope.spawn(move || {
                pool.install(|| {
                    tasks.par_iter().for_each_with(tx, |tx, task| {
                        let report = TaskReport {
                            display_name: task.display_name(),
                            outcome: convert(task),
                        };
                        // The receiver outlives every sender.
                        let _ = tx.send(report);
                    });
                });
            });

            for report in rx {
                tally.record(&report.outcome);
                sink.on_complete(&report, &tally);
            }
        });

        sink.on_finish(&tally);

        if tally.processed != tasks.len() || !tally.is_consistent() {
            return Err(ConvertError::Unexpected(format!(
                "tally mismatch: {} of {} tasks reported",
                tally.processed,
                tasks.len()
            )));
        }
        Ok(tally)
    }
}
