//! Tick scheduler: fans model updates out over a fixed worker pool
//!
//! Per tick, running models are split by their thread-safety flag. The
//! thread-safe set goes to the pool in no particular order; the rest run one
//! at a time, in registration order, on the thread that called `step`. The
//! tick ends at a barrier once both lanes have drained.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::error::Result;
use crate::core::types::Tick;
use crate::scene::Scene;
use crate::simulation::slot::ModelSlot;
use crate::simulation::tick::{TickReport, UpdateFailure};

pub struct Scheduler {
    pool: ThreadPool,
    workers: usize,
}

impl Scheduler {
    /// Build the pool; its size is fixed for the scheduler's lifetime
    pub fn new(workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("stage-worker-{i}"))
            .build()?;
        tracing::debug!(workers, "scheduler pool ready");
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run one tick's updates and wait for all of them
    pub(crate) fn run(
        &self,
        scene: &Scene,
        tick: Tick,
        slots: &mut [Option<ModelSlot>],
    ) -> TickReport {
        let (parallel, serial): (Vec<&mut ModelSlot>, Vec<&mut ModelSlot>) = slots
            .iter_mut()
            .flatten()
            .filter(|slot| slot.running)
            .partition(|slot| slot.thread_safe);

        let mut report = TickReport {
            tick,
            parallel: parallel.len(),
            serial: serial.len(),
            failures: Vec::new(),
        };

        let mut parallel_failures: Vec<UpdateFailure> = Vec::new();
        let mut serial_failures: Vec<UpdateFailure> = Vec::new();

        // The scope does not return until every spawned update has: this is
        // the end-of-tick barrier.
        self.pool.in_place_scope(|scope| {
            scope.spawn(|_| {
                parallel_failures = parallel
                    .into_par_iter()
                    .filter_map(|slot| slot.run_update(scene, tick))
                    .collect();
            });

            for slot in serial {
                if let Some(failure) = slot.run_update(scene, tick) {
                    serial_failures.push(failure);
                }
            }
        });

        report.failures = merge_failures(parallel_failures, serial_failures);
        report
    }

    /// Run every update on the calling thread in registration order
    pub(crate) fn run_serial(scene: &Scene, tick: Tick, slots: &mut [Option<ModelSlot>]) -> TickReport {
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        for slot in slots.iter_mut().flatten().filter(|slot| slot.running) {
            report.serial += 1;
            if let Some(failure) = slot.run_update(scene, tick) {
                report.failures.push(failure);
            }
        }
        report
    }
}

fn merge_failures(mut a: Vec<UpdateFailure>, b: Vec<UpdateFailure>) -> Vec<UpdateFailure> {
    a.extend(b);
    a.sort_by_key(|f| f.model);
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_is_fixed() {
        let scheduler = Scheduler::new(3).unwrap();
        assert_eq!(scheduler.workers(), 3);
    }

    #[test]
    fn test_empty_world_tick() {
        let scheduler = Scheduler::new(2).unwrap();
        let scene = Scene::new(1.0);
        let mut slots: Vec<Option<ModelSlot>> = Vec::new();
        let report = scheduler.run(&scene, 1, &mut slots);
        assert_eq!(report.updated(), 0);
        assert!(report.is_clean());
    }
}
