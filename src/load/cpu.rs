use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::intensity::{Intensity, worker_count};

/// Duty-cycle CPU load.
///
/// Each worker is an OS thread that spins for `intensity * period` and
/// sleeps for the rest of the period. Workers re-read the shared intensity at
/// the top of every cycle and check their generation's cancel flag there too,
/// so a change lands within one period.
pub struct CpuLoad {
    period: Duration,
    parallelism: usize,
    intensity: Arc<AtomicU8>,
    live: Arc<AtomicUsize>,
    generation: Option<Generation>,
}

struct Generation {
    cancel: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl CpuLoad {
    pub fn new(period: Duration, parallelism: usize) -> Self {
        Self {
            period,
            parallelism: parallelism.max(1),
            intensity: Arc::new(AtomicU8::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            generation: None,
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Cancels the current workers and spawns a fresh set sized for
    /// `intensity`.
    pub fn apply(&mut self, intensity: Intensity) {
        self.stop();
        self.intensity.store(intensity.value(), Ordering::Release);

        let count = worker_count(intensity, self.parallelism);
        if count == 0 {
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            let intensity = Arc::clone(&self.intensity);
            let cancel = Arc::clone(&cancel);
            let live = Arc::clone(&self.live);
            let period = self.period;
            let spawned = thread::Builder::new()
                .name(format!("envload-cpu-{index}"))
                .spawn(move || run_worker(&intensity, &cancel, &live, period));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => warn!(index, error = %err, "failed to spawn cpu worker"),
            }
        }
        debug!(workers = handles.len(), %intensity, "cpu workers started");
        self.generation = Some(Generation { cancel, handles });
    }

    /// Signals every worker and waits for them to leave their current cycle.
    pub fn stop(&mut self) {
        let Some(generation) = self.generation.take() else {
            return;
        };
        generation.cancel.store(true, Ordering::Release);
        let count = generation.handles.len();
        for handle in generation.handles {
            if handle.join().is_err() {
                warn!("cpu worker panicked");
            }
        }
        debug!(workers = count, "cpu workers stopped");
    }

    /// Workers spawned by the current generation.
    pub fn active_workers(&self) -> usize {
        self.generation.as_ref().map_or(0, |g| g.handles.len())
    }

    /// Worker threads currently inside their loop.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for CpuLoad {
    fn drop(&mut self) {
        self.stop();
    }
}

struct LiveGuard<'a>(&'a AtomicUsize);

impl<'a> LiveGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        LiveGuard(counter)
    }
}

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn run_worker(intensity: &AtomicU8, cancel: &AtomicBool, live: &AtomicUsize, period: Duration) {
    let _live = LiveGuard::enter(live);
    let mut acc = 0u64;
    while !cancel.load(Ordering::Acquire) {
        let fraction = f64::from(intensity.load(Ordering::Acquire)) / 100.0;
        let busy = period.mul_f64(fraction);
        let started = Instant::now();
        while started.elapsed() < busy {
            acc = acc.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            std::hint::spin_loop();
        }
        std::hint::black_box(acc);

        let idle = period.saturating_sub(started.elapsed());
        if !idle.is_zero() {
            thread::sleep(idle);
        }
    }
}
