use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::intensity::Intensity;

const MB: u64 = 1024 * 1024;

/// Ceiling for memory load, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBudget {
    bytes: u64,
}

impl MemoryBudget {
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    /// `fraction` of `allowed_bytes`, with `fraction` clamped to `0.0..=1.0`.
    pub fn from_allowed(allowed_bytes: u64, fraction: f64) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            bytes: (allowed_bytes as f64 * fraction) as u64,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn target(&self, intensity: Intensity) -> u64 {
        (u128::from(self.bytes) * u128::from(intensity.value()) / 100) as u64
    }
}

/// Block-wise memory load.
///
/// One filler thread owns the blocks while it runs and hands them back
/// through its join handle, so the block list only ever has one writer.
pub struct MemoryLoad {
    budget: MemoryBudget,
    block_size: usize,
    pause: Duration,
    allocated: Arc<AtomicU64>,
    blocks: Arc<AtomicUsize>,
    filling: Arc<AtomicBool>,
    fill: Option<Fill>,
}

struct Fill {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Vec<Vec<u8>>>,
}

impl MemoryLoad {
    pub fn new(budget: MemoryBudget, block_size: usize, pause: Duration) -> Self {
        Self {
            budget,
            block_size: block_size.max(1),
            pause,
            allocated: Arc::new(AtomicU64::new(0)),
            blocks: Arc::new(AtomicUsize::new(0)),
            filling: Arc::new(AtomicBool::new(false)),
            fill: None,
        }
    }

    pub fn budget(&self) -> MemoryBudget {
        self.budget
    }

    /// Releases whatever is held and starts filling toward the target for
    /// `intensity`.
    pub fn apply(&mut self, intensity: Intensity) {
        self.stop();

        let target = self.budget.target(intensity);
        if target == 0 {
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let filler = Filler {
            target,
            block_size: self.block_size,
            pause: self.pause,
            cancel: Arc::clone(&cancel),
            allocated: Arc::clone(&self.allocated),
            blocks: Arc::clone(&self.blocks),
            filling: Arc::clone(&self.filling),
        };
        self.filling.store(true, Ordering::Release);
        match thread::Builder::new()
            .name("envload-mem".to_string())
            .spawn(move || filler.run())
        {
            Ok(handle) => {
                debug!(target_bytes = target, %intensity, "memory fill started");
                self.fill = Some(Fill { cancel, handle });
            }
            Err(err) => {
                self.filling.store(false, Ordering::Release);
                warn!(error = %err, "failed to spawn memory filler");
            }
        }
    }

    /// Cancels an in-progress fill and frees every block.
    pub fn stop(&mut self) {
        let Some(fill) = self.fill.take() else {
            return;
        };
        fill.cancel.store(true, Ordering::Release);
        let blocks = match fill.handle.join() {
            Ok(blocks) => blocks,
            Err(_) => {
                warn!("memory filler panicked");
                Vec::new()
            }
        };
        let freed = self.allocated.swap(0, Ordering::AcqRel);
        self.blocks.store(0, Ordering::Release);
        self.filling.store(false, Ordering::Release);
        drop(blocks);
        debug!(freed_bytes = freed, "memory released");
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.allocated.load(Ordering::Acquire)
    }

    pub fn tracked_allocations(&self) -> usize {
        self.blocks.load(Ordering::Acquire)
    }

    /// True while the filler is still working toward its target.
    pub fn is_filling(&self) -> bool {
        self.filling.load(Ordering::Acquire)
    }
}

impl Drop for MemoryLoad {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Filler {
    target: u64,
    block_size: usize,
    pause: Duration,
    cancel: Arc<AtomicBool>,
    allocated: Arc<AtomicU64>,
    blocks: Arc<AtomicUsize>,
    filling: Arc<AtomicBool>,
}

impl Filler {
    fn run(self) -> Vec<Vec<u8>> {
        let mut held: Vec<Vec<u8>> = Vec::new();
        let mut total = 0u64;

        while total < self.target && !self.cancel.load(Ordering::Acquire) {
            let len = (self.target - total).min(self.block_size as u64) as usize;
            let mut block = Vec::new();
            if let Err(err) = block.try_reserve_exact(len) {
                warn!(
                    allocated_mb = total / MB,
                    requested = len,
                    error = %err,
                    "allocation failed, keeping partial load"
                );
                break;
            }
            // Writing every byte makes the OS commit the pages.
            block.resize(len, fill_byte(held.len()));
            held.push(block);
            total += len as u64;

            self.allocated.store(total, Ordering::Release);
            self.blocks.store(held.len(), Ordering::Release);
            debug!(allocated_mb = total / MB, blocks = held.len(), "block allocated");

            if !self.pause.is_zero() {
                thread::sleep(self.pause);
            }
        }

        if total >= self.target {
            info!(allocated_mb = total / MB, blocks = held.len(), "memory target reached");
        }
        self.filling.store(false, Ordering::Release);
        held
    }
}

fn fill_byte(index: usize) -> u8 {
    (index as u8).wrapping_mul(31) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_target_scales_with_intensity() {
        let budget = MemoryBudget::from_bytes(1000);
        assert_eq!(budget.target(Intensity::new(50)), 500);
        assert_eq!(budget.target(Intensity::MAX), 1000);
        assert_eq!(budget.target(Intensity::ZERO), 0);
    }

    #[test]
    fn budget_fraction_is_clamped() {
        assert_eq!(MemoryBudget::from_allowed(1000, 0.8).bytes(), 800);
        assert_eq!(MemoryBudget::from_allowed(1000, 3.0).bytes(), 1000);
        assert_eq!(MemoryBudget::from_allowed(1000, f64::NAN).bytes(), 0);
    }

    #[test]
    fn fill_byte_is_never_zero() {
        assert!((0..1024).all(|i| fill_byte(i) != 0));
    }
}
