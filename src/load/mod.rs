pub mod cpu;
pub mod intensity;
pub mod memory;

use std::time::Duration;

use tracing::info;

use crate::config::LoadConfig;
use cpu::CpuLoad;
use intensity::{Intensity, IntensitySettings};
use memory::{MemoryBudget, MemoryLoad};

const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Running,
}

impl LoadState {
    pub fn label(self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Running => "running",
        }
    }
}

/// Tuning knobs for [`LoadGenerator`], resolved from [`LoadConfig`].
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub duty_period: Duration,
    pub block_size: usize,
    pub allocation_pause: Duration,
    pub parallelism: usize,
    pub caps: IntensitySettings,
}

impl GeneratorOptions {
    pub fn from_config(config: &LoadConfig) -> Self {
        let parallelism = if config.threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            config.threads
        };
        Self {
            duty_period: Duration::from_millis(config.duty_period_ms.max(1)),
            block_size: (config.block_size_mb.max(1) as usize).saturating_mul(MB),
            allocation_pause: Duration::from_millis(config.allocation_pause_ms),
            parallelism,
            caps: IntensitySettings::new(config.max_cpu_intensity, config.max_ram_intensity),
        }
    }
}

/// Drives CPU and memory load toward targets proportional to the configured
/// intensities.
///
/// `Idle -> Running -> Idle` through [`start`](Self::start) and
/// [`stop`](Self::stop). Changing an intensity while running tears down the
/// matching load and rebuilds it at the new level.
pub struct LoadGenerator {
    state: LoadState,
    settings: IntensitySettings,
    caps: IntensitySettings,
    cpu: CpuLoad,
    memory: MemoryLoad,
}

impl LoadGenerator {
    pub fn new(options: GeneratorOptions, budget: MemoryBudget, settings: IntensitySettings) -> Self {
        let caps = options.caps;
        Self {
            state: LoadState::Idle,
            settings: IntensitySettings {
                cpu: settings.cpu.capped(caps.cpu),
                ram: settings.ram.capped(caps.ram),
            },
            caps,
            cpu: CpuLoad::new(options.duty_period, options.parallelism),
            memory: MemoryLoad::new(budget, options.block_size, options.allocation_pause),
        }
    }

    pub fn start(&mut self) {
        if self.state == LoadState::Running {
            return;
        }
        self.state = LoadState::Running;
        let _span = tracing::debug_span!("load.restart", reason = "start").entered();
        self.cpu.apply(self.settings.cpu);
        self.memory.apply(self.settings.ram);
        info!(
            cpu = %self.settings.cpu,
            ram = %self.settings.ram,
            workers = self.cpu.active_workers(),
            target_mb = self.memory.budget().target(self.settings.ram) / MB as u64,
            "load started"
        );
    }

    pub fn stop(&mut self) {
        if self.state == LoadState::Idle {
            return;
        }
        self.cpu.stop();
        self.memory.stop();
        self.state = LoadState::Idle;
        info!("load stopped");
    }

    /// Returns the intensity actually applied after clamping and capping.
    pub fn set_cpu_intensity(&mut self, value: i64) -> Intensity {
        let intensity = Intensity::new(value).capped(self.caps.cpu);
        if intensity != self.settings.cpu {
            self.settings.cpu = intensity;
            if self.state == LoadState::Running {
                let _span = tracing::debug_span!("load.restart", reason = "cpu").entered();
                self.cpu.apply(intensity);
                info!(cpu = %intensity, workers = self.cpu.active_workers(), "cpu load adjusted");
            }
        }
        intensity
    }

    pub fn set_ram_intensity(&mut self, value: i64) -> Intensity {
        let intensity = Intensity::new(value).capped(self.caps.ram);
        if intensity != self.settings.ram {
            self.settings.ram = intensity;
            if self.state == LoadState::Running {
                let _span = tracing::debug_span!("load.restart", reason = "ram").entered();
                self.memory.apply(intensity);
                info!(ram = %intensity, "memory load adjusted");
            }
        }
        intensity
    }

    pub fn set_intensity(&mut self, settings: IntensitySettings) -> IntensitySettings {
        IntensitySettings {
            cpu: self.set_cpu_intensity(i64::from(settings.cpu.value())),
            ram: self.set_ram_intensity(i64::from(settings.ram.value())),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoadState::Running
    }

    pub fn settings(&self) -> IntensitySettings {
        self.settings
    }

    pub fn parallelism(&self) -> usize {
        self.cpu.parallelism()
    }

    pub fn active_workers(&self) -> usize {
        self.cpu.active_workers()
    }

    pub fn live_workers(&self) -> usize {
        self.cpu.live_workers()
    }

    pub fn tracked_allocations(&self) -> usize {
        self.memory.tracked_allocations()
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.memory.allocated_bytes()
    }

    pub fn memory_budget(&self) -> MemoryBudget {
        self.memory.budget()
    }

    pub fn memory_target(&self) -> u64 {
        self.memory.budget().target(self.settings.ram)
    }

    /// True while memory is still being built up toward its target.
    pub fn is_loading(&self) -> bool {
        self.memory.is_filling()
    }
}

impl Drop for LoadGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}
