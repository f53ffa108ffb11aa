use crate::load::intensity::Intensity;

use super::provider::MemoryInfoProvider;
use super::snapshot::{UsageSnapshot, ram_percent};

/// Where the CPU figure in a snapshot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CpuMetric {
    /// Derived from the configured CPU intensity, not measured. Cheap and
    /// stable, but it reports what was asked for rather than what happened.
    #[default]
    Synthetic,
    /// Host-wide CPU usage as reported by the provider.
    Measured,
}

impl CpuMetric {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "measured" | "real" => CpuMetric::Measured,
            _ => CpuMetric::Synthetic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuMetric::Synthetic => "synthetic",
            CpuMetric::Measured => "measured",
        }
    }
}

/// `intensity * 0.9 - 20`, clamped to `0..=100`.
pub fn synthetic_cpu_percent(intensity: Intensity) -> f32 {
    (f32::from(intensity.value()) * 0.9 - 20.0).clamp(0.0, 100.0)
}

pub struct Sampler<P> {
    provider: P,
    metric: CpuMetric,
}

impl<P: MemoryInfoProvider> Sampler<P> {
    pub fn new(provider: P, metric: CpuMetric) -> Self {
        Self { provider, metric }
    }

    pub fn metric(&self) -> CpuMetric {
        self.metric
    }

    /// Takes one snapshot. `cpu_intensity` feeds the synthetic CPU metric and
    /// is ignored in measured mode.
    pub fn sample(&mut self, cpu_intensity: Intensity) -> UsageSnapshot {
        let _span = tracing::debug_span!("sampler.tick").entered();

        let memory = self.provider.memory_info();
        let cpu_percent = match self.metric {
            CpuMetric::Synthetic => synthetic_cpu_percent(cpu_intensity),
            CpuMetric::Measured => self
                .provider
                .cpu_percent()
                .unwrap_or_else(|| synthetic_cpu_percent(cpu_intensity)),
        };

        UsageSnapshot {
            cpu_percent,
            ram_percent: ram_percent(memory.total_bytes, memory.available_bytes),
            running_processes: self.provider.process_count(),
            available_memory_bytes: memory.available_bytes,
            total_memory_bytes: memory.total_bytes,
        }
    }
}
