use serde::Serialize;

/// One sampling tick's view of the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    pub running_processes: usize,
    pub available_memory_bytes: u64,
    pub total_memory_bytes: u64,
}

impl UsageSnapshot {
    pub fn used_memory_bytes(&self) -> u64 {
        self.total_memory_bytes
            .saturating_sub(self.available_memory_bytes)
    }
}

/// `(total - available) / total * 100`, clamped to `0..=100`.
pub fn ram_percent(total_bytes: u64, available_bytes: u64) -> f32 {
    if total_bytes == 0 {
        return 0.0;
    }
    let used = total_bytes.saturating_sub(available_bytes);
    ((used as f64 / total_bytes as f64) * 100.0).clamp(0.0, 100.0) as f32
}
