use sysinfo::{CpuRefreshKind, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use super::platform;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Read-only source of host memory and process information.
pub trait MemoryInfoProvider: Send {
    fn memory_info(&mut self) -> MemoryInfo;

    fn process_count(&mut self) -> usize;

    /// Host-wide CPU usage since the previous call, when the provider can
    /// measure it.
    fn cpu_percent(&mut self) -> Option<f32> {
        None
    }
}

/// [`MemoryInfoProvider`] backed by `sysinfo`.
pub struct SysinfoProvider {
    sys: System,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_memory(MemoryRefreshKind::nothing().with_ram())
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        SysinfoProvider { sys }
    }
}

impl MemoryInfoProvider for SysinfoProvider {
    fn memory_info(&mut self) -> MemoryInfo {
        self.sys
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        MemoryInfo {
            total_bytes: self.sys.total_memory(),
            available_bytes: self.sys.available_memory(),
        }
    }

    fn process_count(&mut self) -> usize {
        if let Some(count) = platform::process_count() {
            return count;
        }
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        self.sys.processes().len()
    }

    fn cpu_percent(&mut self) -> Option<f32> {
        self.sys.refresh_cpu_usage();
        Some(self.sys.global_cpu_usage().clamp(0.0, 100.0))
    }
}
