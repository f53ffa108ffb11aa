pub trait PlatformExtensions {
    /// Memory ceiling imposed on this process (cgroup, job object), if any.
    fn memory_limit() -> Option<u64>;
    /// Number of processes on the host, when the platform can count them
    /// cheaply without a full process scan.
    fn process_count() -> Option<usize>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod fallback;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
use fallback as platform_impl;

pub fn memory_limit() -> Option<u64> {
    platform_impl::Platform::memory_limit()
}

pub fn process_count() -> Option<usize> {
    platform_impl::Platform::process_count()
}
