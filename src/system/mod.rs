pub mod history;
pub mod platform;
pub mod provider;
pub mod sampler;
pub mod snapshot;

use provider::MemoryInfo;

/// Memory the load generator may plan against: total memory, lowered to the
/// platform's per-process ceiling when one is set.
pub fn allowed_memory(info: MemoryInfo) -> u64 {
    match platform::memory_limit() {
        Some(limit) => info.total_bytes.min(limit),
        None => info.total_bytes,
    }
}
