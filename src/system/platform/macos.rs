use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn memory_limit() -> Option<u64> {
        // No per-process memory ceiling to honour
        None
    }

    fn process_count() -> Option<usize> {
        None
    }
}
