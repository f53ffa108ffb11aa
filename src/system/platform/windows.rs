use super::PlatformExtensions;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn memory_limit() -> Option<u64> {
        // Job object limits are not consulted
        None
    }

    fn process_count() -> Option<usize> {
        None
    }
}
