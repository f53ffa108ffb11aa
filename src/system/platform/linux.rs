use super::PlatformExtensions;

pub struct Platform;

// cgroup v1 reports "unlimited" as a page-aligned value near i64::MAX.
const V1_UNLIMITED_FLOOR: u64 = 1 << 60;

impl PlatformExtensions for Platform {
    fn memory_limit() -> Option<u64> {
        // cgroup v2: "max" or a byte count
        if let Ok(contents) = std::fs::read_to_string("/sys/fs/cgroup/memory.max") {
            return parse_limit(&contents);
        }
        // cgroup v1
        let contents =
            std::fs::read_to_string("/sys/fs/cgroup/memory/memory.limit_in_bytes").ok()?;
        parse_limit(&contents)
    }

    fn process_count() -> Option<usize> {
        // Every process has a numeric directory under /proc
        let entries = std::fs::read_dir("/proc").ok()?;
        let count = entries
            .flatten()
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            })
            .count();
        (count > 0).then_some(count)
    }
}

fn parse_limit(raw: &str) -> Option<u64> {
    let value = raw.trim();
    if value == "max" {
        return None;
    }
    let bytes: u64 = value.parse().ok()?;
    if bytes == 0 || bytes >= V1_UNLIMITED_FLOOR {
        None
    } else {
        Some(bytes)
    }
}
