use std::collections::VecDeque;

use super::snapshot::UsageSnapshot;

const DEFAULT_CAPACITY: usize = 60;

/// Most recent snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct UsageHistory {
    entries: VecDeque<UsageSnapshot>,
    capacity: usize,
}

impl UsageHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, snapshot: UsageSnapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&UsageSnapshot> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UsageSnapshot> {
        self.entries.iter()
    }

    pub fn cpu_series(&self) -> Vec<f32> {
        self.entries.iter().map(|s| s.cpu_percent).collect()
    }

    pub fn ram_series(&self) -> Vec<f32> {
        self.entries.iter().map(|s| s.ram_percent).collect()
    }

    /// Mean CPU and RAM percent over the retained window.
    pub fn averages(&self) -> Option<(f32, f32)> {
        if self.entries.is_empty() {
            return None;
        }
        let n = self.entries.len() as f32;
        let cpu: f32 = self.entries.iter().map(|s| s.cpu_percent).sum();
        let ram: f32 = self.entries.iter().map(|s| s.ram_percent).sum();
        Some((cpu / n, ram / n))
    }
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
