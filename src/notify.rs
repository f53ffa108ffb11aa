use std::time::{Duration, Instant};

use crate::channel::Update;

/// `"Simulating - CPU: 45%, RAM: 63%"`; percentages are truncated.
pub fn summary(update: &Update) -> String {
    let mode = if update.simulating {
        "Simulating"
    } else {
        "Monitoring"
    };
    format!(
        "{mode} - CPU: {}%, RAM: {}%",
        update.snapshot.cpu_percent as u32, update.snapshot.ram_percent as u32
    )
}

/// Rate limiter for the presence summary: at most one per `interval`.
#[derive(Debug)]
pub struct Notifier {
    interval: Duration,
    last: Option<Instant>,
}

impl Notifier {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns the summary to publish, or `None` if the previous one is too
    /// recent.
    pub fn offer(&mut self, update: &Update, now: Instant) -> Option<String> {
        if let Some(last) = self.last
            && now.saturating_duration_since(last) < self.interval
        {
            return None;
        }
        self.last = Some(now);
        Some(summary(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::snapshot::UsageSnapshot;

    fn update(simulating: bool) -> Update {
        Update {
            snapshot: UsageSnapshot {
                cpu_percent: 45.9,
                ram_percent: 63.2,
                ..UsageSnapshot::default()
            },
            loading: false,
            simulating,
        }
    }

    #[test]
    fn summary_text() {
        assert_eq!(summary(&update(true)), "Simulating - CPU: 45%, RAM: 63%");
        assert_eq!(summary(&update(false)), "Monitoring - CPU: 45%, RAM: 63%");
    }

    #[test]
    fn rate_limited_to_interval() {
        let mut notifier = Notifier::new(Duration::from_secs(5));
        let t0 = Instant::now();
        let u = update(true);
        assert!(notifier.offer(&u, t0).is_some());
        assert!(notifier.offer(&u, t0 + Duration::from_secs(1)).is_none());
        assert!(notifier.offer(&u, t0 + Duration::from_millis(4999)).is_none());
        assert!(notifier.offer(&u, t0 + Duration::from_secs(5)).is_some());
        assert!(notifier.offer(&u, t0 + Duration::from_secs(6)).is_none());
    }
}
