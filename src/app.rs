use std::fmt::Write;
use std::time::{Duration, Instant};

use tracing::info;

use crate::channel::{Listener, Update, UpdateChannel};
use crate::command::{Command, HELP};
use crate::config::Config;
use crate::format::format_bytes;
use crate::load::intensity::{Intensity, IntensitySettings};
use crate::load::memory::MemoryBudget;
use crate::load::{GeneratorOptions, LoadGenerator};
use crate::notify::Notifier;
use crate::system::allowed_memory;
use crate::system::history::UsageHistory;
use crate::system::provider::{MemoryInfoProvider, SysinfoProvider};
use crate::system::sampler::{CpuMetric, Sampler};

/// Owns the load generator and everything that observes it, and turns user
/// commands into generator calls.
pub struct App<P: MemoryInfoProvider = SysinfoProvider> {
    pub running: bool,
    generator: LoadGenerator,
    sampler: Sampler<P>,
    channel: UpdateChannel,
    history: UsageHistory,
    notifier: Notifier,
}

impl<P: MemoryInfoProvider> App<P> {
    /// Sizes the memory budget from what `provider` reports right now.
    pub fn new(config: &Config, mut provider: P) -> Self {
        let info = provider.memory_info();
        let budget = MemoryBudget::from_allowed(allowed_memory(info), config.load.budget_fraction);
        Self::with_budget(config, provider, budget)
    }

    pub fn with_budget(config: &Config, provider: P, budget: MemoryBudget) -> Self {
        let options = GeneratorOptions::from_config(&config.load);
        let settings = IntensitySettings::new(config.load.cpu_intensity, config.load.ram_intensity);
        let metric = CpuMetric::from_str_config(&config.general.cpu_metric);
        info!(
            budget = %format_bytes(budget.bytes()),
            parallelism = options.parallelism,
            cpu_metric = metric.label(),
            "load generator ready"
        );

        App {
            running: true,
            generator: LoadGenerator::new(options, budget, settings),
            sampler: Sampler::new(provider, metric),
            channel: UpdateChannel::new(),
            history: UsageHistory::new(config.general.history_length),
            notifier: Notifier::new(Duration::from_millis(config.general.notify_interval_ms)),
        }
    }

    /// Registers the update listener, replacing any previous one.
    pub fn listen(&mut self) -> Listener {
        self.channel.register()
    }

    pub fn generator(&self) -> &LoadGenerator {
        &self.generator
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    /// Applies `command`; returns text to show the user, if any.
    pub fn dispatch(&mut self, command: Command) -> Option<String> {
        info!(?command, "command");
        match command {
            Command::Start => {
                if self.generator.is_running() {
                    return Some("already running".to_string());
                }
                self.generator.start();
                let s = self.generator.settings();
                Some(format!("starting load: CPU {}, RAM {}", s.cpu, s.ram))
            }
            Command::Stop => {
                if !self.generator.is_running() {
                    return Some("already idle".to_string());
                }
                self.generator.stop();
                Some("load stopped".to_string())
            }
            Command::SetCpu(value) => {
                let applied = self.generator.set_cpu_intensity(value);
                Some(intensity_reply("CPU", value, applied))
            }
            Command::SetRam(value) => {
                let applied = self.generator.set_ram_intensity(value);
                Some(intensity_reply("RAM", value, applied))
            }
            Command::SetBoth(settings) => {
                let applied = self.generator.set_intensity(settings);
                Some(format!("intensity set: CPU {}, RAM {}", applied.cpu, applied.ram))
            }
            Command::Status => Some(self.status_text()),
            Command::History => Some(self.history_text()),
            Command::Help => Some(HELP.to_string()),
            Command::Quit => {
                self.shutdown();
                None
            }
        }
    }

    pub fn refresh_data(&mut self) -> Update {
        self.refresh_at(Instant::now())
    }

    /// Samples once, records the snapshot, hands it to the listener and,
    /// when the rate limit allows, emits a summary.
    pub fn refresh_at(&mut self, now: Instant) -> Update {
        // The synthetic metric follows the configured intensity even while idle.
        let snapshot = self.sampler.sample(self.generator.settings().cpu);
        self.history.record(snapshot);

        let update = Update {
            snapshot,
            loading: self.generator.is_loading(),
            simulating: self.generator.is_running(),
        };
        self.channel.publish(update);
        if let Some(summary) = self.notifier.offer(&update, now) {
            info!(target: "envload::notify", "{summary}");
        }
        update
    }

    pub fn status_text(&self) -> String {
        let g = &self.generator;
        let s = g.settings();
        format!(
            "state {} | CPU {} on {}/{} workers | RAM {} holding {} of {} (budget {}) | cpu metric {}",
            g.state().label(),
            s.cpu,
            g.active_workers(),
            g.parallelism(),
            s.ram,
            format_bytes(g.allocated_bytes()),
            format_bytes(if g.is_running() { g.memory_target() } else { 0 }),
            format_bytes(g.memory_budget().bytes()),
            self.sampler.metric().label(),
        )
    }

    pub fn history_text(&self) -> String {
        if self.history.is_empty() {
            return "no samples yet".to_string();
        }
        let mut out = String::new();
        let _ = writeln!(out, "last {} samples, oldest first", self.history.len());
        let _ = writeln!(out, "cpu: {}", series(&self.history.cpu_series()));
        let _ = write!(out, "ram: {}", series(&self.history.ram_series()));
        if let Some((cpu, ram)) = self.history.averages() {
            let _ = write!(out, "\navg: CPU {cpu:.1}%, RAM {ram:.1}%");
        }
        out
    }

    /// Stops all load and marks the app as finished.
    pub fn shutdown(&mut self) {
        self.generator.stop();
        self.running = false;
    }
}

fn intensity_reply(kind: &str, requested: i64, applied: Intensity) -> String {
    if i64::from(applied.value()) == requested {
        format!("{kind} intensity set to {applied}")
    } else {
        format!("{kind} intensity set to {applied} (requested {requested})")
    }
}

fn series(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.0}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::provider::MemoryInfo;

    struct FakeProvider;

    impl MemoryInfoProvider for FakeProvider {
        fn memory_info(&mut self) -> MemoryInfo {
            MemoryInfo {
                total_bytes: 1000,
                available_bytes: 400,
            }
        }

        fn process_count(&mut self) -> usize {
            3
        }
    }

    fn test_app() -> App<FakeProvider> {
        let mut config = Config::default();
        config.load.threads = 2;
        config.load.duty_period_ms = 2;
        config.load.cpu_intensity = 100;
        config.load.ram_intensity = 0;
        App::with_budget(&config, FakeProvider, MemoryBudget::from_bytes(0))
    }

    #[test]
    fn start_stop_through_commands() {
        let mut app = test_app();
        assert_eq!(app.dispatch(Command::Stop).as_deref(), Some("already idle"));
        assert!(app.dispatch(Command::Start).unwrap().starts_with("starting load"));
        assert_eq!(app.generator().active_workers(), 2);
        assert_eq!(app.dispatch(Command::Start).as_deref(), Some("already running"));
        assert_eq!(app.dispatch(Command::Stop).as_deref(), Some("load stopped"));
        assert_eq!(app.generator().active_workers(), 0);
    }

    #[test]
    fn clamped_intensity_is_reported() {
        let mut app = test_app();
        let reply = app.dispatch(Command::SetCpu(150)).unwrap();
        assert_eq!(reply, "CPU intensity set to 100% (requested 150)");
        let reply = app.dispatch(Command::SetRam(30)).unwrap();
        assert_eq!(reply, "RAM intensity set to 30%");
    }

    #[test]
    fn refresh_publishes_and_records() {
        let mut app = test_app();
        let listener = app.listen();
        let idle = app.refresh_data();
        assert!(!idle.simulating);
        assert!((idle.snapshot.cpu_percent - 70.0).abs() < 1e-4);
        assert!((idle.snapshot.ram_percent - 60.0).abs() < 1e-4);
        assert_eq!(idle.snapshot.running_processes, 3);

        app.dispatch(Command::Start);
        let busy = app.refresh_data();
        assert!(busy.simulating);
        assert!((busy.snapshot.cpu_percent - 70.0).abs() < 1e-4);
        assert_eq!(listener.latest(), Some(busy));
        assert_eq!(app.history().len(), 2);
        app.shutdown();
        assert!(!app.running);
    }

    #[test]
    fn synthetic_cpu_tracks_configured_intensity_while_idle() {
        let mut app = test_app();
        app.dispatch(Command::SetCpu(50));
        let update = app.refresh_data();
        assert!(!update.simulating);
        assert!((update.snapshot.cpu_percent - 25.0).abs() < 1e-4);
        app.dispatch(Command::SetCpu(10));
        assert_eq!(app.refresh_data().snapshot.cpu_percent, 0.0);
    }

    #[test]
    fn quit_stops_everything() {
        let mut app = test_app();
        app.dispatch(Command::Start);
        assert_eq!(app.dispatch(Command::Quit), None);
        assert!(!app.running);
        assert!(!app.generator().is_running());
    }

    #[test]
    fn history_text_lists_samples() {
        let mut app = test_app();
        assert_eq!(app.history_text(), "no samples yet");
        app.refresh_data();
        let text = app.history_text();
        assert!(text.starts_with("last 1 samples"));
        assert!(text.contains("ram: 60"));
    }
}
