use color_eyre::eyre::Result;

use crate::channel::Update;
use crate::format::{format_bytes, format_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl OutputMode {
    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            _ => OutputMode::Text,
        }
    }

    pub fn render(self, update: &Update) -> Result<String> {
        match self {
            OutputMode::Text => Ok(render_text(update)),
            OutputMode::Json => render_json(update),
        }
    }
}

pub fn render_text(update: &Update) -> String {
    let mode = if update.simulating {
        "simulating"
    } else {
        "monitoring"
    };
    let s = &update.snapshot;
    let mut line = format!(
        "[{mode}] CPU {} | RAM {} | procs {} | avail {} of {}",
        format_percent(s.cpu_percent),
        format_percent(s.ram_percent),
        s.running_processes,
        format_bytes(s.available_memory_bytes),
        format_bytes(s.total_memory_bytes),
    );
    if update.loading {
        line.push_str(" | adjusting...");
    }
    line
}

pub fn render_json(update: &Update) -> Result<String> {
    Ok(serde_json::to_string(update)?)
}
