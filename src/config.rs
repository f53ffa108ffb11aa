use std::path::{Path, PathBuf};

use color_eyre::eyre::{Report, Result, WrapErr};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub load: LoadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub sample_interval_ms: u64,
    pub notify_interval_ms: u64,
    pub history_length: usize,
    pub cpu_metric: String,
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            sample_interval_ms: 1000,
            notify_interval_ms: 5000,
            history_length: 60,
            cpu_metric: "synthetic".to_string(),
            output: "text".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub cpu_intensity: i64,
    pub ram_intensity: i64,
    pub max_cpu_intensity: i64,
    pub max_ram_intensity: i64,
    pub duty_period_ms: u64,
    pub block_size_mb: u64,
    pub allocation_pause_ms: u64,
    pub budget_fraction: f64,
    pub threads: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            cpu_intensity: 50,
            ram_intensity: 50,
            max_cpu_intensity: 100,
            max_ram_intensity: 100,
            duty_period_ms: 10,
            block_size_mb: 16,
            allocation_pause_ms: 10,
            budget_fraction: 0.8,
            threads: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("envload").join("config.toml"))
}

/// Loads `path`, or the default location when `None`. A missing default file
/// is not an error. Any other failure falls back to defaults and is returned
/// alongside, so it can be logged once logging is up.
pub fn load_config(path: Option<&Path>) -> (Config, Option<Report>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return (Config::default(), None),
        },
    };
    match read_config(&path) {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    }
}

pub fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&contents).wrap_err_with(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.sample_interval_ms, 1000);
        assert_eq!(config.general.notify_interval_ms, 5000);
        assert_eq!(config.general.history_length, 60);
        assert_eq!(config.general.cpu_metric, "synthetic");
        assert_eq!(config.load.duty_period_ms, 10);
        assert!((config.load.budget_fraction - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[load]
cpu_intensity = 75
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.load.cpu_intensity, 75);
        // Other fields should be defaults
        assert_eq!(config.load.ram_intensity, 50);
        assert_eq!(config.general.sample_interval_ms, 1000);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
sample_interval_ms = 500
notify_interval_ms = 2000
history_length = 30
cpu_metric = "measured"
output = "json"

[load]
cpu_intensity = 90
ram_intensity = 20
max_cpu_intensity = 90
max_ram_intensity = 80
duty_period_ms = 20
block_size_mb = 4
allocation_pause_ms = 0
budget_fraction = 0.5
threads = 2

[logging]
level = "debug"
format = "json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.sample_interval_ms, 500);
        assert_eq!(config.general.cpu_metric, "measured");
        assert_eq!(config.general.output, "json");
        assert_eq!(config.load.max_ram_intensity, 80);
        assert_eq!(config.load.block_size_mb, 4);
        assert!((config.load.budget_fraction - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.load.threads, 2);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn missing_file_returns_default() {
        let (config, err) = load_config(Some(Path::new("/nonexistent/path/config.toml")));
        assert_eq!(config.general.sample_interval_ms, 1000);
        assert!(err.is_some());
    }

    #[test]
    fn valid_file_is_read() {
        let temp = std::env::temp_dir().join("envload_test_valid.toml");
        std::fs::write(&temp, "[general]\noutput = \"json\"\n").unwrap();
        let (config, err) = load_config(Some(&temp));
        assert!(err.is_none());
        assert_eq!(config.general.output, "json");
        let _ = std::fs::remove_file(&temp);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("envload_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let (config, err) = load_config(Some(&temp));
        assert_eq!(config.load.cpu_intensity, 50);
        assert!(err.is_some());
        let _ = std::fs::remove_file(&temp);
    }
}
