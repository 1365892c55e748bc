//! Runtime settings.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `CHECKVIEW_*` environment variables. Nested keys
//! use a double underscore, e.g. `CHECKVIEW_SCHEDULER__UPDATE_DELAY_MS=250`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::chart::Palette;
use crate::hook::{HookOptions, Sizing};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CHECKVIEW";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Quiet period after an update or reconnect before the chart re-renders.
    pub update_delay_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { update_delay_ms: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// How often the page source is polled.
    pub refresh_ms: u64,
    /// Delay between reconnect attempts of a TCP source.
    pub retry_delay_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log file; the terminal belongs to the TUI.
    pub file: PathBuf,
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("checkview.log"),
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scheduler: SchedulerSettings,
    pub source: SourceSettings,
    pub surface: Sizing,
    pub palette: Palette,
    pub log: LogSettings,
}

impl Settings {
    /// Load settings from an optional file plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.scheduler.update_delay_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.source.refresh_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.source.retry_delay_ms)
    }

    /// Options for the hooks created by a registry.
    pub fn hook_options(&self) -> HookOptions {
        HookOptions {
            sizing: self.surface,
            palette: self.palette.clone(),
            update_delay: self.update_delay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::chart::Color;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let map = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with(None, env(&[])).unwrap();
        assert_eq!(settings.update_delay(), Duration::from_millis(100));
        assert_eq!(settings.surface, Sizing::default());
        assert_eq!(settings.palette, Palette::default());
        assert_eq!(settings.log.file, PathBuf::from("checkview.log"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r##"
[scheduler]
update_delay_ms = 250

[surface]
height_px = 320

[palette]
base = "#112233"
threshold_band = "rgba(1, 2, 3, 0.5)"
"##
        )
        .unwrap();

        let settings = Settings::load_with(Some(file.path()), env(&[])).unwrap();
        assert_eq!(settings.update_delay(), Duration::from_millis(250));
        assert_eq!(settings.surface.height_px, 320);
        assert_eq!(settings.surface.max_height_px, 400);
        assert_eq!(settings.palette.base, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(settings.palette.threshold_band, Color::rgba(1, 2, 3, 0.5));
        assert_eq!(settings.palette.failure, Palette::default().failure);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::load_with(
            None,
            env(&[
                ("CHECKVIEW_SCHEDULER__UPDATE_DELAY_MS", "50"),
                ("CHECKVIEW_LOG__FILTER", "debug"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.update_delay(), Duration::from_millis(50));
        assert_eq!(settings.log.filter, "debug");
    }

    #[test]
    fn test_bad_color_is_an_error() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[palette]\nbase = \"blue-ish\"").unwrap();
        assert!(Settings::load_with(Some(file.path()), env(&[])).is_err());
    }

    #[test]
    fn test_hook_options() {
        let options = Settings::default().hook_options();
        assert_eq!(options.update_delay, Duration::from_millis(100));
        assert_eq!(options.sizing.effective_height_px(), 256);
    }
}
