use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::forecast::DitherMode;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. Canvas geometry is fixed and not in here.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub location: LocationConfig,
    pub forecast: ForecastConfig,
    pub sensors: SensorConfig,
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub lat: f64,
    pub lng: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self { lat: 49.579981, lng: 11.020197 }
    }
}

/// One week, the longest hourly series the API serves
pub const MAX_HORIZON_HOURS: u32 = 168;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    /// environment variable holding the API key, the key never lives in YAML
    pub api_key_env: String,
    pub units: String,
    pub horizon_hours: u32,
    pub timeout_ms: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pirateweather.net/forecast".to_string(),
            api_key_env: "DARKSKY_API_KEY".to_string(),
            units: "ca".to_string(),
            horizon_hours: 47,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    pub temperature_host: String,
    pub temperature_port: u16,
    pub co2_url: String,
    pub timeout_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            temperature_host: "ente.hawo.stw.uni-erlangen.de".to_string(),
            temperature_port: 7337,
            co2_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    /// PBM dump of the composed canvas, rewritten on every flush
    pub snapshot_path: Option<PathBuf>,
    /// cloud band dithering: floyd_steinberg | scattered
    pub dither: DitherMode,
}

/// CLI overrides, layered over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "wxpanel", about = "Clock, room climate and forecast panel", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Write a PBM snapshot of the canvas on every flush
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

impl Cli {
    /// Effective log filter: --debug, then --log-level/YAML, then info.
    pub fn log_filter(&self, cfg: &Config) -> String {
        if self.debug {
            return "debug".to_string();
        }
        cfg.log_level.clone().unwrap_or_else(|| "info".to_string())
    }
}

/// Public entry point: read YAML, layer CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) YAML file (explicit path or search), defaults fill the gaps
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 2) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 3) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/wxpanel/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/wxpanel/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/wxpanel.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["wxpanel.yaml", "config.yaml", "config/wxpanel.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    // an empty file is a valid, all-default config
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(s)?)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()  { cfg.log_level = cli.log_level.clone(); }
    if cli.snapshot.is_some()   { cfg.panel.snapshot_path = cli.snapshot.clone(); }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&cfg.location.lat) {
        return Err(ConfigError::Validation("location lat must be within -90..=90".into()));
    }
    if !(-180.0..=180.0).contains(&cfg.location.lng) {
        return Err(ConfigError::Validation("location lng must be within -180..=180".into()));
    }
    if !(1..=MAX_HORIZON_HOURS).contains(&cfg.forecast.horizon_hours) {
        return Err(ConfigError::Validation(format!(
            "forecast horizon_hours must be within 1..={}",
            MAX_HORIZON_HOURS
        )));
    }
    if cfg.forecast.api_key_env.is_empty() {
        return Err(ConfigError::Validation("forecast api_key_env must name a variable".into()));
    }
    if cfg.sensors.temperature_port == 0 {
        return Err(ConfigError::Validation("sensors temperature_port must be > 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.forecast.horizon_hours, 47);
        assert_eq!(cfg.forecast.units, "ca");
        assert_eq!(cfg.sensors.temperature_port, 7337);
        assert_eq!(cfg.sensors.co2_url, "http://127.0.0.1:8000");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = parse_yaml("log_level: debug\nsensors:\n  temperature_port: 9000\n").unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.sensors.temperature_port, 9000);
        assert_eq!(cfg.sensors.temperature_host, SensorConfig::default().temperature_host);
        assert_eq!(cfg.location, LocationConfig::default());
    }

    #[test]
    fn test_dither_mode_key() {
        assert_eq!(Config::default().panel.dither, DitherMode::FloydSteinberg);
        let cfg = parse_yaml("panel:\n  dither: scattered\n").unwrap();
        assert_eq!(cfg.panel.dither, DitherMode::Scattered);
        assert!(parse_yaml("panel:\n  dither: halftone\n").is_err());
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(parse_yaml("\n").unwrap(), Config::default());
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = parse_yaml("log_level: warn\n").unwrap();
        let cli = Cli {
            log_level: Some("trace".to_string()),
            snapshot: Some(PathBuf::from("/tmp/panel.pbm")),
            ..Cli::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.log_level.as_deref(), Some("trace"));
        assert_eq!(cfg.panel.snapshot_path, Some(PathBuf::from("/tmp/panel.pbm")));
        assert_eq!(cli.log_filter(&cfg), "trace");
        let debug = Cli { debug: true, ..Cli::default() };
        assert_eq!(debug.log_filter(&cfg), "debug");
    }

    #[test]
    fn test_validation() {
        let mut cfg = Config::default();
        cfg.forecast.horizon_hours = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let mut cfg = parse_yaml("forecast:\n  horizon_hours: 4000000000\n").unwrap();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
        cfg.forecast.horizon_hours = MAX_HORIZON_HOURS;
        assert!(validate(&cfg).is_ok());
        cfg.forecast.horizon_hours = MAX_HORIZON_HOURS + 1;
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.location.lat = 91.0;
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.sensors.temperature_port = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/wxpanel.yaml")),
            ..Cli::default()
        };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }
}
