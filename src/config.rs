use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::fetch::{Location, RetryPolicy};
use crate::legend::Language;
use crate::render::layout::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::svgimage::Monochrome;

pub const FORECAST_URL: &str = "https://api.met.no/weatherapi/locationforecast/2.0/complete";
pub const LEGEND_URL: &str = "https://api.met.no/weatherapi/weathericon/2.0/legends";

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

/// Top-level app configuration, every value optional so layers can merge.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub location: Option<LocationConfig>,
    pub source: Option<SourceConfig>,
    pub retry: Option<RetryConfig>,
    pub cycle: Option<CycleConfig>,
    pub display: Option<DisplayConfig>,
    pub assets: Option<AssetsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocationConfig {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourceConfig {
    pub forecast_url: Option<String>,
    pub legend_url: Option<String>,
    /// offline legend, replaces the legend download
    pub legend_file: Option<PathBuf>,
    pub language: Option<Language>,
    /// contact appended to the User-Agent, met.no asks for one
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay_secs: Option<u64>,
    pub jitter_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CycleConfig {
    pub delay_secs: Option<u64>,
    /// append-only failure journal, none disables it
    pub error_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sink: Option<SinkKind>,     // <- strongly-typed sink selection
    pub path: Option<PathBuf>,
    /// "updated" stamp offset from UTC, local time when unset
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AssetsConfig {
    pub dir: Option<PathBuf>,
    pub monochrome: Option<Monochrome>,
    pub cache_capacity: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// binary PBM image, replaced atomically each frame
    #[default]
    Pbm,
    /// raw 1bpp frame written to a device node or file
    Packed,
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pbm" => Ok(SinkKind::Pbm),
            "packed" | "raw" => Ok(SinkKind::Packed),
            other => Err(format!("unknown sink '{}', expected pbm|packed", other)),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "yrpaper", about = "Weather forecast on a 2.7\" e-paper panel", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub altitude: Option<i32>,
    /// legend language: en | nb | nn
    #[arg(long)]
    pub language: Option<Language>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub legend_file: Option<PathBuf>,
    #[arg(long)]
    pub max_attempts: Option<u32>,
    #[arg(long)]
    pub retry_delay_secs: Option<u64>,
    #[arg(long)]
    pub cycle_delay_secs: Option<u64>,
    /// pbm | packed
    #[arg(long)]
    pub sink: Option<SinkKind>,
    #[arg(long, value_hint = ValueHint::AnyPath)]
    pub output: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub assets_dir: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub error_log: Option<PathBuf>,
    /// run a single cycle and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = build(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok((cfg, cli))
}

/// Layer defaults, YAML and CLI overrides, then validate.
pub fn build(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/yrpaper/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/yrpaper/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/yrpaper.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["yrpaper.yaml", "config.yaml", "config/yrpaper.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

macro_rules! take {
    ($dst:expr, $src:expr, $($field:ident),+) => {{
        $( if $src.$field.is_some() { $dst.$field = $src.$field; } )+
    }};
}

/// Merge a nested section, Option-by-Option.
fn merge_section<T, F>(dst: &mut Option<T>, src: Option<T>, fields: F)
where
    F: FnOnce(&mut T, T),
{
    match (dst.as_mut(), src) {
        (None, Some(s)) => *dst = Some(s),
        (Some(d), Some(s)) => fields(d, s),
        _ => {}
    }
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    merge_section(&mut dst.location, src.location, |d, s| take!(d, s, lat, lon, altitude));
    merge_section(&mut dst.source, src.source, |d, s| {
        take!(d, s, forecast_url, legend_url, legend_file, language, user_agent, timeout_secs)
    });
    merge_section(&mut dst.retry, src.retry, |d, s| take!(d, s, max_attempts, delay_secs, jitter_ms));
    merge_section(&mut dst.cycle, src.cycle, |d, s| take!(d, s, delay_secs, error_log));
    merge_section(&mut dst.display, src.display, |d, s| {
        take!(d, s, width, height, sink, path, utc_offset_minutes)
    });
    merge_section(&mut dst.assets, src.assets, |d, s| take!(d, s, dir, monochrome, cache_capacity));
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }

    if cli.lat.is_some() || cli.lon.is_some() || cli.altitude.is_some() {
        let location = cfg.location.get_or_insert_with(LocationConfig::default);
        if cli.lat.is_some()         { location.lat = cli.lat; }
        if cli.lon.is_some()         { location.lon = cli.lon; }
        if cli.altitude.is_some()    { location.altitude = cli.altitude; }
    }
    if cli.language.is_some() || cli.legend_file.is_some() {
        let source = cfg.source.get_or_insert_with(SourceConfig::default);
        if cli.language.is_some()    { source.language = cli.language; }
        if cli.legend_file.is_some() { source.legend_file = cli.legend_file.clone(); }
    }
    if cli.max_attempts.is_some() || cli.retry_delay_secs.is_some() {
        let retry = cfg.retry.get_or_insert_with(RetryConfig::default);
        if cli.max_attempts.is_some()     { retry.max_attempts = cli.max_attempts; }
        if cli.retry_delay_secs.is_some() { retry.delay_secs = cli.retry_delay_secs; }
    }
    if cli.cycle_delay_secs.is_some() || cli.error_log.is_some() {
        let cycle = cfg.cycle.get_or_insert_with(CycleConfig::default);
        if cli.cycle_delay_secs.is_some() { cycle.delay_secs = cli.cycle_delay_secs; }
        if cli.error_log.is_some()        { cycle.error_log = cli.error_log.clone(); }
    }
    if cli.sink.is_some() || cli.output.is_some() {
        let display = cfg.display.get_or_insert_with(DisplayConfig::default);
        if cli.sink.is_some()        { display.sink = cli.sink; }
        if cli.output.is_some()      { display.path = cli.output.clone(); }
    }
    if cli.assets_dir.is_some() {
        cfg.assets.get_or_insert_with(AssetsConfig::default).dir = cli.assets_dir.clone();
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(location) = cfg.location.as_ref() {
        if let Some(lat) = location.lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::Validation("location lat must be within -90..=90".into()));
            }
        }
        if let Some(lon) = location.lon {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::Validation("location lon must be within -180..=180".into()));
            }
        }
    }
    if let Some(retry) = cfg.retry.as_ref() {
        if retry.max_attempts == Some(0) {
            return Err(ConfigError::Validation("retry max_attempts must be >= 1".into()));
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        let width = display.width.unwrap_or(CANVAS_WIDTH);
        let height = display.height.unwrap_or(CANVAS_HEIGHT);
        if (width, height) != (CANVAS_WIDTH, CANVAS_HEIGHT) {
            return Err(ConfigError::Validation(format!(
                "display must be {}x{}, got {}x{}",
                CANVAS_WIDTH, CANVAS_HEIGHT, width, height
            )));
        }
        if let Some(minutes) = display.utc_offset_minutes {
            if minutes.abs() >= 24 * 60 {
                return Err(ConfigError::Validation("display utc_offset_minutes must be within a day".into()));
            }
        }
    }
    Ok(())
}

/// Fully resolved settings, defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_level: String,
    pub location: Location,
    pub forecast_url: String,
    pub legend_url: String,
    pub legend_file: Option<PathBuf>,
    pub language: Language,
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub cycle_delay: Duration,
    pub error_log: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub sink: SinkKind,
    pub output: PathBuf,
    pub utc_offset_minutes: Option<i32>,
    pub assets_dir: PathBuf,
    pub monochrome: Monochrome,
    pub cache_capacity: u64,
}

impl Settings {
    pub fn resolve(cfg: &Config) -> Settings {
        let location = cfg.location.clone().unwrap_or_default();
        let source = cfg.source.clone().unwrap_or_default();
        let retry = cfg.retry.clone().unwrap_or_default();
        let cycle = cfg.cycle.clone().unwrap_or_default();
        let display = cfg.display.clone().unwrap_or_default();
        let assets = cfg.assets.clone().unwrap_or_default();

        Settings {
            log_level: cfg.log_level.clone().unwrap_or_else(|| "info".to_string()),
            location: Location {
                lat: location.lat.unwrap_or(58.8474),
                lon: location.lon.unwrap_or(5.7166),
                altitude: location.altitude,
            },
            forecast_url: source.forecast_url.unwrap_or_else(|| FORECAST_URL.to_string()),
            legend_url: source.legend_url.unwrap_or_else(|| LEGEND_URL.to_string()),
            legend_file: source.legend_file,
            language: source.language.unwrap_or_default(),
            user_agent: source.user_agent.unwrap_or_default(),
            timeout: Duration::from_secs(source.timeout_secs.unwrap_or(30)),
            retry: RetryPolicy {
                max_attempts: retry.max_attempts.unwrap_or(crate::fetch::DEFAULT_MAX_ATTEMPTS),
                delay: retry
                    .delay_secs
                    .map(Duration::from_secs)
                    .unwrap_or(crate::fetch::DEFAULT_RETRY_DELAY),
                jitter: Duration::from_millis(retry.jitter_ms.unwrap_or(0)),
            },
            cycle_delay: Duration::from_secs(cycle.delay_secs.unwrap_or(600)),
            error_log: cycle.error_log,
            width: display.width.unwrap_or(CANVAS_WIDTH),
            height: display.height.unwrap_or(CANVAS_HEIGHT),
            sink: display.sink.unwrap_or_default(),
            output: display.path.unwrap_or_else(|| PathBuf::from("./yrpaper.pbm")),
            utc_offset_minutes: display.utc_offset_minutes,
            assets_dir: assets.dir.unwrap_or_else(|| PathBuf::from("./assets/icons")),
            monochrome: assets.monochrome.unwrap_or_default(),
            cache_capacity: assets.cache_capacity.unwrap_or(crate::assets::DEFAULT_CACHE_CAPACITY),
        }
    }
}
