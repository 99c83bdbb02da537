/*
 *  config.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, then command line overrides
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use dirs_next::home_dir;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

pub const DEFAULT_ROWS: u32 = 32;
pub const DEFAULT_COLS: u32 = 32;
pub const DEFAULT_REFRESH_HZ: u32 = 100;

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

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub matrix: Option<MatrixConfig>,
    pub playback: Option<PlaybackConfig>,
}

/// Panel geometry and driver selection
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatrixConfig {
    pub rows: Option<u32>,          // rows per panel
    pub cols: Option<u32>,          // columns per panel
    pub chain_length: Option<u32>,  // panels daisy chained
    pub parallel: Option<u32>,      // parallel chains
    pub refresh_hz: Option<u32>,
    pub brightness: Option<u8>,     // percent, 1-100
    pub driver: Option<DriverKind>,
}

/// Playback policy shared by every source
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlaybackConfig {
    pub center: Option<bool>,
    pub shuffle: Option<bool>,
    pub forever: Option<bool>,
    pub vsync_multiple: Option<u32>,
    pub fill_width: Option<bool>,
    pub fill_height: Option<bool>,
    pub filter: Option<ScaleFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Software panel paced by its own refresh clock
    #[default]
    Headless,
    /// Recording driver, swaps never block
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScaleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ScaleFilter> for FilterType {
    fn from(f: ScaleFilter) -> Self {
        match f {
            ScaleFilter::Nearest => FilterType::Nearest,
            ScaleFilter::Triangle => FilterType::Triangle,
            ScaleFilter::CatmullRom => FilterType::CatmullRom,
            ScaleFilter::Gaussian => FilterType::Gaussian,
            ScaleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl MatrixConfig {
    pub fn panel_width(&self) -> u32 {
        self.cols.unwrap_or(DEFAULT_COLS) * self.chain_length.unwrap_or(1)
    }

    pub fn panel_height(&self) -> u32 {
        self.rows.unwrap_or(DEFAULT_ROWS) * self.parallel.unwrap_or(1)
    }

    pub fn refresh_hz(&self) -> u32 {
        self.refresh_hz.unwrap_or(DEFAULT_REFRESH_HZ)
    }
}

impl PlaybackConfig {
    pub fn center(&self) -> bool { self.center.unwrap_or(false) }
    pub fn shuffle(&self) -> bool { self.shuffle.unwrap_or(false) }
    pub fn forever(&self) -> bool { self.forever.unwrap_or(false) }
    pub fn fill_width(&self) -> bool { self.fill_width.unwrap_or(false) }
    pub fn fill_height(&self) -> bool { self.fill_height.unwrap_or(false) }
    pub fn filter(&self) -> ScaleFilter { self.filter.unwrap_or_default() }

    /// Never below one refresh
    pub fn vsync_multiple(&self) -> u32 {
        self.vsync_multiple.unwrap_or(1).max(1)
    }
}

impl Config {
    pub fn matrix(&self) -> MatrixConfig {
        self.matrix.clone().unwrap_or_default()
    }

    pub fn playback(&self) -> PlaybackConfig {
        self.playback.clone().unwrap_or_default()
    }
}

/// Command line values that layer over the YAML file. All optional.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub matrix: MatrixConfig,
    pub playback: PlaybackConfig,
}

/// Public entry point: read YAML, merge CLI overrides, validate.
pub fn load(cli: &ConfigOverrides) -> Result<Config, ConfigError> {
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

/// Pretty YAML of the effective config
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/lymons-viewer/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/lymons-viewer/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/lymons-viewer.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["lymons-viewer.yaml", "config/lymons-viewer.yaml"] {
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

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.matrix, src.matrix) {
        (None, Some(m)) => dst.matrix = Some(m),
        (Some(d), Some(s)) => merge_matrix(d, s),
        _ => {}
    }
    match (&mut dst.playback, src.playback) {
        (None, Some(p)) => dst.playback = Some(p),
        (Some(d), Some(s)) => merge_playback(d, s),
        _ => {}
    }
}

fn merge_matrix(dst: &mut MatrixConfig, src: MatrixConfig) {
    if src.rows.is_some()         { dst.rows = src.rows; }
    if src.cols.is_some()         { dst.cols = src.cols; }
    if src.chain_length.is_some() { dst.chain_length = src.chain_length; }
    if src.parallel.is_some()     { dst.parallel = src.parallel; }
    if src.refresh_hz.is_some()   { dst.refresh_hz = src.refresh_hz; }
    if src.brightness.is_some()   { dst.brightness = src.brightness; }
    if src.driver.is_some()       { dst.driver = src.driver; }
}

fn merge_playback(dst: &mut PlaybackConfig, src: PlaybackConfig) {
    if src.center.is_some()         { dst.center = src.center; }
    if src.shuffle.is_some()        { dst.shuffle = src.shuffle; }
    if src.forever.is_some()        { dst.forever = src.forever; }
    if src.vsync_multiple.is_some() { dst.vsync_multiple = src.vsync_multiple; }
    if src.fill_width.is_some()     { dst.fill_width = src.fill_width; }
    if src.fill_height.is_some()    { dst.fill_height = src.fill_height; }
    if src.filter.is_some()         { dst.filter = src.filter; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &ConfigOverrides) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    merge(cfg, Config {
        log_level: None,
        matrix: Some(cli.matrix.clone()),
        playback: Some(cli.playback.clone()),
    });
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(m) = cfg.matrix.as_ref() {
        let dims = [m.rows, m.cols, m.chain_length, m.parallel];
        if dims.iter().flatten().any(|&v| v == 0) {
            return Err(ConfigError::Validation(
                "matrix rows/cols/chain_length/parallel must be > 0".into()));
        }
        if m.refresh_hz == Some(0) {
            return Err(ConfigError::Validation("matrix refresh_hz must be > 0".into()));
        }
        if let Some(b) = m.brightness {
            if b == 0 || b > 100 {
                return Err(ConfigError::Validation("matrix brightness must be 1..=100".into()));
            }
        }
    }
    Ok(())
}
