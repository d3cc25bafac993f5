//! Filter configuration and live parameters
//!
//! `FilterConfig` describes the four tracks (x, y, size, angle) and the
//! outline check box: labels, defaults and ranges. It is stored as JSON next
//! to the binary. `FilterParams` is the live value set the user edits; it is
//! always kept inside the configured ranges.

use crate::kaleido::LatticeParameters;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "kaleidoscope.json";

/// One integer slider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackSpec {
    pub label: String,
    pub default: i32,
    pub min: i32,
    pub max: i32,
}

impl TrackSpec {
    pub fn new(label: impl Into<String>, default: i32, min: i32, max: i32) -> Self {
        Self {
            label: label.into(),
            default,
            min,
            max,
        }
    }

    #[inline]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    /// Swap inverted bounds and pull the default into range
    fn sanitize(&mut self) {
        if self.min > self.max {
            warn!(track = %self.label, min = self.min, max = self.max, "inverted track range");
            std::mem::swap(&mut self.min, &mut self.max);
        }
        self.default = self.clamp(self.default);
    }
}

/// One on/off check box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSpec {
    pub label: String,
    pub default: bool,
}

/// Deserialized through `ConfigFile`, so every key that is absent keeps its
/// built-in value and the result is always sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct FilterConfig {
    pub name: String,
    pub x: TrackSpec,
    pub y: TrackSpec,
    pub size: TrackSpec,
    pub angle: TrackSpec,
    pub show_triangle: CheckSpec,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            name: "KaleidoScope".to_string(),
            x: TrackSpec::new("x", 100, 0, 1024),
            y: TrackSpec::new("y", 100, 0, 1024),
            size: TrackSpec::new("size", 100, 1, 500),
            angle: TrackSpec::new("angle", 0, -1800, 1800),
            show_triangle: CheckSpec {
                label: "show triangle".to_string(),
                default: false,
            },
        }
    }
}

impl FilterConfig {
    /// Load from a JSON file. Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Load, falling back to the built-in defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded filter config");
                config
            },
            Err(e) => {
                warn!(path = %path.display(), "using default filter config: {:#}", e);
                Self::default()
            },
        }
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("failed to write config {}", path.display()))
    }

    fn sanitize(&mut self) {
        // size 0 would leave the lattice undefined
        self.size.min = self.size.min.max(1);
        self.size.max = self.size.max.max(1);
        for track in [&mut self.x, &mut self.y, &mut self.size, &mut self.angle] {
            track.sanitize();
        }
    }

    /// Parameters at their configured defaults
    pub fn defaults(&self) -> FilterParams {
        FilterParams {
            x: self.x.default,
            y: self.y.default,
            size: self.size.default,
            angle: self.angle.default,
            show_triangle: self.show_triangle.default,
        }
    }

    /// Make `params` the new defaults
    pub fn store_defaults(&mut self, params: &FilterParams) {
        let params = params.clamped(self);
        self.x.default = params.x;
        self.y.default = params.y;
        self.size.default = params.size;
        self.angle.default = params.angle;
        self.show_triangle.default = params.show_triangle;
    }
}

/// Track as written on disk; any key may be missing
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackEntry {
    label: Option<String>,
    default: Option<i32>,
    min: Option<i32>,
    max: Option<i32>,
}

impl TrackEntry {
    fn merge_onto(self, base: TrackSpec) -> TrackSpec {
        TrackSpec {
            label: self.label.unwrap_or(base.label),
            default: self.default.unwrap_or(base.default),
            min: self.min.unwrap_or(base.min),
            max: self.max.unwrap_or(base.max),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckEntry {
    label: Option<String>,
    default: Option<bool>,
}

impl CheckEntry {
    fn merge_onto(self, base: CheckSpec) -> CheckSpec {
        CheckSpec {
            label: self.label.unwrap_or(base.label),
            default: self.default.unwrap_or(base.default),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    name: Option<String>,
    x: TrackEntry,
    y: TrackEntry,
    size: TrackEntry,
    angle: TrackEntry,
    show_triangle: CheckEntry,
}

impl From<ConfigFile> for FilterConfig {
    fn from(file: ConfigFile) -> Self {
        let base = Self::default();
        let mut config = Self {
            name: file.name.unwrap_or(base.name),
            x: file.x.merge_onto(base.x),
            y: file.y.merge_onto(base.y),
            size: file.size.merge_onto(base.size),
            angle: file.angle.merge_onto(base.angle),
            show_triangle: file.show_triangle.merge_onto(base.show_triangle),
        };
        config.sanitize();
        config
    }
}

/// Live filter parameters in host units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    /// Tenths of a degree
    pub angle: i32,
    pub show_triangle: bool,
}

impl FilterParams {
    pub fn clamped(self, config: &FilterConfig) -> Self {
        Self {
            x: config.x.clamp(self.x),
            y: config.y.clamp(self.y),
            size: config.size.clamp(self.size),
            angle: config.angle.clamp(self.angle),
            show_triangle: self.show_triangle,
        }
    }

    /// Overwrite the fields present in `patch`, then clamp
    pub fn apply(&mut self, patch: &ParamPatch, config: &FilterConfig) {
        let mut next = *self;
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(size) = patch.size {
            next.size = size;
        }
        if let Some(angle) = patch.angle {
            next.angle = angle;
        }
        if let Some(show) = patch.show_triangle {
            next.show_triangle = show;
        }
        *self = next.clamped(config);
    }

    /// Lattice placement for the core
    pub fn lattice(&self) -> Result<LatticeParameters> {
        LatticeParameters::from_tracks(self.x, self.y, self.size, self.angle)
    }
}

/// Partial parameter update, as received over the control socket or MQTT
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParamPatch {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub size: Option<i32>,
    pub angle: Option<i32>,
    pub show_triangle: Option<bool>,
}

impl ParamPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tracks() {
        let config = FilterConfig::default();
        let params = config.defaults();
        assert_eq!((params.x, params.y, params.size, params.angle), (100, 100, 100, 0));
        assert!(!params.show_triangle);
        assert_eq!((config.angle.min, config.angle.max), (-1800, 1800));
        assert_eq!((config.size.min, config.size.max), (1, 500));
    }

    #[test]
    fn test_patch_is_clamped() {
        let config = FilterConfig::default();
        let mut params = config.defaults();
        params.apply(
            &ParamPatch {
                size: Some(0),
                angle: Some(5000),
                x: Some(12),
                ..ParamPatch::default()
            },
            &config,
        );
        assert_eq!(params.size, 1);
        assert_eq!(params.angle, 1800);
        assert_eq!(params.x, 12);
        assert_eq!(params.y, 100);
        assert!(params.lattice().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "name": "Mirror", "size": { "label": "edge", "default": 64, "min": 8, "max": 256 } }"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Mirror");
        assert_eq!(config.size, TrackSpec::new("edge", 64, 8, 256));
        assert_eq!(config.angle, FilterConfig::default().angle);
    }

    #[test]
    fn test_partial_track_keeps_other_keys() {
        let json = r#"{ "name": "Mirror", "size": { "max": 800 }, "show_triangle": { "default": true } }"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        let defaults = FilterConfig::default();
        assert_eq!(config.name, "Mirror");
        assert_eq!(config.size, TrackSpec::new("size", 100, 1, 800));
        assert_eq!(config.x, defaults.x);
        assert_eq!(config.show_triangle.label, defaults.show_triangle.label);
        assert!(config.show_triangle.default);
    }

    #[test]
    fn test_partial_file_is_not_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "angle": { "default": 450 }, "y": { "min": 20 } }"#).unwrap();
        let config = FilterConfig::load_or_default(&path);
        assert_eq!(config.angle, TrackSpec::new("angle", 450, -1800, 1800));
        assert_eq!(config.y, TrackSpec::new("y", 100, 20, 1024));
    }

    #[test]
    fn test_patch_from_json() {
        let patch: ParamPatch = serde_json::from_str(r#"{"size": 80, "angle": -300}"#).unwrap();
        assert_eq!(patch.size, Some(80));
        assert_eq!(patch.angle, Some(-300));
        assert_eq!(patch.x, None);
        assert!(!patch.is_empty());
        assert!(ParamPatch::default().is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_new_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kaleidoscope.json");

        let mut config = FilterConfig::default();
        let mut params = config.defaults();
        params.x = 320;
        params.angle = -450;
        params.show_triangle = true;
        config.store_defaults(&params);
        config.save(&path).unwrap();

        let loaded = FilterConfig::load(&path).unwrap();
        assert_eq!(loaded.defaults(), params);
    }

    #[test]
    fn test_inverted_ranges_are_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{ "size": { "label": "size", "default": 900, "min": 500, "max": 0 } }"#,
        )
        .unwrap();
        let config = FilterConfig::load(&path).unwrap();
        assert_eq!((config.size.min, config.size.max), (1, 500));
        assert_eq!(config.size.default, 500);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = FilterConfig::load_or_default(dir.path().join("absent.json"));
        assert_eq!(config, FilterConfig::default());
    }
}
