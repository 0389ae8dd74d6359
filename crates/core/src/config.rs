//! Tour configuration.
//!
//! Every value has a built-in default matching the Reitaku campus data set.
//! A TOML file may override whole sections, and a few scalar settings can be
//! overridden again through `CAMPUS_TOUR_*` environment variables. The
//! layered loader remembers where each setting came from.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use campus_tour_protocol::{GroupStyle, Rgb};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Where image assets live relative to the map page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLayout {
    /// Root directory of all images.
    pub root: String,
    /// Bare references starting with this prefix are joined under `root`.
    pub reserved_prefix: String,
    /// Subdirectory of `root` assumed for bare file names.
    pub default_subdir: String,
    /// Subdirectory of `root` holding minimap base images.
    pub minimap_dir: String,
    /// Minimap image used when a place has no category slug.
    pub default_minimap_icon: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            root: "images".to_string(),
            reserved_prefix: "part".to_string(),
            default_subdir: "part2".to_string(),
            minimap_dir: "minimap".to_string(),
            default_minimap_icon: "asunaro".to_string(),
        }
    }
}

/// Forces a group whenever a place's combined text contains `contains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOverride {
    pub contains: String,
    pub group: String,
}

impl GroupOverride {
    pub fn new(contains: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            group: group.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Known building groups, in display order.
    pub group_order: Vec<String>,
    /// Buildings whose spots lead their group.
    pub flagship_buildings: Vec<String>,
    /// Naming quirks of the source sheet, checked in order before the
    /// category fallback.
    pub group_overrides: Vec<GroupOverride>,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            group_order: [
                "satsuki",
                "kaede",
                "asunaro",
                "hiiragi",
                "graduate",
                "outside",
                "kenkyuutou",
                "toshokan",
            ]
            .map(String::from)
            .to_vec(),
            flagship_buildings: vec!["さつき校舎".to_string(), "かえで校舎".to_string()],
            // Open spaces (広場) belong outdoors; the graduate school and the
            // lifelong-learning plaza share one building.
            group_overrides: vec![
                GroupOverride::new("広場", "outside"),
                GroupOverride::new("麗澤大学院", "graduate"),
                GroupOverride::new("生涯教育プラザ", "graduate"),
                GroupOverride::new("大学院", "graduate"),
            ],
        }
    }
}

/// How the map page is hosted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedMode {
    /// Top-level page; panoramas open in place.
    #[default]
    Standalone,
    /// Inside the landing page iframe; panoramas open in the host overlay.
    Embedded,
    /// The host overlay itself.
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub embed_mode: EmbedMode,
    pub default_hfov: f64,
    pub min_hfov: f64,
    pub max_hfov: f64,
    /// Degrees added or removed by one zoom button press.
    pub zoom_step: f64,
    pub autorotate_deg_per_sec: f64,
    /// Delay before autorotation resumes after the user lets go.
    pub autorotate_resume_ms: f64,
    /// Clear the loading visual after this long even without a load signal.
    pub loading_fallback_ms: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            embed_mode: EmbedMode::Standalone,
            default_hfov: 110.0,
            min_hfov: 45.0,
            max_hfov: 120.0,
            zoom_step: 10.0,
            autorotate_deg_per_sec: 0.7,
            autorotate_resume_ms: 260.0,
            loading_fallback_ms: 1200.0,
        }
    }
}

impl ViewerConfig {
    pub fn clamp_hfov(&self, hfov: f64) -> f64 {
        hfov.clamp(self.min_hfov, self.max_hfov)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub focus_zoom: f64,
    pub fly_duration_ms: u32,
    /// Shorter flight used when a carousel card is picked.
    pub card_fly_duration_ms: u32,
    pub max_fit_zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            focus_zoom: 18.0,
            fly_duration_ms: 1000,
            card_fly_duration_ms: 800,
            max_fit_zoom: 18.0,
        }
    }
}

/// A building group with its card label and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardGroup {
    pub slug: String,
    #[serde(flatten)]
    pub style: GroupStyle,
}

/// Marker color for a sheet category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColor {
    pub name: String,
    pub label: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub notice_ms: u32,
    pub toast_ms: u32,
    pub card_groups: Vec<CardGroup>,
    pub categories: Vec<CategoryColor>,
    /// Category assumed for records without one.
    pub default_category: String,
    pub default_marker_color: Rgb,
    pub default_minimap_color: Rgb,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        let group = |slug: &str, label: &str, hex: &str| CardGroup {
            slug: slug.to_string(),
            style: GroupStyle {
                label: label.to_string(),
                color: Rgb::from_hex(hex).unwrap_or(Rgb::new(0x2d, 0x9b, 0xf0)),
            },
        };
        let category = |name: &str, label: &str, hex: &str| CategoryColor {
            name: name.to_string(),
            label: label.to_string(),
            color: Rgb::from_hex(hex).unwrap_or(Rgb::new(0x43, 0xc5, 0x9e)),
        };
        Self {
            notice_ms: 5000,
            toast_ms: 5000,
            card_groups: vec![
                group("satsuki", "さつき", "#2d9bf0"),
                group("kaede", "かえで", "#34a853"),
                group("asunaro", "あすなろ", "#fbbc04"),
                group("hiiragi", "ひいらぎ", "#a142f4"),
                group("graduate", "大学院", "#ff9800"),
                group("kenkyuutou", "研究棟", "#00acc1"),
                group("toshokan", "図書館", "#6d4c41"),
                group("outside", "屋外", "#e84545"),
            ],
            categories: vec![
                category("イベント", "Events", "#e74c3c"),
                category("体験", "Activities", "#f1c40f"),
                category("展示", "Exhibitions", "#3498db"),
                category("食べ物", "Food", "#ff9800"),
                category("場所", "Places", "#43c59e"),
                category("交通", "Transport", "#9b59b6"),
                category("ライブ", "Live Shows", "#e91e63"),
            ],
            default_category: "場所".to_string(),
            default_marker_color: Rgb::new(0x43, 0xc5, 0x9e),
            default_minimap_color: Rgb::new(0x2d, 0x9b, 0xf0),
        }
    }
}

impl PresentationConfig {
    pub fn card_group(&self, slug: &str) -> Option<&CardGroup> {
        self.card_groups.iter().find(|g| g.slug == slug)
    }

    pub fn category_color(&self, category: &str) -> Rgb {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.color)
            .unwrap_or(self.default_marker_color)
    }

    pub fn minimap_color(&self, slug: &str) -> Rgb {
        self.card_group(slug)
            .map(|g| g.style.color)
            .unwrap_or(self.default_minimap_color)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    pub assets: AssetLayout,
    pub ordering: OrderingConfig,
    pub viewer: ViewerConfig,
    pub map: MapConfig,
    pub presentation: PresentationConfig,
}

impl TourConfig {
    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: TourConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewer;
        if !(v.min_hfov.is_finite() && v.max_hfov.is_finite()) || v.min_hfov > v.max_hfov {
            return Err(ConfigError::Invalid {
                key: "viewer.min_hfov".to_string(),
                reason: format!("must not exceed max_hfov ({})", v.max_hfov),
            });
        }
        if !v.autorotate_deg_per_sec.is_finite() {
            return Err(ConfigError::Invalid {
                key: "viewer.autorotate_deg_per_sec".to_string(),
                reason: "must be finite".to_string(),
            });
        }
        if self.assets.root.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "assets.root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl ConfigSource {
    /// Higher wins.
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
        }
    }
}

/// A [`TourConfig`] plus the source of every section or overridden key.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: TourConfig,
    sources: BTreeMap<String, ConfigSource>,
}

const SECTIONS: &[&str] = &["assets", "ordering", "viewer", "map", "presentation"];

impl LayeredConfig {
    pub fn with_defaults() -> Self {
        Self {
            config: TourConfig::default(),
            sources: BTreeMap::new(),
        }
    }

    /// Overlay sections present in a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table: toml::Table = toml::from_str(&content)?;
        self.config = TourConfig::from_toml_str(&content)?;
        for section in SECTIONS {
            if table.contains_key(*section) {
                self.set_source(section, ConfigSource::File);
            }
        }
        tracing::debug!(path = %path.display(), "loaded tour config file");
        Ok(self)
    }

    /// Apply `CAMPUS_TOUR_*` environment overrides.
    pub fn load_from_env(self) -> Self {
        self.load_from_vars(|key| env::var(key).ok())
    }

    fn load_from_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = var("CAMPUS_TOUR_ASSET_ROOT").filter(|s| !s.trim().is_empty()) {
            self.config.assets.root = root.trim().trim_end_matches('/').to_string();
            self.set_source("assets.root", ConfigSource::Environment);
        }
        if let Some(subdir) = var("CAMPUS_TOUR_DEFAULT_SUBDIR").filter(|s| !s.trim().is_empty()) {
            self.config.assets.default_subdir = subdir.trim().to_string();
            self.set_source("assets.default_subdir", ConfigSource::Environment);
        }
        if let Some(mode) = var("CAMPUS_TOUR_EMBED_MODE") {
            match mode.trim() {
                "standalone" => self.set_embed_mode(EmbedMode::Standalone),
                "embedded" => self.set_embed_mode(EmbedMode::Embedded),
                "overlay" => self.set_embed_mode(EmbedMode::Overlay),
                other => tracing::warn!("Invalid CAMPUS_TOUR_EMBED_MODE value '{other}'"),
            }
        }
        self.env_number(&var, "CAMPUS_TOUR_AUTOROTATE_SPEED", "viewer.autorotate_deg_per_sec", |c, v| {
            c.viewer.autorotate_deg_per_sec = v
        });
        self.env_number(&var, "CAMPUS_TOUR_AUTOROTATE_RESUME_MS", "viewer.autorotate_resume_ms", |c, v| {
            c.viewer.autorotate_resume_ms = v.max(0.0)
        });
        self.env_number(&var, "CAMPUS_TOUR_DEFAULT_HFOV", "viewer.default_hfov", |c, v| {
            c.viewer.default_hfov = v
        });
        self
    }

    fn set_embed_mode(&mut self, mode: EmbedMode) {
        self.config.viewer.embed_mode = mode;
        self.set_source("viewer.embed_mode", ConfigSource::Environment);
    }

    fn env_number(
        &mut self,
        var: &impl Fn(&str) -> Option<String>,
        name: &str,
        key: &str,
        apply: impl FnOnce(&mut TourConfig, f64),
    ) {
        let Some(raw) = var(name) else {
            return;
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => {
                apply(&mut self.config, v);
                self.set_source(key, ConfigSource::Environment);
            }
            _ => tracing::warn!("Invalid {name} value '{raw}': expected a number"),
        }
    }

    fn set_source(&mut self, key: &str, source: ConfigSource) {
        let current = self.source(key);
        if source.precedence() >= current.precedence() {
            self.sources.insert(key.to_string(), source);
        }
    }

    /// Source of a dotted key, falling back to its section.
    pub fn source(&self, key: &str) -> ConfigSource {
        if let Some(source) = self.sources.get(key) {
            return *source;
        }
        let section = key.split('.').next().unwrap_or(key);
        self.sources
            .get(section)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    pub fn into_config(self) -> TourConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_campus_data() {
        let c = TourConfig::default();
        assert_eq!(c.ordering.group_order.first().map(String::as_str), Some("satsuki"));
        assert_eq!(c.ordering.group_order.len(), 8);
        assert_eq!(c.viewer.clamp_hfov(200.0), 120.0);
        assert_eq!(c.viewer.clamp_hfov(10.0), 45.0);
        assert_eq!(c.presentation.category_color("体験").to_hex(), "#f1c40f");
        assert_eq!(c.presentation.category_color("unknown").to_hex(), "#43c59e");
        assert_eq!(c.presentation.minimap_color("kaede").to_hex(), "#34a853");
        assert_eq!(c.presentation.minimap_color("nope").to_hex(), "#2d9bf0");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = TourConfig::from_toml_str(
            r#"
            [viewer]
            autorotate_deg_per_sec = 1.5

            [ordering]
            group_order = ["kaede", "satsuki"]
            "#,
        );
        let c = c.unwrap_or_default();
        assert_eq!(c.viewer.autorotate_deg_per_sec, 1.5);
        assert_eq!(c.viewer.default_hfov, 110.0);
        assert_eq!(c.ordering.group_order, vec!["kaede", "satsuki"]);
        // Unlisted fields of a present section fall back to defaults too.
        assert_eq!(c.ordering.flagship_buildings.len(), 2);
        assert_eq!(c.assets.root, "images");
    }

    #[test]
    fn card_groups_parse_from_toml() {
        let c = TourConfig::from_toml_str(
            r##"
            [[presentation.card_groups]]
            slug = "library"
            label = "Library"
            color = "#112233"
            "##,
        )
        .unwrap_or_default();
        let g = c.presentation.card_group("library");
        assert_eq!(g.map(|g| g.style.color.to_hex()), Some("#112233".to_string()));
    }

    #[test]
    fn rejects_inverted_hfov_range() {
        let err = TourConfig::from_toml_str("[viewer]\nmin_hfov = 130.0\n");
        assert!(matches!(err, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn env_overrides_record_their_source() {
        let vars: HashMap<&str, &str> = [
            ("CAMPUS_TOUR_ASSET_ROOT", "assets/"),
            ("CAMPUS_TOUR_AUTOROTATE_SPEED", "2"),
            ("CAMPUS_TOUR_DEFAULT_HFOV", "wide"),
            ("CAMPUS_TOUR_EMBED_MODE", "overlay"),
        ]
        .into_iter()
        .collect();
        let layered = LayeredConfig::with_defaults()
            .load_from_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(layered.config.assets.root, "assets");
        assert_eq!(layered.config.viewer.autorotate_deg_per_sec, 2.0);
        assert_eq!(layered.config.viewer.default_hfov, 110.0);
        assert_eq!(layered.source("assets.root"), ConfigSource::Environment);
        assert_eq!(layered.source("viewer.default_hfov"), ConfigSource::Default);
        assert_eq!(layered.config.viewer.embed_mode, EmbedMode::Overlay);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = LayeredConfig::with_defaults().load_from_file("/nonexistent/tour.toml");
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }
}
