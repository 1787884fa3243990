// src/config.rs

//! Configuration structures for the orb engine and demo driver.
//!
//! The structs deserialize from a JSON configuration file and every field
//! carries a sensible default, so an empty object (or no file at all) is a
//! valid configuration. The global [`CONFIG`] is resolved once, from the
//! path in `ORB_CONFIG` when set, falling back to the defaults.

use crate::color::{Rgba, Theme};
use crate::shader::{LiquidMetalParams, MeshGradientParams, ShaderKind};

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Global configuration, loaded lazily on first use.
pub static CONFIG: Lazy<OrbConfig> = Lazy::new(OrbConfig::load_or_default);

/// Root configuration for one orb instance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrbConfig {
    /// Surface dimensions and theme.
    pub appearance: AppearanceConfig,
    /// Directive name run once at mount. Unknown names are ignored.
    /// Recognized: the gesture names (`rotate45`, `rotate45Center`,
    /// `rotate45External`, `rotate45Middle`, `explode`, `spin`, `reset`)
    /// plus `stopLoading` and `idle`.
    pub initial_gesture: Option<String>,
    /// Optional shader description. When present the engine composites the
    /// shader through the figure silhouette; when absent it draws the
    /// figure directly.
    pub shader: Option<ShaderConfig>,
}

impl OrbConfig {
    /// Loads the configuration from the file named by `ORB_CONFIG`, or
    /// returns the defaults. A present-but-broken file logs a warning and
    /// falls back to defaults rather than failing startup.
    pub fn load_or_default() -> Self {
        let Ok(path) = std::env::var("ORB_CONFIG") else {
            return OrbConfig::default();
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!("could not read config file {}: {}; using defaults", path, err);
                return OrbConfig::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                warn!("could not parse config file {}: {}; using defaults", path, err);
                OrbConfig::default()
            }
        }
    }
}

/// Surface dimensions and theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Drawing surface width in pixels.
    pub width: u32,
    /// Drawing surface height in pixels.
    pub height: u32,
    /// Selects the base stroke/fill color.
    pub theme: Theme,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            width: 360,
            height: 360,
            theme: Theme::Dark,
        }
    }
}

/// Shader description, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShaderConfig {
    MeshGradient(MeshGradientConfig),
    LiquidMetal(LiquidMetalConfig),
}

impl ShaderConfig {
    /// Resolves the configured colors into generator parameters. Colors
    /// that fail to parse are dropped with a warning; a mesh gradient left
    /// with no valid colors falls back to its default palette.
    pub fn to_kind(&self) -> ShaderKind {
        match self {
            ShaderConfig::MeshGradient(config) => {
                let mut colors: Vec<Rgba> = config
                    .colors
                    .iter()
                    .filter_map(|hex| {
                        let parsed = Rgba::from_hex(hex);
                        if parsed.is_none() {
                            warn!("mesh-gradient: dropping unparseable color {:?}", hex);
                        }
                        parsed
                    })
                    .collect();
                if colors.is_empty() {
                    warn!("mesh-gradient: no usable colors configured; using defaults");
                    colors = MeshGradientParams::default().colors;
                }
                ShaderKind::MeshGradient(MeshGradientParams {
                    colors,
                    distortion: config.distortion,
                    swirl: config.swirl,
                    speed: config.speed,
                })
            }
            ShaderConfig::LiquidMetal(config) => {
                let tint = parse_or_white(&config.color_tint);
                let back = config
                    .color_back
                    .as_deref()
                    .map(parse_or_white)
                    .unwrap_or(tint);
                ShaderKind::LiquidMetal(LiquidMetalParams {
                    color_back: back,
                    color_tint: tint,
                    repetition: config.repetition,
                    softness: config.softness,
                    shift_red: config.shift_red,
                    shift_blue: config.shift_blue,
                    distortion: config.distortion,
                    contour: config.contour,
                    speed: config.speed,
                })
            }
        }
    }
}

fn parse_or_white(hex: &str) -> Rgba {
    Rgba::from_hex(hex).unwrap_or_else(|| {
        warn!("liquid-metal: unparseable color {:?}; using white", hex);
        Rgba::WHITE
    })
}

/// Mesh-gradient shader settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshGradientConfig {
    /// Hex colors blended across the gradient.
    pub colors: Vec<String>,
    pub distortion: f64,
    pub swirl: f64,
    pub speed: f64,
}

impl Default for MeshGradientConfig {
    fn default() -> Self {
        MeshGradientConfig {
            colors: vec![
                "#ffffff".to_string(),
                "#a3a3a3".to_string(),
                "#e5e5e5".to_string(),
            ],
            distortion: 0.9,
            swirl: 0.6,
            speed: 0.2,
        }
    }
}

/// Liquid-metal shader settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiquidMetalConfig {
    /// Background color. Defaults to the tint when absent.
    pub color_back: Option<String>,
    pub color_tint: String,
    pub repetition: f64,
    pub softness: f64,
    pub shift_red: f64,
    pub shift_blue: f64,
    pub distortion: f64,
    pub contour: f64,
    pub speed: f64,
}

impl Default for LiquidMetalConfig {
    fn default() -> Self {
        LiquidMetalConfig {
            color_back: None,
            color_tint: "#ffffff".to_string(),
            repetition: 4.0,
            softness: 0.3,
            shift_red: 0.3,
            shift_blue: 0.3,
            distortion: 0.1,
            contour: 1.0,
            speed: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_a_valid_config() {
        let config: OrbConfig = serde_json::from_str("{}").expect("defaults apply");
        assert_eq!(config.appearance.width, 360);
        assert_eq!(config.appearance.height, 360);
        assert_eq!(config.appearance.theme, Theme::Dark);
        assert!(config.initial_gesture.is_none());
        assert!(config.shader.is_none());
    }

    #[test]
    fn parses_a_mesh_gradient_shader_block() {
        let text = r##"{
            "appearance": { "width": 200, "height": 200, "theme": "light" },
            "initial_gesture": "explode",
            "shader": { "type": "mesh-gradient", "colors": ["#112233"], "speed": 0.5 }
        }"##;
        let config: OrbConfig = serde_json::from_str(text).expect("valid config");
        assert_eq!(config.appearance.theme, Theme::Light);
        assert_eq!(config.initial_gesture.as_deref(), Some("explode"));
        let Some(ShaderConfig::MeshGradient(mesh)) = &config.shader else {
            panic!("expected mesh-gradient shader");
        };
        assert_eq!(mesh.colors, vec!["#112233".to_string()]);
        assert_eq!(mesh.speed, 0.5);
        // Unspecified fields keep their defaults.
        assert_eq!(mesh.swirl, 0.6);
    }

    #[test]
    fn liquid_metal_back_color_defaults_to_tint() {
        let text = r##"{ "type": "liquid-metal", "color_tint": "#336699" }"##;
        let config: ShaderConfig = serde_json::from_str(text).expect("valid shader");
        let ShaderKind::LiquidMetal(params) = config.to_kind() else {
            panic!("expected liquid-metal params");
        };
        assert_eq!(params.color_tint, Rgba::opaque(0x33, 0x66, 0x99));
        assert_eq!(params.color_back, params.color_tint);
    }

    #[test]
    fn mesh_gradient_drops_bad_colors_but_keeps_good_ones() {
        let config = MeshGradientConfig {
            colors: vec!["nonsense".to_string(), "#00ff00".to_string()],
            ..Default::default()
        };
        let ShaderKind::MeshGradient(params) = ShaderConfig::MeshGradient(config).to_kind() else {
            panic!("expected mesh-gradient params");
        };
        assert_eq!(params.colors, vec![Rgba::opaque(0, 255, 0)]);
    }
}
