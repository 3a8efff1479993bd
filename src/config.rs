use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Geometry knobs for the diagram layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyConfig {
    /// Vertical extent of the taller column per unit of strip width.
    pub aspect: f32,
    /// Canvas height in pixels given to the taller column.
    pub height: f32,
    /// Gap between adjacent blocks, as a fraction of the column total.
    pub gap_fraction: f32,
    /// Label bar width, as a fraction of the strip span.
    pub bar_width_fraction: f32,
    /// Distance from bar to label anchor, as a fraction of the strip span.
    pub label_offset_fraction: f32,
    /// Points sampled along each strip edge.
    pub curve_samples: usize,
    /// Blank margin around the whole drawing.
    pub padding: f32,
    /// Color strips by their right-hand label instead of the left.
    pub right_color: bool,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        SankeyConfig {
            aspect: 4.0,
            height: 480.0,
            gap_fraction: 0.0,
            bar_width_fraction: 0.02,
            label_offset_fraction: 0.05,
            curve_samples: 60,
            padding: 8.0,
            right_color: false,
        }
    }
}

impl SankeyConfig {
    /// Spacing preset that separates adjacent blocks by 2% of the
    /// column total.
    pub fn classic() -> Self {
        SankeyConfig {
            gap_fraction: 0.02,
            ..SankeyConfig::default()
        }
    }
}

/// Rasterization settings for PNG output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub sankey: SankeyConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
    bar_opacity: Option<f32>,
    strip_opacity: Option<f32>,
    aspect: Option<f32>,
    height: Option<f32>,
    gap_fraction: Option<f32>,
    bar_width_fraction: Option<f32>,
    label_offset_fraction: Option<f32>,
    curve_samples: Option<usize>,
    padding: Option<f32>,
    right_color: Option<bool>,
    render_width: Option<f32>,
    render_height: Option<f32>,
}

/// Reads a JSON config file, with absent keys keeping their defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(name) = parsed.theme.as_deref() {
        if let Some(theme) = Theme::by_name(name) {
            config.theme = theme;
        } else {
            anyhow::bail!("unknown theme {name:?}");
        }
    }
    if let Some(v) = parsed.font_family {
        config.theme.font_family = v;
    }
    if let Some(v) = parsed.font_size {
        config.theme.font_size = v;
    }
    if let Some(v) = parsed.text_color {
        config.theme.text_color = v;
    }
    if let Some(v) = parsed.background {
        config.theme.background = v;
    }
    if let Some(v) = parsed.bar_opacity {
        config.theme.bar_opacity = v;
    }
    if let Some(v) = parsed.strip_opacity {
        config.theme.strip_opacity = v;
    }
    if let Some(v) = parsed.aspect {
        config.sankey.aspect = v;
    }
    if let Some(v) = parsed.height {
        config.sankey.height = v;
    }
    if let Some(v) = parsed.gap_fraction {
        config.sankey.gap_fraction = v;
    }
    if let Some(v) = parsed.bar_width_fraction {
        config.sankey.bar_width_fraction = v;
    }
    if let Some(v) = parsed.label_offset_fraction {
        config.sankey.label_offset_fraction = v;
    }
    if let Some(v) = parsed.curve_samples {
        config.sankey.curve_samples = v;
    }
    if let Some(v) = parsed.padding {
        config.sankey.padding = v;
    }
    if let Some(v) = parsed.right_color {
        config.sankey.right_color = v;
    }
    if let Some(v) = parsed.render_width {
        config.render.width = v;
    }
    if let Some(v) = parsed.render_height {
        config.render.height = v;
    }

    Ok(config)
}
