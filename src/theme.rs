use serde::{Deserialize, Serialize};

/// Visual styling shared by every diagram element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub background: String,
    /// Fill opacity of the label bars.
    pub bar_opacity: f32,
    /// Fill opacity of the flow strips.
    pub strip_opacity: f32,
}

impl Theme {
    pub fn serif() -> Self {
        Theme {
            font_family: "serif".to_string(),
            font_size: 14.0,
            text_color: "#000000".to_string(),
            background: "#ffffff".to_string(),
            bar_opacity: 0.99,
            strip_opacity: 0.65,
        }
    }

    pub fn sans_serif() -> Self {
        Theme {
            font_family: "sans-serif".to_string(),
            ..Theme::serif()
        }
    }

    pub fn monospace() -> Self {
        Theme {
            font_family: "monospace".to_string(),
            ..Theme::serif()
        }
    }

    /// Looks up a preset by name.
    pub fn by_name(name: &str) -> Option<Theme> {
        match name {
            "serif" => Some(Theme::serif()),
            "sans-serif" => Some(Theme::sans_serif()),
            "monospace" => Some(Theme::monospace()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::serif()
    }
}
