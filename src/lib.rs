pub mod aggregate;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod layout;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use aggregate::{Flow, FlowTable, flow_table};
#[cfg(feature = "cli")]
pub use cli::run;
pub use color::{hue_spread_palette, resolve_colors};
pub use config::{Config, RenderConfig, SankeyConfig, load_config};
pub use error::SankeyError;
pub use input::{FlowRow, Frame, Sankey, Side};
pub use layout::{BlockLayout, LabelLayout, SankeyLayout, StripLayout, TextAnchor, compute_layout};
#[cfg(feature = "png")]
pub use render::write_output_png;
pub use render::{
    Surface, SvgSurface, TextStyle, render, render_svg, write_layout_json, write_output_svg,
};
pub use theme::Theme;
