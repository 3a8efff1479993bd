use std::path::Path;

use anyhow::Result;

#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::layout::{SankeyLayout, TextAnchor};
use crate::theme::Theme;

/// Baseline offset from the vertical center, as a fraction of the font
/// size.
const BASELINE_SHIFT: f32 = 0.35;

/// Font and fill settings for one caption.
pub struct TextStyle<'a> {
    pub font_family: &'a str,
    pub font_size: f32,
    pub color: &'a str,
    pub anchor: TextAnchor,
}

/// Drawing primitives a computed layout is painted onto.
pub trait Surface {
    /// Fills a closed polygon given its outline points.
    fn fill_polygon(&mut self, points: &[(f32, f32)], color: &str, opacity: f32);

    /// Draws a single line of text; `y` is the vertical center of the
    /// line, `x` the anchor point.
    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle<'_>);
}

/// Surface that assembles a standalone SVG document.
pub struct SvgSurface {
    body: String,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32, background: &str) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let mut body = String::new();
        body.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        body.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{background}\"/>",
        ));
        SvgSurface { body }
    }

    pub fn finish(mut self) -> String {
        self.body.push_str("</svg>");
        self.body
    }
}

impl Surface for SvgSurface {
    fn fill_polygon(&mut self, points: &[(f32, f32)], color: &str, opacity: f32) {
        if points.len() < 3 {
            return;
        }
        self.body.push_str(&format!(
            "<path d=\"{}\" fill=\"{color}\" fill-opacity=\"{opacity}\"/>",
            points_to_path(points),
        ));
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle<'_>) {
        if text.is_empty() {
            return;
        }
        let anchor = match style.anchor {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        };
        let baseline_y = y + style.font_size * BASELINE_SHIFT;
        self.body.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{baseline_y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            escape_xml(style.font_family),
            style.font_size,
            style.color,
            escape_xml(text)
        ));
    }
}

/// Paints a layout onto any surface: strips first, then bars over their
/// ends, captions last.
pub fn render<S: Surface>(layout: &SankeyLayout, theme: &Theme, surface: &mut S) {
    for strip in &layout.strips {
        surface.fill_polygon(&strip.points, &strip.color, theme.strip_opacity);
    }
    for block in &layout.blocks {
        let rect = [
            (block.x, block.y),
            (block.x + block.width, block.y),
            (block.x + block.width, block.y + block.height),
            (block.x, block.y + block.height),
        ];
        surface.fill_polygon(&rect, &block.color, theme.bar_opacity);
    }
    for label in &layout.labels {
        let style = TextStyle {
            font_family: &theme.font_family,
            font_size: theme.font_size,
            color: &theme.text_color,
            anchor: label.anchor,
        };
        surface.draw_text(label.x, label.y, &label.text, &style);
    }
}

/// Renders a layout to a standalone SVG document.
pub fn render_svg(layout: &SankeyLayout, theme: &Theme) -> String {
    let mut surface = SvgSurface::new(layout.width, layout.height, &theme.background);
    render(layout, theme, &mut surface);
    surface.finish()
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    if let Some((first, rest)) = points.split_first() {
        d.push_str(&format!("M {:.2} {:.2}", first.0, first.1));
        for point in rest {
            d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
        }
        d.push_str(" Z");
    }
    d
}

/// Writes the computed geometry as pretty-printed JSON.
pub fn write_layout_json(layout: &SankeyLayout, output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(layout)?;
    std::fs::write(output, json)?;
    Ok(())
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{svg}");
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &RenderConfig,
    theme: &Theme,
) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
