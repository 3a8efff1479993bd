use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::aggregate::FlowTable;
use crate::config::SankeyConfig;
use crate::input::Side;
use crate::text_metrics::text_width;
use crate::theme::Theme;

const FALLBACK_COLOR: &str = "#808080";

/// One label bar, in absolute pixel coordinates (y grows downward).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockLayout {
    pub side: Side,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Aggregated weight backing this block.
    pub total: f32,
    pub color: String,
}

/// One flow polygon connecting a band on the left column to a band on
/// the right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripLayout {
    pub left: String,
    pub right: String,
    pub left_weight: f32,
    pub right_weight: f32,
    pub left_top: f32,
    pub left_bottom: f32,
    pub right_top: f32,
    pub right_bottom: f32,
    pub color: String,
    /// Closed outline: smoothed top edge, then the bottom edge reversed.
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAnchor {
    Start,
    End,
}

/// A block caption, anchored at its vertical center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    pub side: Side,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<BlockLayout>,
    pub strips: Vec<StripLayout>,
    pub labels: Vec<LabelLayout>,
}

/// Positions blocks, strips and captions for an aggregated table.
///
/// Both columns share one weight-to-pixel scale taken from the taller
/// column, so equal weights occupy equal heights everywhere. The
/// shorter column is centered vertically.
pub fn compute_layout(
    table: &FlowTable,
    colors: &BTreeMap<String, String>,
    theme: &Theme,
    config: &SankeyConfig,
) -> SankeyLayout {
    let plot_width = config.height / config.aspect.max(0.01);
    let bar_width = config.bar_width_fraction * plot_width;
    let label_offset = config.label_offset_fraction * plot_width;

    let left_total: f32 = table.left_totals.values().sum();
    let right_total: f32 = table.right_totals.values().sum();
    let left_extent = column_extent(left_total, table.left_labels.len(), config.gap_fraction);
    let right_extent = column_extent(right_total, table.right_labels.len(), config.gap_fraction);
    let max_extent = left_extent.max(right_extent);
    let scale = if max_extent > 0.0 {
        config.height / max_extent
    } else {
        0.0
    };

    // Side margins make room for the widest caption plus its offset,
    // or the bar itself when captions are narrower.
    let left_inset = bar_width.max(label_offset + max_label_width(&table.left_labels, theme));
    let right_inset = bar_width.max(label_offset + max_label_width(&table.right_labels, theme));
    let x0 = config.padding + left_inset;
    let x1 = x0 + plot_width;
    let width = x1 + right_inset + config.padding;
    let height = config.height + 2.0 * config.padding;
    debug!(scale, plot_width, width, height, "diagram frame");

    let mut blocks = Vec::new();
    let mut labels = Vec::new();
    let mut band_tops: BTreeMap<(Side, &str), f32> = BTreeMap::new();

    let columns = [
        (
            Side::Left,
            &table.left_labels,
            &table.left_totals,
            left_extent,
            x0 - bar_width,
            x0 - label_offset,
            TextAnchor::End,
        ),
        (
            Side::Right,
            &table.right_labels,
            &table.right_totals,
            right_extent,
            x1,
            x1 + label_offset,
            TextAnchor::Start,
        ),
    ];
    for (side, column, totals, extent, bar_x, label_x, anchor) in columns {
        let total: f32 = totals.values().sum();
        let gap = config.gap_fraction * total * scale;
        let mut cursor = config.padding + (config.height - extent * scale) / 2.0;
        for label in column.iter() {
            let block_total = totals.get(label).copied().unwrap_or(0.0);
            let block_height = block_total * scale;
            debug!(%side, %label, y = cursor, height = block_height, "placed block");
            blocks.push(BlockLayout {
                side,
                label: label.clone(),
                x: bar_x,
                y: cursor,
                width: bar_width,
                height: block_height,
                total: block_total,
                color: fill_color(colors, label),
            });
            labels.push(LabelLayout {
                side,
                text: label.clone(),
                x: label_x,
                y: cursor + block_height / 2.0,
                anchor,
            });
            band_tops.insert((side, label.as_str()), cursor);
            cursor += block_height + gap;
        }
    }

    // Flows arrive in stacking order, so one cursor per block slices it
    // into bands top to bottom on both sides at once.
    let mut strips = Vec::with_capacity(table.flows.len());
    for flow in &table.flows {
        let left_top = band_tops
            .get(&(Side::Left, flow.left.as_str()))
            .copied()
            .unwrap_or(0.0);
        let right_top = band_tops
            .get(&(Side::Right, flow.right.as_str()))
            .copied()
            .unwrap_or(0.0);
        let left_bottom = left_top + flow.left_weight * scale;
        let right_bottom = right_top + flow.right_weight * scale;
        band_tops.insert((Side::Left, flow.left.as_str()), left_bottom);
        band_tops.insert((Side::Right, flow.right.as_str()), right_bottom);

        let color_label = if config.right_color {
            &flow.right
        } else {
            &flow.left
        };
        strips.push(StripLayout {
            left: flow.left.clone(),
            right: flow.right.clone(),
            left_weight: flow.left_weight,
            right_weight: flow.right_weight,
            left_top,
            left_bottom,
            right_top,
            right_bottom,
            color: fill_color(colors, color_label),
            points: strip_outline(
                x0,
                x1,
                left_top,
                left_bottom,
                right_top,
                right_bottom,
                config.curve_samples,
            ),
        });
    }

    SankeyLayout {
        width,
        height,
        blocks,
        strips,
        labels,
    }
}

fn column_extent(total: f32, blocks: usize, gap_fraction: f32) -> f32 {
    total * (1.0 + gap_fraction * blocks.saturating_sub(1) as f32)
}

fn max_label_width(labels: &[String], theme: &Theme) -> f32 {
    labels
        .iter()
        .map(|label| text_width(label, theme.font_size, &theme.font_family))
        .fold(0.0, f32::max)
}

fn fill_color(colors: &BTreeMap<String, String>, label: &str) -> String {
    colors
        .get(label)
        .cloned()
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// Closed strip outline. Both edges ease from their left height to
/// their right height along a cubic that is flat at the ends, so the
/// band leaves and enters the bars horizontally.
fn strip_outline(
    x0: f32,
    x1: f32,
    left_top: f32,
    left_bottom: f32,
    right_top: f32,
    right_bottom: f32,
    samples: usize,
) -> Vec<(f32, f32)> {
    let steps = samples.max(1);
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = x0 + (x1 - x0) * t;
        points.push((x, left_top + (right_top - left_top) * smoothstep(t)));
    }
    for i in (0..=steps).rev() {
        let t = i as f32 / steps as f32;
        let x = x0 + (x1 - x0) * t;
        points.push((x, left_bottom + (right_bottom - left_bottom) * smoothstep(t)));
    }
    points
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}
