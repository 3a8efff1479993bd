use std::collections::BTreeMap;

use tracing::debug;

use crate::aggregate::FlowTable;
use crate::error::SankeyError;

const PALETTE_HUE_OFFSET: f32 = 0.01;
const PALETTE_LIGHTNESS: f32 = 0.6;
const PALETTE_SATURATION: f32 = 0.65;

/// Generates `n` fill colors with hues spread evenly around the wheel,
/// at fixed lightness and saturation, as `#rrggbb` strings.
pub fn hue_spread_palette(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32 + PALETTE_HUE_OFFSET).fract();
            let (r, g, b) = hls_to_rgb(hue, PALETTE_LIGHTNESS, PALETTE_SATURATION);
            format!("#{r:02x}{g:02x}{b:02x}")
        })
        .collect()
}

/// Maps every label in the table to a fill color.
///
/// With an explicit map the coverage must be complete; without one the
/// labels get palette colors in display order.
pub fn resolve_colors(
    table: &FlowTable,
    explicit: Option<&BTreeMap<String, String>>,
) -> Result<BTreeMap<String, String>, SankeyError> {
    let labels = table.all_labels();
    let resolved = match explicit {
        Some(map) => {
            let missing: Vec<String> = labels
                .iter()
                .filter(|label| !map.contains_key(*label))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(SankeyError::MissingColors { labels: missing });
            }
            // Extra entries are allowed and ignored.
            labels
                .iter()
                .map(|label| (label.clone(), map[label].clone()))
                .collect()
        }
        None => {
            let palette = hue_spread_palette(labels.len());
            labels.into_iter().zip(palette).collect()
        }
    };
    debug!(colors = ?resolved, "label colors");
    Ok(resolved)
}

/// Hue/lightness/saturation to RGB, all inputs in [0, 1].
fn hls_to_rgb(h: f32, l: f32, s: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = channel(l);
        return (v, v, v);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    (
        channel(hue_component(m1, m2, h + 1.0 / 3.0)),
        channel(hue_component(m1, m2, h)),
        channel(hue_component(m1, m2, h - 1.0 / 3.0)),
    )
}

fn hue_component(m1: f32, m2: f32, hue: f32) -> f32 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * 6.0 * hue
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Sankey;

    #[test]
    fn palette_starts_at_the_reference_red() {
        assert_eq!(hue_spread_palette(1), vec!["#db5f57"]);
    }

    #[test]
    fn palette_hues_are_distinct() {
        let palette = hue_spread_palette(8);
        assert_eq!(palette.len(), 8);
        let mut unique = palette.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn grey_axis_when_unsaturated() {
        assert_eq!(hls_to_rgb(0.3, 0.5, 0.0), (128, 128, 128));
    }

    #[test]
    fn default_colors_cover_all_labels() {
        let table = Sankey::new(["a", "b"], ["x", "y"]).flow_table().unwrap();
        let colors = resolve_colors(&table, None).unwrap();
        assert_eq!(colors.len(), 4);
        assert!(colors.values().all(|c| c.starts_with('#') && c.len() == 7));
    }

    #[test]
    fn shared_label_gets_one_color() {
        let table = Sankey::new(["a"], ["a"]).flow_table().unwrap();
        let colors = resolve_colors(&table, None).unwrap();
        assert_eq!(colors.len(), 1);
    }

    #[test]
    fn explicit_map_must_cover_every_label() {
        let table = Sankey::new(["a", "b"], ["x", "x"]).flow_table().unwrap();
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "#ff0000".to_string());
        map.insert("x".to_string(), "#00ff00".to_string());
        let err = resolve_colors(&table, Some(&map)).unwrap_err();
        match err {
            SankeyError::MissingColors { labels } => assert_eq!(labels, vec!["b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_map_may_carry_extras() {
        let table = Sankey::new(["a"], ["x"]).flow_table().unwrap();
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "#111111".to_string());
        map.insert("x".to_string(), "#222222".to_string());
        map.insert("unused".to_string(), "#333333".to_string());
        let colors = resolve_colors(&table, Some(&map)).unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors["a"], "#111111");
    }
}
