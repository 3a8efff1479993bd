use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::aggregate::{FlowTable, flow_table};
use crate::color::resolve_colors;
use crate::config::SankeyConfig;
use crate::error::SankeyError;
use crate::layout::{SankeyLayout, compute_layout};
use crate::render::render_svg;
use crate::theme::Theme;

/// Which column of the diagram a label or weight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// One validated observation: a left label paired with a right label,
/// plus the weight it contributes on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRow {
    pub left: String,
    pub right: String,
    pub left_weight: f32,
    pub right_weight: f32,
}

/// Row data that passed validation and is ready for aggregation.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub rows: Vec<FlowRow>,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builder for a two-column flow diagram.
///
/// Labels are paired positionally: row `i` sends weight from `left[i]`
/// to `right[i]`. Weights default to 1.0 per row, and the right weights
/// default to the left ones.
#[derive(Debug, Clone, Default)]
pub struct Sankey {
    left: Vec<String>,
    right: Vec<String>,
    left_weights: Option<Vec<f32>>,
    right_weights: Option<Vec<f32>>,
    colors: Option<BTreeMap<String, String>>,
    left_order: Option<Vec<String>>,
    right_order: Option<Vec<String>>,
}

impl Sankey {
    pub fn new<L, R>(left: L, right: R) -> Self
    where
        L: IntoIterator,
        L::Item: ToString,
        R: IntoIterator,
        R::Item: ToString,
    {
        Sankey {
            left: left.into_iter().map(|l| l.to_string()).collect(),
            right: right.into_iter().map(|r| r.to_string()).collect(),
            ..Sankey::default()
        }
    }

    /// Sets the per-row weights. The right side follows these unless
    /// [`Sankey::right_weights`] overrides it.
    pub fn weights<I: IntoIterator<Item = f32>>(self, weights: I) -> Self {
        self.left_weights(weights)
    }

    pub fn left_weights<I: IntoIterator<Item = f32>>(mut self, weights: I) -> Self {
        self.left_weights = Some(weights.into_iter().collect());
        self
    }

    pub fn right_weights<I: IntoIterator<Item = f32>>(mut self, weights: I) -> Self {
        self.right_weights = Some(weights.into_iter().collect());
        self
    }

    /// Assigns a fill color to one label.
    pub fn color(mut self, label: impl ToString, color: impl Into<String>) -> Self {
        self.colors
            .get_or_insert_with(BTreeMap::new)
            .insert(label.to_string(), color.into());
        self
    }

    /// Replaces the whole label-to-color map. When any map is set it
    /// must cover every label in the data.
    pub fn colors(mut self, colors: BTreeMap<String, String>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Fixes the top-to-bottom order of the left column. The set of
    /// labels must match the data exactly.
    pub fn left_order<I>(mut self, order: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.left_order = Some(order.into_iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn right_order<I>(mut self, order: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.right_order = Some(order.into_iter().map(|l| l.to_string()).collect());
        self
    }

    /// Validates lengths and weights and resolves the per-row values.
    pub fn frame(&self) -> Result<Frame, SankeyError> {
        if self.left.len() != self.right.len() {
            return Err(SankeyError::LengthMismatch {
                left: self.left.len(),
                right: self.right.len(),
            });
        }
        if let Some(weights) = &self.left_weights {
            if weights.len() != self.left.len() {
                return Err(SankeyError::WeightLengthMismatch {
                    side: Side::Left,
                    labels: self.left.len(),
                    weights: weights.len(),
                });
            }
        }
        if let Some(weights) = &self.right_weights {
            if weights.len() != self.right.len() {
                return Err(SankeyError::WeightLengthMismatch {
                    side: Side::Right,
                    labels: self.right.len(),
                    weights: weights.len(),
                });
            }
        }

        let mut rows = Vec::with_capacity(self.left.len());
        for row in 0..self.left.len() {
            let left_weight = match &self.left_weights {
                Some(weights) => checked_weight(weights[row], Side::Left, row)?,
                None => 1.0,
            };
            let right_weight = match &self.right_weights {
                Some(weights) => checked_weight(weights[row], Side::Right, row)?,
                None => left_weight,
            };
            rows.push(FlowRow {
                left: self.left[row].clone(),
                right: self.right[row].clone(),
                left_weight,
                right_weight,
            });
        }
        Ok(Frame { rows })
    }

    /// Aggregates the rows into per-label totals and flows.
    pub fn flow_table(&self) -> Result<FlowTable, SankeyError> {
        let frame = self.frame()?;
        flow_table(
            &frame,
            self.left_order.as_deref(),
            self.right_order.as_deref(),
        )
    }

    /// Runs validation, aggregation and layout, producing the final
    /// geometry in pixel coordinates.
    pub fn layout(
        &self,
        theme: &Theme,
        config: &SankeyConfig,
    ) -> Result<SankeyLayout, SankeyError> {
        let table = self.flow_table()?;
        let colors = resolve_colors(&table, self.colors.as_ref())?;
        Ok(compute_layout(&table, &colors, theme, config))
    }

    /// Renders the diagram to a standalone SVG document.
    pub fn to_svg(&self, theme: &Theme, config: &SankeyConfig) -> Result<String, SankeyError> {
        let layout = self.layout(theme, config)?;
        Ok(render_svg(&layout, theme))
    }
}

fn checked_weight(value: f32, side: Side, row: usize) -> Result<f32, SankeyError> {
    if !value.is_finite() {
        return Err(SankeyError::NonFiniteWeight { side, row });
    }
    if value < 0.0 {
        return Err(SankeyError::NegativeWeight { side, row, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_defaults_weights_to_ones() {
        let frame = Sankey::new(["a", "b"], ["x", "y"]).frame().unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows[0].left_weight, 1.0);
        assert_eq!(frame.rows[0].right_weight, 1.0);
    }

    #[test]
    fn right_weights_follow_left_when_absent() {
        let frame = Sankey::new(["a", "b"], ["x", "y"])
            .weights([2.0, 3.0])
            .frame()
            .unwrap();
        assert_eq!(frame.rows[0].right_weight, 2.0);
        assert_eq!(frame.rows[1].right_weight, 3.0);
    }

    #[test]
    fn right_weights_can_differ_from_left() {
        let frame = Sankey::new(["a"], ["x"])
            .left_weights([2.0])
            .right_weights([5.0])
            .frame()
            .unwrap();
        assert_eq!(frame.rows[0].left_weight, 2.0);
        assert_eq!(frame.rows[0].right_weight, 5.0);
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Sankey::new(["a", "b"], ["x"]).frame().unwrap_err();
        assert!(matches!(
            err,
            SankeyError::LengthMismatch { left: 2, right: 1 }
        ));
    }

    #[test]
    fn rejects_weight_length_mismatch() {
        let err = Sankey::new(["a", "b"], ["x", "y"])
            .weights([1.0])
            .frame()
            .unwrap_err();
        assert!(matches!(
            err,
            SankeyError::WeightLengthMismatch {
                side: Side::Left,
                labels: 2,
                weights: 1,
            }
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let err = Sankey::new(["a"], ["x"])
            .right_weights([-2.0])
            .frame()
            .unwrap_err();
        assert!(matches!(
            err,
            SankeyError::NegativeWeight {
                side: Side::Right,
                row: 0,
                ..
            }
        ));
    }

    #[test]
    fn rejects_nan_weight() {
        let err = Sankey::new(["a"], ["x"])
            .weights([f32::NAN])
            .frame()
            .unwrap_err();
        assert!(matches!(
            err,
            SankeyError::NonFiniteWeight {
                side: Side::Left,
                row: 0,
            }
        ));
    }

    #[test]
    fn numeric_labels_are_stringified() {
        let frame = Sankey::new([1, 2], [10, 20]).frame().unwrap();
        assert_eq!(frame.rows[0].left, "1");
        assert_eq!(frame.rows[1].right, "20");
    }

    #[test]
    fn empty_input_is_valid() {
        let frame = Sankey::new(Vec::<String>::new(), Vec::<String>::new())
            .frame()
            .unwrap();
        assert!(frame.is_empty());
    }
}
