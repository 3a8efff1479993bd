use thiserror::Error;

use crate::input::Side;

/// Validation failures raised before any drawing happens.
#[derive(Debug, Error)]
pub enum SankeyError {
    #[error("left and right sequences differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("{side} weight sequence has {weights} entries for {labels} labels")]
    WeightLengthMismatch {
        side: Side,
        labels: usize,
        weights: usize,
    },

    #[error("negative weight {value} at {side} row {row}")]
    NegativeWeight { side: Side, row: usize, value: f32 },

    #[error("non-finite weight at {side} row {row}")]
    NonFiniteWeight { side: Side, row: usize },

    #[error("{side} labels and data do not match.{detail}")]
    LabelMismatch { side: Side, detail: String },

    #[error("color map is missing entries for: {}", .labels.join(", "))]
    MissingColors { labels: Vec<String> },
}
