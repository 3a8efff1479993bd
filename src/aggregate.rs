use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::SankeyError;
use crate::input::{Frame, Side};

/// Aggregated weight of one (left, right) label pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub left: String,
    pub right: String,
    pub left_weight: f32,
    pub right_weight: f32,
}

/// Tallies derived from a frame: column orders, per-label totals and
/// the flow list in stacking order (left label major, right minor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    pub left_labels: Vec<String>,
    pub right_labels: Vec<String>,
    pub left_totals: BTreeMap<String, f32>,
    pub right_totals: BTreeMap<String, f32>,
    pub flows: Vec<Flow>,
}

impl FlowTable {
    /// Every label in display order, left column first. A label that
    /// appears on both sides is listed once.
    pub fn all_labels(&self) -> Vec<String> {
        let mut labels = self.left_labels.clone();
        for label in &self.right_labels {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Groups frame rows by label pair and tallies per-side totals.
///
/// Column order is first appearance in the data unless an explicit
/// order is given, in which case its label set must match the data.
pub fn flow_table(
    frame: &Frame,
    left_order: Option<&[String]>,
    right_order: Option<&[String]>,
) -> Result<FlowTable, SankeyError> {
    let mut left_labels = Vec::new();
    let mut right_labels = Vec::new();
    for row in &frame.rows {
        if !left_labels.contains(&row.left) {
            left_labels.push(row.left.clone());
        }
        if !right_labels.contains(&row.right) {
            right_labels.push(row.right.clone());
        }
    }

    // An empty explicit order means "derive from the data".
    if let Some(order) = left_order.filter(|order| !order.is_empty()) {
        check_labels(Side::Left, order, &left_labels)?;
        left_labels = order.to_vec();
    }
    if let Some(order) = right_order.filter(|order| !order.is_empty()) {
        check_labels(Side::Right, order, &right_labels)?;
        right_labels = order.to_vec();
    }
    debug!(labels = ?left_labels, "left column order");
    debug!(labels = ?right_labels, "right column order");

    let mut left_totals: BTreeMap<String, f32> = BTreeMap::new();
    let mut right_totals: BTreeMap<String, f32> = BTreeMap::new();
    let mut pair_sums: BTreeMap<(String, String), (f32, f32)> = BTreeMap::new();
    for row in &frame.rows {
        *left_totals.entry(row.left.clone()).or_insert(0.0) += row.left_weight;
        *right_totals.entry(row.right.clone()).or_insert(0.0) += row.right_weight;
        let sums = pair_sums
            .entry((row.left.clone(), row.right.clone()))
            .or_insert((0.0, 0.0));
        sums.0 += row.left_weight;
        sums.1 += row.right_weight;
    }

    // Zero-weight pairs stay: an observed pair renders as a degenerate
    // strip rather than disappearing.
    let mut flows = Vec::with_capacity(pair_sums.len());
    for left in &left_labels {
        for right in &right_labels {
            if let Some(&(left_weight, right_weight)) =
                pair_sums.get(&(left.clone(), right.clone()))
            {
                flows.push(Flow {
                    left: left.clone(),
                    right: right.clone(),
                    left_weight,
                    right_weight,
                });
            }
        }
    }

    Ok(FlowTable {
        left_labels,
        right_labels,
        left_totals,
        right_totals,
        flows,
    })
}

fn check_labels(side: Side, provided: &[String], observed: &[String]) -> Result<(), SankeyError> {
    let provided_set: BTreeSet<&str> = provided.iter().map(String::as_str).collect();
    let observed_set: BTreeSet<&str> = observed.iter().map(String::as_str).collect();
    if provided_set == observed_set {
        return Ok(());
    }
    // Long label sets are elided from the message.
    let mut detail = String::new();
    if provided.len() <= 20 {
        detail.push_str("\nlabels: ");
        detail.push_str(&provided.join(", "));
    }
    if observed_set.len() <= 20 {
        detail.push_str("\ndata: ");
        let observed: Vec<&str> = observed_set.into_iter().collect();
        detail.push_str(&observed.join(", "));
    }
    Err(SankeyError::LabelMismatch { side, detail })
}
