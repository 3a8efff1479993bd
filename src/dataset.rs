use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::input::Sankey;

/// Parses a whitespace-delimited two-column pair listing, one
/// observation per line, no header. Blank lines and `#` comments are
/// skipped; every observation counts with weight one.
pub fn parse_pair_table(input: &str) -> Result<Sankey> {
    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(left), Some(right), None) = (fields.next(), fields.next(), fields.next()) else {
            bail!("line {}: expected two fields, got {line:?}", number + 1);
        };
        lefts.push(left.to_string());
        rights.push(right.to_string());
    }
    debug!(rows = lefts.len(), "parsed pair table");
    Ok(Sankey::new(lefts, rights))
}

/// Parses a comma-delimited table with a header row. The named columns
/// supply the left labels, right labels and per-row weights.
pub fn parse_weighted_table(
    input: &str,
    left_col: &str,
    right_col: &str,
    weight_col: &str,
) -> Result<Sankey> {
    let mut lines = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        bail!("missing header row");
    };
    let header_fields = split_fields(header);
    let left_idx = column_index(&header_fields, left_col)?;
    let right_idx = column_index(&header_fields, right_col)?;
    let weight_idx = column_index(&header_fields, weight_col)?;

    let mut lefts = Vec::new();
    let mut rights = Vec::new();
    let mut weights = Vec::new();
    for (number, line) in lines {
        let fields = split_fields(line);
        let row = number + 1;
        let left = fields
            .get(left_idx)
            .with_context(|| format!("line {row}: missing column {left_col:?}"))?;
        let right = fields
            .get(right_idx)
            .with_context(|| format!("line {row}: missing column {right_col:?}"))?;
        let raw_weight = fields
            .get(weight_idx)
            .with_context(|| format!("line {row}: missing column {weight_col:?}"))?;
        let weight: f32 = raw_weight
            .parse()
            .with_context(|| format!("line {row}: invalid weight {raw_weight:?}"))?;
        lefts.push(left.clone());
        rights.push(right.clone());
        weights.push(weight);
    }
    debug!(rows = lefts.len(), "parsed weighted table");
    Ok(Sankey::new(lefts, rights).weights(weights))
}

pub fn read_pair_table(path: &Path) -> Result<Sankey> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_pair_table(&contents)
}

pub fn read_weighted_table(
    path: &Path,
    left_col: &str,
    right_col: &str,
    weight_col: &str,
) -> Result<Sankey> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_weighted_table(&contents, left_col, right_col, weight_col)
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|field| field == name)
        .with_context(|| format!("column {name:?} not found in header"))
}

// Comma splitting that honors single and double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quote_char = ' ';
    for ch in line.chars() {
        match ch {
            '"' | '\'' => {
                if !in_quotes {
                    in_quotes = true;
                    quote_char = ch;
                } else if ch == quote_char {
                    in_quotes = false;
                }
                current.push(ch);
            }
            ',' if !in_quotes => {
                fields.push(strip_quotes(current.trim()));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(strip_quotes(current.trim()));
    fields
}

fn strip_quotes(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_table_counts_each_row_once() {
        let sankey = parse_pair_table("apple north\n\n# comment\nplum south\napple north\n").unwrap();
        let frame = sankey.frame().unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.rows[0].left, "apple");
        assert_eq!(frame.rows[1].right, "south");
        assert_eq!(frame.rows[0].left_weight, 1.0);
    }

    #[test]
    fn pair_table_rejects_extra_fields() {
        let err = parse_pair_table("apple north 3\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn weighted_table_reads_named_columns() {
        let input = "good,revenue,customer\nfruit,200.5,\"ACME, Inc\"\nwine,80,Bob\n";
        let sankey = parse_weighted_table(input, "customer", "good", "revenue").unwrap();
        let frame = sankey.frame().unwrap();
        assert_eq!(frame.rows[0].left, "ACME, Inc");
        assert_eq!(frame.rows[0].right, "fruit");
        assert_eq!(frame.rows[0].left_weight, 200.5);
        assert_eq!(frame.rows[1].left, "Bob");
        assert_eq!(frame.rows[1].right_weight, 80.0);
    }

    #[test]
    fn weighted_table_requires_known_columns() {
        let err = parse_weighted_table("a,b\n1,2\n", "a", "b", "missing").unwrap_err();
        assert!(err.to_string().contains("\"missing\""));
    }

    #[test]
    fn weighted_table_rejects_unparsable_weights() {
        let input = "left,right,weight\na,x,not-a-number\n";
        let err = parse_weighted_table(input, "left", "right", "weight").unwrap_err();
        assert!(err.to_string().contains("invalid weight"));
    }

    #[test]
    fn split_fields_honors_quotes() {
        assert_eq!(
            split_fields("plain,\"with, comma\",'single'"),
            vec!["plain", "with, comma", "single"]
        );
    }
}
