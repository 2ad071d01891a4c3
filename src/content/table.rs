//! Table matrix parsing
//!
//! The extraction service ships `cell_matrix` either as a JSON array of rows
//! or as a string holding that JSON. Cells may be plain scalars or objects
//! carrying a `text` field.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TableParseError {
    #[error("cell matrix is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cell matrix must be an array of rows, got {0}")]
    NotRows(&'static str),

    #[error("row {row} of cell matrix is not an array")]
    BadRow { row: usize },
}

/// Rectangular grid of cell texts
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
    /// Number of leading header rows
    pub header_rows: usize,
    /// Number of leading header columns
    pub header_cols: usize,
}

impl TableGrid {
    /// Parse a raw matrix. Header bounds are inclusive indices, negative for none.
    pub fn parse(
        matrix: &Value,
        last_header_row: i64,
        last_header_col: i64,
    ) -> Result<Self, TableParseError> {
        let decoded;
        let matrix = match matrix {
            Value::String(s) if s.trim().is_empty() => return Ok(Self::default()),
            Value::String(s) => {
                decoded = serde_json::from_str::<Value>(s)?;
                &decoded
            }
            other => other,
        };

        let rows = match matrix {
            Value::Null => return Ok(Self::default()),
            Value::Array(rows) => rows,
            other => return Err(TableParseError::NotRows(json_kind(other))),
        };

        let mut grid: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                Value::Array(cells) => Ok(cells.iter().map(cell_text).collect()),
                _ => Err(TableParseError::BadRow { row }),
            })
            .collect::<Result<_, _>>()?;

        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, String::new());
        }

        Ok(Self {
            header_rows: header_span(last_header_row, grid.len()),
            header_cols: header_span(last_header_col, width),
            rows: grid,
        })
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn header(&self) -> &[Vec<String>] {
        &self.rows[..self.header_rows]
    }

    #[must_use]
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[self.header_rows..]
    }
}

fn header_span(last_index: i64, limit: usize) -> usize {
    if last_index < 0 {
        0
    } else {
        usize::try_from(last_index + 1).map_or(limit, |n| n.min(limit))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.get("text").map(cell_text).unwrap_or_default(),
        Value::Array(parts) => parts
            .iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_array_of_rows_and_pads_short_rows() {
        let matrix = json!([["Item", "Qty", "Price"], ["Widget", 2], [null, "1", 9.5]]);
        let grid = TableGrid::parse(&matrix, 0, -1).unwrap();

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.rows[1], vec!["Widget", "2", ""]);
        assert_eq!(grid.rows[2], vec!["", "1", "9.5"]);
        assert_eq!(grid.header().len(), 1);
        assert_eq!(grid.body().len(), 2);
        assert_eq!(grid.header_cols, 0);
    }

    #[test]
    fn parses_json_encoded_string() {
        let matrix = Value::String(r#"[[{"text":"a"},{"text":"b"}],["c","d"]]"#.to_string());
        let grid = TableGrid::parse(&matrix, -1, 0).unwrap();

        assert_eq!(grid.rows, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(grid.header_rows, 0);
        assert_eq!(grid.header_cols, 1);
    }

    #[test]
    fn header_bounds_are_clamped_to_grid() {
        let matrix = json!([["a"], ["b"]]);
        let grid = TableGrid::parse(&matrix, 10, 10).unwrap();
        assert_eq!(grid.header_rows, 2);
        assert_eq!(grid.header_cols, 1);
        assert!(grid.body().is_empty());
    }

    #[test]
    fn empty_inputs_give_empty_grid() {
        assert_eq!(TableGrid::parse(&Value::Null, 0, 0).unwrap(), TableGrid::default());
        assert_eq!(
            TableGrid::parse(&Value::String("  ".into()), 0, 0).unwrap(),
            TableGrid::default()
        );
    }

    #[test]
    fn rejects_non_row_shapes() {
        assert!(matches!(
            TableGrid::parse(&json!({"a": 1}), 0, 0),
            Err(TableParseError::NotRows("object"))
        ));
        assert!(matches!(
            TableGrid::parse(&json!([["a"], "b"]), 0, 0),
            Err(TableParseError::BadRow { row: 1 })
        ));
        assert!(matches!(
            TableGrid::parse(&Value::String("[[".into()), 0, 0),
            Err(TableParseError::Json(_))
        ));
    }
}
