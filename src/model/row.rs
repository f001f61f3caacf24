//! Row model.

use super::{Cell, CellValue};
use serde::Serialize;

/// A worksheet row as it appears in the sheet data.
///
/// Rows are sparse: only cells present in the worksheet are listed, in
/// document order. Missing columns are not back-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    /// 1-based row number from the `r` attribute, when present
    #[serde(rename = "nr", skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Cells in document order
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create an empty row.
    pub fn new(index: Option<u32>) -> Self {
        Self {
            index,
            cells: Vec::new(),
        }
    }

    /// Check if the row has no cells.
    ///
    /// A row whose cells all hold empty values is not empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Append a cell.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Display values of the cells, in order.
    pub fn display_values(&self, float_comma: bool) -> Vec<String> {
        self.cells
            .iter()
            .map(|c| c.display_value(float_comma))
            .collect()
    }

    /// Values placed at their column positions, gaps filled with `Empty`.
    ///
    /// Cells without a parseable address are placed after the previous cell.
    pub fn dense_values(&self) -> Vec<CellValue> {
        let mut values: Vec<CellValue> = Vec::new();
        for cell in &self.cells {
            let column = cell
                .address
                .map(|a| a.column as usize)
                .unwrap_or(values.len());
            if column >= values.len() {
                values.resize(column + 1, CellValue::Empty);
            }
            values[column] = cell.value.clone();
        }
        values
    }
}
