//! Bounded iteration window over a table matrix

use serde::Serialize;

use super::config::{IterationCap, TableConfig};
use super::table_matrix::CellRef;

/// Row and column window of a table.
///
/// Each axis starts at its offset and spans `limit` cells; a `None` limit
/// is unbounded. Limits are already clamped by the iteration cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableBoundaries {
    pub row_offset: usize,
    pub col_offset: usize,
    pub row_limit: Option<usize>,
    pub col_limit: Option<usize>,
}

impl TableBoundaries {
    pub fn new(row_offset: usize, col_offset: usize, row_limit: Option<usize>, col_limit: Option<usize>) -> Self {
        Self { row_offset, col_offset, row_limit, col_limit }
    }

    pub fn from_config(config: &TableConfig, cap: IterationCap) -> Self {
        let cells = config.cells.unwrap_or_default();
        Self {
            row_offset: config.header_row.map(|h| h.offset).unwrap_or(0),
            col_offset: config.header_column.map(|h| h.offset).unwrap_or(0),
            row_limit: cap.clamp(cells.row_limit),
            col_limit: cap.clamp(cells.column_limit),
        }
    }

    /// Last row inside the window; `None` when unbounded or empty
    pub fn max_row(&self) -> Option<usize> {
        last_index(self.row_offset, self.row_limit)
    }

    /// Last column inside the window; `None` when unbounded or empty
    pub fn max_col(&self) -> Option<usize> {
        last_index(self.col_offset, self.col_limit)
    }

    /// Whether `cell` moved by `(rows, cols)` still lies inside the window
    pub fn contains(&self, cell: CellRef, shift: (isize, isize)) -> bool {
        let Some(row) = cell.row.checked_add_signed(shift.0) else {
            return false;
        };
        let Some(col) = cell.col.checked_add_signed(shift.1) else {
            return false;
        };
        axis_contains(row, self.row_offset, self.row_limit) && axis_contains(col, self.col_offset, self.col_limit)
    }
}

fn last_index(offset: usize, limit: Option<usize>) -> Option<usize> {
    limit.filter(|l| *l > 0).map(|l| offset + l - 1)
}

fn axis_contains(value: usize, offset: usize, limit: Option<usize>) -> bool {
    value >= offset && limit.is_none_or(|limit| value - offset < limit)
}
