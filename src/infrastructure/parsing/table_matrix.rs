//! Visual grid of an HTML table
//!
//! Program tables often use `rowspan`/`colspan` to merge a movie title over
//! several days or a day over several screenings. The builder lays the
//! physical cells out on the visual grid so that `(row, col)` addresses
//! what a visitor actually sees.

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{CellContent, MatrixOptions};
use super::context::ParsingContext;
use super::dom::{inner_markup, row_cells, span_attr, table_rows, text_content};
use super::table_boundaries::TableBoundaries;
use super::{ContextualParser, ParsingResult};

/// Zero-based position on the visual grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Dense, row-major cell grid; positions no cell covers hold `""`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMatrix {
    rows: Vec<Vec<String>>,
    column_count: usize,
}

impl TableMatrix {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn get(&self, cell: CellRef) -> Option<&str> {
        self.rows.get(cell.row)?.get(cell.col).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, col: usize) -> Option<Vec<&str>> {
        if col >= self.column_count {
            return None;
        }
        Some(self.rows.iter().map(|row| row[col].as_str()).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Visit every cell inside `boundaries` in row-major order.
    ///
    /// Each call gets its own branch of `context` with `indexes.row`,
    /// `indexes.col` and the `cell` variable set. Iteration stops at the
    /// first row or column the boundaries exclude.
    pub fn walk<F>(&self, boundaries: &TableBoundaries, context: &ParsingContext, mut visit: F) -> usize
    where
        F: FnMut(CellRef, &str, &mut ParsingContext),
    {
        let mut visited = 0;
        let mut row = boundaries.row_offset;
        while row < self.row_count() {
            let row_start = CellRef::new(row, boundaries.col_offset);
            if !boundaries.contains(row_start, (0, 0)) {
                break;
            }

            let mut col = boundaries.col_offset;
            while col < self.column_count {
                let cell = CellRef::new(row, col);
                let content = self.rows[row][col].as_str();

                let mut cell_context = context.branch();
                cell_context.set_index("row", row);
                cell_context.set_index("col", col);
                cell_context.set_var("cell", content);
                visit(cell, content, &mut cell_context);
                visited += 1;

                if !boundaries.contains(cell, (0, 1)) {
                    break;
                }
                col += 1;
            }

            if !boundaries.contains(row_start, (1, 0)) {
                break;
            }
            row += 1;
        }
        debug!("Walked {} table cells", visited);
        visited
    }
}

/// Builds [`TableMatrix`] values from table rows
#[derive(Debug, Clone, Copy, Default)]
pub struct TableMatrixBuilder {
    options: MatrixOptions,
}

impl TableMatrixBuilder {
    pub fn new(options: MatrixOptions) -> Self {
        Self { options }
    }

    /// Lay `rows` out on the visual grid.
    ///
    /// `on_cell` fires once per primary cell, in document order. A `rowspan`
    /// reaching past the last row is cut at the last row.
    pub fn build<'a, I, F>(&self, rows: I, mut on_cell: F) -> TableMatrix
    where
        I: IntoIterator<Item = ElementRef<'a>>,
        F: FnMut(CellRef, ElementRef<'a>),
    {
        let rows: Vec<ElementRef<'a>> = rows.into_iter().collect();
        let mut grid = Grid::default();

        for (row, tr) in rows.iter().enumerate() {
            grid.ensure_row(row);
            let mut col = 0;
            for td in row_cells(*tr) {
                while grid.occupied(row, col) {
                    col += 1;
                }

                let rowspan = span_attr(td, "rowspan").min(rows.len() - row);
                let colspan = span_attr(td, "colspan");
                let content = self.content(td);
                on_cell(CellRef::new(row, col), td);

                for y in 0..rowspan {
                    for x in 0..colspan {
                        let value = match (y, x) {
                            (0, 0) => content.clone(),
                            (_, 0) if self.options.duplicate_rowspan => content.clone(),
                            (0, _) if self.options.duplicate_colspan => content.clone(),
                            (_, _) if self.options.duplicate_rowspan && self.options.duplicate_colspan => {
                                content.clone()
                            }
                            _ => String::new(),
                        };
                        grid.write(row + y, col + x, value);
                    }
                }
                col += colspan;
            }
        }

        grid.into_matrix()
    }

    /// [`Self::build`] over the rows of a `<table>` element
    pub fn build_from_table<'a, F>(&self, table: ElementRef<'a>, on_cell: F) -> TableMatrix
    where
        F: FnMut(CellRef, ElementRef<'a>),
    {
        self.build(table_rows(table), on_cell)
    }

    fn content(&self, cell: ElementRef<'_>) -> String {
        match self.options.mode {
            CellContent::Text => text_content(cell).trim().to_string(),
            CellContent::Markup => inner_markup(cell),
        }
    }
}

impl ContextualParser for TableMatrixBuilder {
    type Output = TableMatrix;

    fn parse_with_context(&self, node: ElementRef<'_>, _context: &ParsingContext) -> ParsingResult<TableMatrix> {
        Ok(self.build_from_table(node, |_, _| {}))
    }
}

/// Sparse grid used while spans are being placed
#[derive(Default)]
struct Grid {
    rows: Vec<Vec<Option<String>>>,
}

impl Grid {
    fn ensure_row(&mut self, row: usize) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
    }

    fn occupied(&self, row: usize, col: usize) -> bool {
        self.rows.get(row).and_then(|r| r.get(col)).is_some_and(Option::is_some)
    }

    fn write(&mut self, row: usize, col: usize, value: String) {
        self.ensure_row(row);
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        if cells[col].is_none() {
            cells[col] = Some(value);
        }
    }

    fn into_matrix(self) -> TableMatrix {
        let column_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let mut dense: Vec<String> = row.into_iter().map(Option::unwrap_or_default).collect();
                dense.resize(column_count, String::new());
                dense
            })
            .collect();
        TableMatrix { rows, column_count }
    }
}
