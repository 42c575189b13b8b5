//! Sparse table layout honouring `rowspan` and `colspan`.

use std::fmt;

/// Why a cell could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    /// Every column of the row is already taken.
    RowFull,
    /// The span reaches outside the table or over a taken slot.
    OutOfBounds { row: usize, col: usize },
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceError::RowFull => f.write_str("row is full"),
            PlaceError::OutOfBounds { row, col } => {
                write!(f, "slot ({row}, {col}) is taken or outside the table")
            }
        }
    }
}

/// A `rows × cols` grid of cell indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    slots: Vec<Vec<Option<usize>>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            slots: vec![vec![None; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.slots.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        self.slots.get(row)?.get(col).copied().flatten()
    }

    /// Place `cell` at the first free column of `row`, covering
    /// `rowspan × colspan` slots. Returns the column it landed in.
    ///
    /// Slots that are free inside the table are filled even when part of
    /// the span is rejected, so the remaining cells of the row keep their
    /// positions.
    pub fn place(
        &mut self,
        row: usize,
        cell: usize,
        rowspan: usize,
        colspan: usize,
    ) -> Result<usize, PlaceError> {
        let col = self
            .slots
            .get(row)
            .and_then(|slots| slots.iter().position(Option::is_none))
            .ok_or(PlaceError::RowFull)?;

        let row_end = row.saturating_add(rowspan).min(self.rows());
        let col_end = col.saturating_add(colspan).min(self.cols);
        let mut error = None;
        for r in row..row_end {
            for c in col..col_end {
                let slot = &mut self.slots[r][c];
                if slot.is_none() {
                    *slot = Some(cell);
                } else {
                    error.get_or_insert(PlaceError::OutOfBounds { row: r, col: c });
                }
            }
        }
        if error.is_none() {
            if rowspan > row_end - row {
                error = Some(PlaceError::OutOfBounds { row: row_end, col });
            } else if colspan > col_end - col {
                error = Some(PlaceError::OutOfBounds { row, col: col_end });
            }
        }
        match error {
            Some(err) => Err(err),
            None => Ok(col),
        }
    }

    /// Column of the first slot in `row` filled by `cell`.
    pub fn column_of(&self, row: usize, cell: usize) -> Option<usize> {
        self.slots.get(row)?.iter().position(|s| *s == Some(cell))
    }
}
