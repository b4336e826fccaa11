use rsheet_lib::cells::column_number_to_name;

/// Column letters for a zero-based column index (0 -> "A", 26 -> "AA").
pub fn column_letter(col: u32) -> String {
    column_number_to_name(col)
}

/// A1 key for a zero-based (row, col) pair.
pub fn format_cell_key(row: u32, col: u32) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// Inclusive, zero-based rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl CellRange {
    /// The header row across every column of the sheet.
    pub fn header(column_count: u32) -> Self {
        CellRange {
            start_row: 0,
            end_row: 0,
            start_col: 0,
            end_col: column_count.saturating_sub(1),
        }
    }

    /// A single column between two rows.
    pub fn column(col: u32, start_row: u32, end_row: u32) -> Self {
        CellRange {
            start_row,
            end_row,
            start_col: col,
            end_col: col,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row) && (self.start_col..=self.end_col).contains(&col)
    }

    pub fn to_a1(&self) -> String {
        format!(
            "{}:{}",
            format_cell_key(self.start_row, self.start_col),
            format_cell_key(self.end_row, self.end_col)
        )
    }
}
