use log::info;
use rsheet_lib::cell_value::CellValue;

use crate::{
    date_key::DateKey,
    error::TallyError,
    format_cell::column_letter,
    spreadsheet::Spreadsheet,
};

/// The column a run writes into. Never column 0 and never the source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColumn {
    pub index: u32,
    /// The header was written by this run.
    pub created: bool,
}

/// Find today's column in the (already loaded) header row, or claim the
/// first blank header for it.
///
/// Column 0 and `source_col` are never candidates. A new header is saved
/// before returning, in a commit of its own.
pub fn locate_column<S>(
    sheet: &mut S,
    today: &DateKey,
    column_count: u32,
    source_col: u32,
) -> Result<TargetColumn, TallyError>
where
    S: Spreadsheet,
{
    let candidates = move || (1..column_count).filter(move |&col| col != source_col);

    for col in candidates() {
        let cell = sheet.get_cell(0, col)?;
        if today.matches(&cell.raw_text()) || today.matches(&cell.display_text()) {
            return Ok(TargetColumn {
                index: col,
                created: false,
            });
        }
    }

    for col in candidates() {
        if sheet.get_cell(0, col)?.is_blank() {
            sheet.set_cell(0, col, CellValue::String(today.short.clone()), None)?;
            sheet.save_updated_cells()?;
            info!("created header {} in column {}", today.short, column_letter(col));
            return Ok(TargetColumn {
                index: col,
                created: true,
            });
        }
    }

    Err(TallyError::NoFreeColumn {
        columns: column_count,
    })
}
