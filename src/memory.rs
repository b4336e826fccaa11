use rsheet_lib::cell_value::CellValue;

use crate::{
    error::SheetError,
    handle_cell::parse_range,
    spreadsheet::{CellCache, CellContent, NumberFormat, SheetMetadata, Spreadsheet},
};

/// A spreadsheet held entirely in memory.
///
/// The grid plays the part of the remote copy; reads and writes go through
/// the same load/stage/save cycle a real backend uses.
pub struct MemorySheet {
    remote: Vec<Vec<CellContent>>,
    row_count: u32,
    column_count: u32,
    cache: CellCache,
    loaded_ranges: Vec<String>,
    saves: usize,
    fail_from_save: Option<usize>,
}

impl MemorySheet {
    pub fn new(row_count: u32, column_count: u32) -> Self {
        let remote = (0..row_count)
            .map(|_| (0..column_count).map(|_| CellContent::empty()).collect())
            .collect();

        MemorySheet {
            remote,
            row_count,
            column_count,
            cache: CellCache::new(),
            loaded_ranges: Vec::new(),
            saves: 0,
            fail_from_save: None,
        }
    }

    /// Fill row 0 with plain-text headers, left to right.
    pub fn with_header(mut self, headers: &[&str]) -> Self {
        for (col, header) in headers.iter().enumerate() {
            let value = if header.is_empty() {
                CellValue::None
            } else {
                CellValue::String(header.to_string())
            };
            self.put(0, col as u32, value);
        }
        self
    }

    /// Write straight into the remote grid, bypassing staging.
    pub fn put(&mut self, row: u32, col: u32, value: CellValue) {
        if let Some(cell) = self.cell_mut(row, col) {
            cell.value = value;
            cell.display = None;
        }
    }

    /// Set the remote display text independently of the raw value.
    pub fn put_display(&mut self, row: u32, col: u32, display: &str) {
        if let Some(cell) = self.cell_mut(row, col) {
            cell.display = Some(display.to_string());
        }
    }

    pub fn remote_cell(&self, row: u32, col: u32) -> Option<&CellContent> {
        self.remote.get(row as usize)?.get(col as usize)
    }

    /// Every A1 range passed to `load_cells`, in call order.
    pub fn loaded_ranges(&self) -> &[String] {
        &self.loaded_ranges
    }

    /// Cells currently held in the local cache.
    pub fn resident_cells(&self) -> usize {
        self.cache.resident()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Make the `nth` save (1-based) and every later one fail without
    /// applying anything.
    pub fn fail_from_save(&mut self, nth: usize) {
        self.fail_from_save = Some(nth);
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut CellContent> {
        self.remote.get_mut(row as usize)?.get_mut(col as usize)
    }
}

impl Spreadsheet for MemorySheet {
    fn load_metadata(&mut self) -> Result<SheetMetadata, SheetError> {
        Ok(SheetMetadata {
            row_count: self.row_count,
            column_count: self.column_count,
        })
    }

    fn load_cells(&mut self, range: &str) -> Result<(), SheetError> {
        let bounds = parse_range(range)?;

        for row in bounds.start_row..=bounds.end_row {
            for col in bounds.start_col..=bounds.end_col {
                let content = self
                    .remote_cell(row, col)
                    .cloned()
                    .unwrap_or_else(CellContent::empty);
                self.cache.insert(row, col, content);
            }
        }

        self.cache.mark_loaded(bounds);
        self.loaded_ranges.push(range.to_string());
        Ok(())
    }

    fn get_cell(&self, row: u32, col: u32) -> Result<&CellContent, SheetError> {
        self.cache.get(row, col)
    }

    fn set_cell(
        &mut self,
        row: u32,
        col: u32,
        value: CellValue,
        number_format: Option<NumberFormat>,
    ) -> Result<(), SheetError> {
        self.cache.stage(row, col, value, number_format)
    }

    fn release_cells(&mut self, range: &str) -> Result<(), SheetError> {
        self.cache.evict(parse_range(range)?);
        Ok(())
    }

    fn save_updated_cells(&mut self) -> Result<usize, SheetError> {
        if !self.cache.has_staged() {
            return Ok(0);
        }

        self.saves += 1;
        if self.fail_from_save.is_some_and(|nth| self.saves >= nth) {
            return Err(SheetError::Api {
                status: 503,
                message: "save rejected".to_string(),
            });
        }

        let staged: Vec<((u32, u32), CellContent)> = self
            .cache
            .staged()
            .map(|(key, content)| (*key, content.clone()))
            .collect();
        for ((row, col), content) in staged {
            if let Some(cell) = self.cell_mut(row, col) {
                *cell = content;
            }
        }

        Ok(self.cache.commit_staged())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_reach_the_grid_only_on_save() {
        let mut sheet = MemorySheet::new(3, 2);
        sheet.load_cells("B2:B3").unwrap();
        sheet.set_cell(1, 1, CellValue::Int(5), Some(NumberFormat::integer())).unwrap();

        assert!(sheet.remote_cell(1, 1).unwrap().is_blank());
        assert_eq!(sheet.get_cell(1, 1).unwrap().raw_text(), "5");

        assert_eq!(sheet.save_updated_cells().unwrap(), 1);
        let cell = sheet.remote_cell(1, 1).unwrap();
        assert_eq!(cell.raw_text(), "5");
        assert_eq!(cell.number_format, Some(NumberFormat::integer()));
    }

    #[test]
    fn reading_outside_loaded_ranges_fails() {
        let mut sheet = MemorySheet::new(3, 2);
        sheet.load_cells("A1:B1").unwrap();
        assert!(sheet.get_cell(0, 1).is_ok());
        assert!(matches!(sheet.get_cell(1, 0), Err(SheetError::NotLoaded(_))));
    }

    #[test]
    fn failed_save_applies_nothing() {
        let mut sheet = MemorySheet::new(3, 1);
        sheet.fail_from_save(1);
        sheet.load_cells("A2:A3").unwrap();
        sheet.set_cell(1, 0, CellValue::Int(1), None).unwrap();
        sheet.set_cell(2, 0, CellValue::Int(2), None).unwrap();

        assert!(sheet.save_updated_cells().is_err());
        assert!(sheet.remote_cell(1, 0).unwrap().is_blank());
        assert!(sheet.remote_cell(2, 0).unwrap().is_blank());
    }

    #[test]
    fn empty_save_is_free() {
        let mut sheet = MemorySheet::new(2, 2);
        assert_eq!(sheet.save_updated_cells().unwrap(), 0);
        assert_eq!(sheet.save_count(), 0);
    }
}
