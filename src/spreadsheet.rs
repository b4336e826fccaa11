use std::collections::{BTreeMap, HashMap};

use rsheet_lib::cell_value::CellValue;
use serde::{Deserialize, Serialize};

use crate::{error::SheetError, format_cell::{format_cell_key, CellRange}};

/// Number format attached to a written cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub pattern: String,
}

impl NumberFormat {
    /// Plain integer, no grouping or decimals.
    pub fn integer() -> Self {
        NumberFormat {
            kind: "NUMBER".to_string(),
            pattern: "0".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct CellContent {
    pub value: CellValue,
    /// What the sheet shows for the cell, if the backend knows.
    pub display: Option<String>,
    pub number_format: Option<NumberFormat>,
}

impl CellContent {
    pub fn empty() -> Self {
        CellContent {
            value: CellValue::None,
            display: None,
            number_format: None,
        }
    }

    pub fn raw_text(&self) -> String {
        value_text(&self.value).trim().to_string()
    }

    pub fn display_text(&self) -> String {
        match &self.display {
            Some(display) => display.trim().to_string(),
            None => self.raw_text(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw_text().is_empty()
    }
}

/// Stringify a raw cell value the way it would be compared as a header.
pub fn value_text(value: &CellValue) -> String {
    match value {
        CellValue::None => String::new(),
        CellValue::String(s) => s.clone(),
        CellValue::Int(i) => i.to_string(),
        CellValue::Error(e) => e.clone(),
        #[allow(unreachable_patterns)]
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetMetadata {
    pub row_count: u32,
    pub column_count: u32,
}

/// The spreadsheet capabilities a tally run needs.
///
/// Cells must be loaded through [`Spreadsheet::load_cells`] before they can
/// be read or staged. Staged edits stay local until
/// [`Spreadsheet::save_updated_cells`] flushes them in one commit.
pub trait Spreadsheet {
    fn load_metadata(&mut self) -> Result<SheetMetadata, SheetError>;

    /// Load an A1 range such as `A2:A101` into the local cache.
    fn load_cells(&mut self, range: &str) -> Result<(), SheetError>;

    fn get_cell(&self, row: u32, col: u32) -> Result<&CellContent, SheetError>;

    fn set_cell(
        &mut self,
        row: u32,
        col: u32,
        value: CellValue,
        number_format: Option<NumberFormat>,
    ) -> Result<(), SheetError>;

    /// Flush every staged edit. Returns how many cells were written.
    fn save_updated_cells(&mut self) -> Result<usize, SheetError>;

    /// Drop a previously loaded A1 range from the local cache. Its cells
    /// must be loaded again before they can be read or staged.
    fn release_cells(&mut self, range: &str) -> Result<(), SheetError>;
}

/// Local view of loaded cells plus the edits waiting for the next commit.
#[derive(Default)]
pub struct CellCache {
    cells: HashMap<(u32, u32), CellContent>,
    loaded: Vec<CellRange>,
    staged: BTreeMap<(u32, u32), CellContent>,
}

impl CellCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_loaded(&mut self, range: CellRange) {
        self.loaded.push(range);
    }

    pub fn is_loaded(&self, row: u32, col: u32) -> bool {
        self.loaded.iter().any(|range| range.contains(row, col))
    }

    /// Store a freshly loaded cell, keeping any staged edit on top of it.
    pub fn insert(&mut self, row: u32, col: u32, content: CellContent) {
        if self.staged.contains_key(&(row, col)) {
            return;
        }
        self.cells.insert((row, col), content);
    }

    pub fn get(&self, row: u32, col: u32) -> Result<&CellContent, SheetError> {
        if !self.is_loaded(row, col) {
            return Err(SheetError::NotLoaded(format_cell_key(row, col)));
        }
        Ok(self
            .staged
            .get(&(row, col))
            .or_else(|| self.cells.get(&(row, col)))
            .unwrap_or(&EMPTY_CELL))
    }

    pub fn stage(
        &mut self,
        row: u32,
        col: u32,
        value: CellValue,
        number_format: Option<NumberFormat>,
    ) -> Result<(), SheetError> {
        if !self.is_loaded(row, col) {
            return Err(SheetError::NotLoaded(format_cell_key(row, col)));
        }

        let previous_format = self.cells.get(&(row, col)).and_then(|c| c.number_format.clone());
        let content = CellContent {
            display: Some(value_text(&value)),
            value,
            number_format: number_format.or(previous_format),
        };
        self.staged.insert((row, col), content);
        Ok(())
    }

    /// Forget a loaded range. Cells still covered by another loaded range,
    /// and cells with pending edits, stay.
    pub fn evict(&mut self, range: CellRange) {
        self.loaded.retain(|loaded| *loaded != range);

        for row in range.start_row..=range.end_row {
            for col in range.start_col..=range.end_col {
                if !self.is_loaded(row, col) && !self.staged.contains_key(&(row, col)) {
                    self.cells.remove(&(row, col));
                }
            }
        }
    }

    /// Number of cells held locally, staged edits included.
    pub fn resident(&self) -> usize {
        self.cells.len() + self.staged.keys().filter(|key| !self.cells.contains_key(key)).count()
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Staged edits in (row, col) order. Nothing is removed until
    /// [`CellCache::commit_staged`] is called after a successful save.
    pub fn staged(&self) -> impl Iterator<Item = (&(u32, u32), &CellContent)> {
        self.staged.iter()
    }

    /// Fold staged edits into the loaded view once the backend accepted them.
    pub fn commit_staged(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        self.cells.extend(staged);
        count
    }
}

static EMPTY_CELL: CellContent = CellContent {
    value: CellValue::None,
    display: None,
    number_format: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(range: CellRange) -> CellCache {
        let mut cache = CellCache::new();
        cache.mark_loaded(range);
        cache
    }

    #[test]
    fn unloaded_cells_are_rejected() {
        let mut cache = cache_with(CellRange::column(0, 1, 10));
        assert!(matches!(cache.get(0, 0), Err(SheetError::NotLoaded(key)) if key == "A1"));
        assert!(cache.stage(11, 0, CellValue::Int(1), None).is_err());
    }

    #[test]
    fn loaded_but_absent_cells_are_blank() {
        let cache = cache_with(CellRange::header(3));
        assert!(cache.get(0, 2).unwrap().is_blank());
    }

    #[test]
    fn staged_edits_shadow_loaded_values_until_commit() {
        let mut cache = cache_with(CellRange::column(1, 0, 5));
        cache.insert(
            3,
            1,
            CellContent {
                value: CellValue::Int(7),
                display: Some("7".to_string()),
                number_format: None,
            },
        );
        cache
            .stage(3, 1, CellValue::Int(9), Some(NumberFormat::integer()))
            .unwrap();

        assert_eq!(cache.get(3, 1).unwrap().raw_text(), "9");
        assert_eq!(cache.staged().count(), 1);

        // a reload must not clobber the pending edit
        cache.insert(3, 1, CellContent::empty());
        assert_eq!(cache.get(3, 1).unwrap().raw_text(), "9");

        assert_eq!(cache.commit_staged(), 1);
        assert!(!cache.has_staged());
        assert_eq!(cache.get(3, 1).unwrap().number_format, Some(NumberFormat::integer()));
    }

    #[test]
    fn evicted_ranges_are_gone() {
        let mut cache = CellCache::new();
        let header = CellRange::header(3);
        let chunk = CellRange::column(1, 1, 4);
        cache.mark_loaded(header);
        cache.mark_loaded(chunk);
        for row in 0..=4 {
            cache.insert(row, 1, CellContent::empty());
        }
        cache.insert(0, 0, CellContent::empty());
        assert_eq!(cache.resident(), 6);

        cache.evict(chunk);

        assert!(matches!(cache.get(2, 1), Err(SheetError::NotLoaded(key)) if key == "B3"));
        assert!(cache.get(0, 1).is_ok());
        assert_eq!(cache.resident(), 2);
    }

    #[test]
    fn eviction_keeps_pending_edits() {
        let mut cache = cache_with(CellRange::column(0, 1, 2));
        cache.stage(1, 0, CellValue::Int(3), None).unwrap();

        cache.evict(CellRange::column(0, 1, 2));

        assert!(cache.has_staged());
        assert_eq!(cache.resident(), 1);
    }

    #[test]
    fn display_falls_back_to_raw() {
        let cell = CellContent {
            value: CellValue::String(" 8/22 ".to_string()),
            display: None,
            number_format: None,
        };
        assert_eq!(cell.display_text(), "8/22");
    }
}
