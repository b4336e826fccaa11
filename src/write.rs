use log::{debug, info, warn};
use rsheet_lib::cell_value::CellValue;

use crate::{
    batch::Chunk,
    error::TallyError,
    fetch::{Eligibility, MetricFetcher, PageSource},
    format_cell::CellRange,
    spreadsheet::{NumberFormat, Spreadsheet},
};

/// Where a chunk reads from and writes to.
#[derive(Debug, Clone, Copy)]
pub struct ChunkColumns {
    pub source: u32,
    pub target: u32,
}

/// Metric for one source cell. Ineligible text and failed fetches are 0.
pub fn resolve_metric<P>(url: &str, eligibility: &Eligibility, fetcher: &MetricFetcher<P>) -> i64
where
    P: PageSource,
{
    if !eligibility.accepts(url) {
        debug!("skipping {url:?}");
        return 0;
    }

    match fetcher.fetch(url) {
        Ok(value) if value >= 0 => value,
        Ok(_) => 0,
        Err(e) => {
            warn!("{url}: {e}");
            0
        }
    }
}

/// Load one chunk's source and target cells, stage a metric for every row,
/// then commit. Returns the number of cells written.
///
/// Nothing is written to the sheet unless the final save succeeds. Once it
/// has, both ranges are released from the local cache.
pub fn write_chunk<S, P>(
    sheet: &mut S,
    fetcher: &MetricFetcher<P>,
    eligibility: &Eligibility,
    chunk: Chunk,
    columns: ChunkColumns,
) -> Result<usize, TallyError>
where
    S: Spreadsheet,
    P: PageSource,
{
    let source_range = CellRange::column(columns.source, chunk.start, chunk.end);
    let target_range = CellRange::column(columns.target, chunk.start, chunk.end);
    sheet.load_cells(&source_range.to_a1())?;
    sheet.load_cells(&target_range.to_a1())?;

    let mut staged = 0;
    for row in chunk.rows() {
        let url = sheet.get_cell(row, columns.source)?.raw_text();
        let metric = resolve_metric(&url, eligibility, fetcher);
        sheet.set_cell(
            row,
            columns.target,
            CellValue::Int(metric),
            Some(NumberFormat::integer()),
        )?;
        staged += 1;
        info!("row {} -> {metric}", row + 1);
    }

    let written = sheet.save_updated_cells()?;
    sheet.release_cells(&source_range.to_a1())?;
    sheet.release_cells(&target_range.to_a1())?;
    info!("saved rows {}-{} ({staged} updated)", chunk.start + 1, chunk.end + 1);
    Ok(written)
}
