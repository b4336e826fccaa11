pub mod batch;
pub mod config;
pub mod date_key;
pub mod error;
pub mod fetch;
pub mod format_cell;
pub mod google;
pub mod handle_cell;
pub mod locate;
pub mod memory;
pub mod spreadsheet;
pub mod write;

use batch::RowChunks;
use config::TallyConfig;
use date_key::DateKey;
use error::TallyError;
use fetch::{Eligibility, MetricFetcher, PageSource};
use format_cell::{column_letter, CellRange};
use locate::locate_column;
use spreadsheet::Spreadsheet;
use write::{write_chunk, ChunkColumns};

use log::info;

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub target_column: u32,
    pub column_created: bool,
    pub rows_written: usize,
    pub chunks_committed: usize,
}

/// Record today's metric for every data row of `sheet`.
///
/// The header row is loaded and today's column found (or created and saved)
/// before any row is touched. Rows are then fetched one at a time and saved
/// chunk by chunk, in ascending order; a failed save stops the run with
/// every earlier chunk already in place.
pub fn run_tally<S, P>(
    sheet: &mut S,
    fetcher: &MetricFetcher<P>,
    config: &TallyConfig,
    today: &DateKey,
) -> Result<RunSummary, TallyError>
where
    S: Spreadsheet,
    P: PageSource,
{
    let meta = sheet.load_metadata()?;
    info!("sheet has {} rows x {} columns", meta.row_count, meta.column_count);

    sheet.load_cells(&CellRange::header(meta.column_count).to_a1())?;
    let target = locate_column(sheet, today, meta.column_count, config.source_column)?;
    info!(
        "writing {} into column {} (index={})",
        today.short,
        column_letter(target.index),
        target.index
    );

    let eligibility = Eligibility::new(&config.host);
    let columns = ChunkColumns {
        source: config.source_column,
        target: target.index,
    };

    let mut summary = RunSummary {
        target_column: target.index,
        column_created: target.created,
        rows_written: 0,
        chunks_committed: 0,
    };

    for chunk in RowChunks::new(meta.row_count, config.chunk_size) {
        summary.rows_written += write_chunk(sheet, fetcher, &eligibility, chunk, columns)?;
        summary.chunks_committed += 1;
    }

    info!(
        "done: {} rows in {} chunks",
        summary.rows_written, summary.chunks_committed
    );
    Ok(summary)
}
