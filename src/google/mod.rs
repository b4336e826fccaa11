//! [`Spreadsheet`] backed by the Google Sheets v4 REST API.

pub mod credentials;
pub mod model;

use chrono::Utc;
use log::debug;
use reqwest::blocking::{Client, Response};
use rsheet_lib::cell_value::CellValue;

use crate::{
    error::SheetError,
    handle_cell::parse_range,
    spreadsheet::{CellCache, CellContent, NumberFormat, SheetMetadata, Spreadsheet},
};

use credentials::{AccessToken, ServiceAccount};
use model::{BatchUpdate, CellData, GridCoordinate, Request, RowData, UpdateCellsRequest};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const METADATA_FIELDS: &str = "sheets.properties(sheetId,title,gridProperties(rowCount,columnCount))";
const GRID_FIELDS: &str = "sheets(properties(sheetId,title),data(startRow,startColumn,\
    rowData(values(userEnteredValue,formattedValue,userEnteredFormat.numberFormat))))";

pub struct GoogleSheet {
    client: Client,
    account: ServiceAccount,
    token: AccessToken,
    spreadsheet_id: String,
    tab: String,
    sheet_id: Option<i64>,
    cache: CellCache,
}

impl GoogleSheet {
    /// Authenticate and bind to one tab of one spreadsheet.
    pub fn connect(account: ServiceAccount, spreadsheet_id: &str, tab: &str) -> Result<Self, SheetError> {
        let client = Client::builder().build()?;
        let token = account.fetch_access_token(&client)?;
        debug!("authenticated as {}", account.client_email);

        Ok(GoogleSheet {
            client,
            account,
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
            tab: tab.to_string(),
            sheet_id: None,
            cache: CellCache::new(),
        })
    }

    fn bearer(&mut self) -> Result<String, SheetError> {
        if self.token.is_stale(Utc::now()) {
            debug!("refreshing access token");
            self.token = self.account.fetch_access_token(&self.client)?;
        }
        Ok(self.token.token.clone())
    }

    fn get_document(&mut self, query: &[(&str, &str)]) -> Result<model::Spreadsheet, SheetError> {
        let bearer = self.bearer()?;
        let response = self
            .client
            .get(format!("{API_BASE}/{}", self.spreadsheet_id))
            .bearer_auth(bearer)
            .query(query)
            .send()?;
        Ok(check(response)?.json()?)
    }

    fn quoted_range(&self, a1: &str) -> String {
        format!("'{}'!{}", self.tab.replace('\'', "''"), a1)
    }
}

fn check(response: Response) -> Result<Response, SheetError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(SheetError::Api {
        status: status.as_u16(),
        message: response.text().unwrap_or_default(),
    })
}

impl Spreadsheet for GoogleSheet {
    fn load_metadata(&mut self) -> Result<SheetMetadata, SheetError> {
        let doc = self.get_document(&[("fields", METADATA_FIELDS)])?;

        let properties = doc
            .sheets
            .into_iter()
            .filter_map(|sheet| sheet.properties)
            .find(|properties| properties.title == self.tab)
            .ok_or_else(|| SheetError::TabNotFound(self.tab.clone()))?;

        self.sheet_id = Some(properties.sheet_id);
        let grid = properties.grid_properties.unwrap_or(model::GridProperties {
            row_count: 0,
            column_count: 0,
        });
        Ok(SheetMetadata {
            row_count: grid.row_count,
            column_count: grid.column_count,
        })
    }

    fn load_cells(&mut self, range: &str) -> Result<(), SheetError> {
        let bounds = parse_range(range)?;
        let ranges = self.quoted_range(range);
        let doc = self.get_document(&[
            ("ranges", ranges.as_str()),
            ("includeGridData", "true"),
            ("fields", GRID_FIELDS),
        ])?;

        // Blank cells are left out of the response entirely.
        for row in bounds.start_row..=bounds.end_row {
            for col in bounds.start_col..=bounds.end_col {
                self.cache.insert(row, col, CellContent::empty());
            }
        }

        for sheet in doc.sheets {
            for grid in sheet.data {
                for (r, row_data) in grid.row_data.into_iter().enumerate() {
                    for (c, cell) in row_data.values.into_iter().enumerate() {
                        let row = grid.start_row + r as u32;
                        let col = grid.start_column + c as u32;
                        self.cache.insert(row, col, cell.into());
                    }
                }
            }
        }

        self.cache.mark_loaded(bounds);
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
        let sheet_id = self.sheet_id.ok_or(SheetError::MetadataNotLoaded)?;

        let requests = self
            .cache
            .staged()
            .map(|(&(row, col), content)| Request {
                update_cells: UpdateCellsRequest {
                    start: GridCoordinate {
                        sheet_id,
                        row_index: row,
                        column_index: col,
                    },
                    rows: vec![RowData {
                        values: vec![CellData::from_staged(content)],
                    }],
                    fields: if content.number_format.is_some() {
                        "userEnteredValue,userEnteredFormat.numberFormat"
                    } else {
                        "userEnteredValue"
                    },
                },
            })
            .collect();

        let bearer = self.bearer()?;
        let response = self
            .client
            .post(format!("{API_BASE}/{}:batchUpdate", self.spreadsheet_id))
            .bearer_auth(bearer)
            .json(&BatchUpdate { requests })
            .send()?;
        check(response)?;

        Ok(self.cache.commit_staged())
    }
}
