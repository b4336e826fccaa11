//! Wire shapes for the slice of the Sheets v4 API a tally run touches.

use rsheet_lib::cell_value::CellValue;
use serde::{Deserialize, Serialize};

use crate::spreadsheet::{value_text, CellContent, NumberFormat};

#[derive(Debug, Default, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sheet {
    pub properties: Option<SheetProperties>,
    #[serde(default)]
    pub data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    #[serde(default)]
    pub title: String,
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    #[serde(default)]
    pub start_row: u32,
    #[serde(default)]
    pub start_column: u32,
    #[serde(default)]
    pub row_data: Vec<RowData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RowData {
    #[serde(default)]
    pub values: Vec<CellData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_entered_value: Option<ExtendedValue>,
    #[serde(skip_serializing)]
    pub formatted_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_entered_format: Option<CellFormat>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_value: Option<ErrorValue>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorValue {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: i64,
    pub row_index: u32,
    pub column_index: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCellsRequest {
    pub start: GridCoordinate,
    pub rows: Vec<RowData>,
    pub fields: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub update_cells: UpdateCellsRequest,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdate {
    pub requests: Vec<Request>,
}

impl ExtendedValue {
    fn into_cell_value(self) -> CellValue {
        if let Some(n) = self.number_value {
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                return CellValue::Int(n as i64);
            }
            return CellValue::String(n.to_string());
        }
        if let Some(s) = self.string_value {
            return CellValue::String(s);
        }
        if let Some(b) = self.bool_value {
            return CellValue::String(if b { "TRUE" } else { "FALSE" }.to_string());
        }
        if let Some(f) = self.formula_value {
            return CellValue::String(f);
        }
        if let Some(e) = self.error_value {
            return CellValue::Error(e.message);
        }
        CellValue::None
    }

    pub fn from_cell_value(value: &CellValue) -> Self {
        match value {
            CellValue::Int(i) => ExtendedValue {
                number_value: Some(*i as f64),
                ..Default::default()
            },
            other => ExtendedValue {
                string_value: Some(value_text(other)),
                ..Default::default()
            },
        }
    }
}

impl From<CellData> for CellContent {
    fn from(cell: CellData) -> Self {
        CellContent {
            value: cell
                .user_entered_value
                .map(ExtendedValue::into_cell_value)
                .unwrap_or(CellValue::None),
            display: cell.formatted_value,
            number_format: cell.user_entered_format.and_then(|f| f.number_format),
        }
    }
}

impl CellData {
    /// The payload written back for a staged cell.
    pub fn from_staged(content: &CellContent) -> Self {
        CellData {
            user_entered_value: Some(ExtendedValue::from_cell_value(&content.value)),
            formatted_value: None,
            user_entered_format: content.number_format.clone().map(|number_format| CellFormat {
                number_format: Some(number_format),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_grid_values() {
        let json = r#"{
            "sheets": [{
                "properties": {"sheetId": 7, "title": "views"},
                "data": [{
                    "startRow": 1,
                    "rowData": [
                        {"values": [{"userEnteredValue": {"stringValue": "https://www.tiktok.com/x"}, "formattedValue": "https://www.tiktok.com/x"}]},
                        {"values": [{"userEnteredValue": {"numberValue": 45891}, "formattedValue": "2025/08/22"}]},
                        {}
                    ]
                }]
            }]
        }"#;

        let doc: Spreadsheet = serde_json::from_str(json).unwrap();
        let grid = &doc.sheets[0].data[0];
        assert_eq!(grid.start_row, 1);
        assert_eq!(grid.start_column, 0);

        let mut rows = doc.sheets.into_iter().next().unwrap().data.remove(0).row_data.into_iter();
        let first: CellContent = rows.next().unwrap().values.remove(0).into();
        assert_eq!(first.raw_text(), "https://www.tiktok.com/x");

        let second: CellContent = rows.next().unwrap().values.remove(0).into();
        assert_eq!(second.raw_text(), "45891");
        assert_eq!(second.display_text(), "2025/08/22");

        assert!(rows.next().unwrap().values.is_empty());
    }

    #[test]
    fn writes_integer_with_format() {
        let content = CellContent {
            value: CellValue::Int(4821),
            display: None,
            number_format: Some(NumberFormat::integer()),
        };
        let json = serde_json::to_value(CellData::from_staged(&content)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userEnteredValue": {"numberValue": 4821.0},
                "userEnteredFormat": {"numberFormat": {"type": "NUMBER", "pattern": "0"}}
            })
        );
    }

    #[test]
    fn writes_header_as_plain_string() {
        let content = CellContent {
            value: CellValue::String("8/22".to_string()),
            display: None,
            number_format: None,
        };
        let json = serde_json::to_value(CellData::from_staged(&content)).unwrap();
        assert_eq!(json, serde_json::json!({"userEnteredValue": {"stringValue": "8/22"}}));
    }
}
