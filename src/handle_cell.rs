use rsheet_lib::cells::column_name_to_number;

use crate::{error::SheetError, format_cell::CellRange};

/// Split an A1 key such as `C12` into a zero-based (row, col) pair.
pub fn cell_key(key: &str) -> Result<(u32, u32), SheetError> {
    let key = key.trim();
    let letters: String = key.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &key[letters.len()..];

    if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(SheetError::BadRange(key.to_string()));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| SheetError::BadRange(key.to_string()))?;
    if row == 0 {
        return Err(SheetError::BadRange(key.to_string()));
    }

    let col = column_name_to_number(&letters.to_ascii_uppercase());
    Ok((row - 1, col))
}

/// Parse `A2:A101` (or a lone `B1`) into a [`CellRange`].
pub fn parse_range(range: &str) -> Result<CellRange, SheetError> {
    let parts: Vec<&str> = range.split(':').collect();

    let (start, ending) = match parts.as_slice() {
        [single] => (*single, *single),
        [start, ending] => (*start, *ending),
        _ => return Err(SheetError::BadRange(range.to_string())),
    };

    let (start_row, start_col) = cell_key(start)?;
    let (end_row, end_col) = cell_key(ending)?;

    if end_row < start_row || end_col < start_col {
        return Err(SheetError::BadRange(range.to_string()));
    }

    Ok(CellRange {
        start_row,
        end_row,
        start_col,
        end_col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_column_range() {
        let range = parse_range("C2:C101").unwrap();
        assert_eq!(range, CellRange::column(2, 1, 100));
    }

    #[test]
    fn parses_single_cell() {
        let range = parse_range("B1").unwrap();
        assert_eq!(range, CellRange::column(1, 0, 0));
    }

    #[test]
    fn format_and_parse_agree() {
        let range = CellRange::header(30);
        assert_eq!(parse_range(&range.to_a1()).unwrap(), range);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_range("").is_err());
        assert!(parse_range("A0").is_err());
        assert!(parse_range("12").is_err());
        assert!(parse_range("A2:A1").is_err());
        assert!(parse_range("A1:B2:C3").is_err());
    }
}
