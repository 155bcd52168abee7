use crate::error::MeterSheetError;
use crate::error::ResultOptionChain;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use either::Either;
use std::collections::HashMap;
use std::collections::HashSet;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;
const EOF: u16 = 10;
const DATE1904: u16 = 34;
const FILE_PASS: u16 = 47;
const BOUND_SHEET8: u16 = 133;
const MUL_RK: u16 = 189;
const XF: u16 = 224;
const SST: u16 = 252;
const LABEL_SST: u16 = 253;
const NUMBER: u16 = 515;
const LABEL: u16 = 516;
const BOOL_ERR: u16 = 517;
const STRING: u16 = 519;
const RK: u16 = 638;
const FORMAT: u16 = 1054;
const BOF: u16 = 2057;

#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid Formula value '{0}'")]
    FormulaValueError(u64),
}

/// A legacy Excel 97-2003 workbook held in memory.
pub(crate) struct XlsSpreadsheet {
    reader: Biff8Reader,
    shared_strings: Vec<String>,
    /// Cell type of every XF record, in order
    number_formats: Vec<CellType>,
    /// Worksheets with the stream offset of their BOF record
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    /// Reads the workbook globals: date system, formats, shared strings and sheet offsets.
    pub(crate) fn open(data: Vec<u8>) -> Result<XlsSpreadsheet, MeterSheetError> {
        let cfb = Cfb::new(data)?;
        let mut reader = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .map(Biff8Reader::new)
            .ok_or(SpreadsheetError::SpreadsheetEmptyError)?;
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut custom_formats: HashMap<String, CellType> = HashMap::new();
        let mut format_indexes: Vec<String> = Vec::new();
        let mut sheets: Vec<(String, usize)> = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS if reader.read_u16()? != 0 => Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?,
            DATE1904 if reader.read_u16()? == 1 => is_1904 = true,
            FORMAT => {
                let id = reader.read_u16()?;
                let format = reader.read_xl_unicode_string()?;
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
            XF => {
                reader.skip(2)?;
                let id = reader.read_u16()?;
                format_indexes.push(id.to_string());
            }
            SST => shared_strings = load_shared_strings(&mut reader)?,
            BOUND_SHEET8 => {
                let pointer = reader.read_usize()?;
                let visibility_and_type = reader.read_u16()?;
                let sheet_name = reader.read_short_xl_unicode_string()?;
                // high byte 0 is a worksheet; charts and macro sheets are skipped
                if visibility_and_type >> 8 == 0 {
                    sheets.push((sheet_name, pointer));
                }
            }
        });
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError)?
        }

        Ok(XlsSpreadsheet {
            reader,
            shared_strings,
            number_formats: load_number_formats(format_indexes, custom_formats, is_1904),
            sheets,
        })
    }

    fn number_format(&self, index: usize) -> CellType {
        self.number_formats.get(index).copied().unwrap_or(CellType::Number)
    }
}

impl Spreadsheet for XlsSpreadsheet {
    /// The SST is read with the globals, so ids map onto themselves.
    fn load_shared_strings(&mut self, indexes: HashSet<usize>) -> Result<(Vec<String>, HashMap<usize, usize>), MeterSheetError> {
        let mappings = indexes.into_iter().map(|key| (key, key)).collect();
        Ok((self.shared_strings.to_owned(), mappings))
    }

    fn read_first_sheet(&mut self) -> Result<Sheet, MeterSheetError> {
        let (sheet_name, pointer) = self.sheets.first().cloned().ok_or(SpreadsheetError::SpreadsheetEmptyError)?;
        let mut sheet = Sheet::new(&sheet_name);
        self.reader.goto(pointer);
        self.reader.next()?;
        while let Some(tag) = self.reader.next()? {
            match tag {
                BOF | EOF => break,
                MUL_RK => {
                    let row = self.reader.read_u16()? as usize;
                    let col_lower_bound = self.reader.read_u16()? as usize;
                    let col_upper_bound = self.reader.get_u16_back(2)? as usize;
                    for col in col_lower_bound..=col_upper_bound {
                        let index = self.reader.read_u16()? as usize;
                        let value = self.reader.read_rk_number()?;
                        sheet.push(Cell {
                            row,
                            col,
                            kind: self.number_format(index),
                            value: value.to_string(),
                        });
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = self.reader.read_u16()? as usize;
                    let col = self.reader.read_u16()? as usize;
                    let (either, value) = match tag {
                        BOOL_ERR => read_bool_or_error_cell(&mut self.reader)?,
                        NUMBER => read_number_cell(&mut self.reader)?,
                        RK => read_rk_cell(&mut self.reader)?,
                        LABEL_SST => read_label_sst_cell(&mut self.reader)?,
                        LABEL => read_label_cell(&mut self.reader)?,
                        _ => read_formula_cell(&mut self.reader)?,
                    };
                    let kind = match either {
                        Either::Left(kind) => kind,
                        Either::Right(index) => self.number_format(index),
                    };
                    if kind != CellType::Error && !value.is_empty() {
                        sheet.push(Cell {
                            row,
                            col,
                            kind,
                            value,
                        });
                    }
                }
                _ => (),
            }
        }
        Ok(sheet)
    }
}

fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, MeterSheetError> {
    reader.skip(4)?;
    let count = reader.read_usize()?;
    let mut shared_strings: Vec<String> = Vec::with_capacity(count.min(65_536));
    for _ in 0..count {
        shared_strings.push(reader.read_xl_unicode_rich_extended_string()?);
    }
    Ok(shared_strings)
}

/// BOOL_ERR: a boolean byte or an error code, told apart by a flag.
fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let flag = reader.read_u8()?;
    if flag == 0 {
        Ok((Either::Left(CellType::Boolean), value.to_string()))
    } else {
        Ok((Either::Left(CellType::Error), String::new()))
    }
}

fn read_number_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(index), value.to_string()))
}

fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(index), value.to_string()))
}

fn read_label_sst_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    reader.skip(2)?;
    let value = reader.read_usize()?;
    Ok((Either::Left(CellType::SharedString), value.to_string()))
}

fn read_label_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    reader.skip(2)?;
    let value = reader.read_xl_unicode_string()?;
    Ok((Either::Left(CellType::InlineString), value))
}

/// FORMULA: the cached result is a double unless the top two bytes are 0xFFFF,
/// in which case the low byte says string, boolean, error or empty.
/// String results follow in a separate STRING record.
fn read_formula_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), MeterSheetError> {
    let index = reader.read_u16()? as usize;
    let formula = reader.read_u64()?;
    let is_number = (formula & 0xFFFF000000000000) != 0xFFFF000000000000;
    match formula & 0xFF {
        _ if is_number => Ok((Either::Right(index), f64::from_bits(formula).to_string())),
        0 => match reader.next()? {
            Some(STRING) => Ok((Either::Left(CellType::InlineString), reader.read_xl_unicode_string()?)),
            _ => Err(XlsError::FormulaValueError(formula))?,
        },
        1 => {
            let value = if (formula & 0xFF0000) > 0 { "1" } else { "0" };
            Ok((Either::Left(CellType::Boolean), value.to_owned()))
        }
        2 => Ok((Either::Left(CellType::Error), String::new())),
        3 => Ok((Either::Left(CellType::InlineString), String::new())),
        _ => Err(XlsError::FormulaValueError(formula))?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&kind.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn cell_header(row: u16, col: u16, xf: u16) -> Vec<u8> {
        [row.to_le_bytes(), col.to_le_bytes(), xf.to_le_bytes()].concat()
    }

    #[test]
    fn reads_formula_results() -> Result<(), MeterSheetError> {
        let mut payload = 0u16.to_le_bytes().to_vec();
        payload.extend(12.5f64.to_le_bytes());
        let mut reader = Biff8Reader::new(record(FORMULA, &payload));
        reader.next()?;
        let (kind, value) = read_formula_cell(&mut reader)?;
        assert_eq!(kind, Either::Right(0));
        assert_eq!(value, "12.5");

        let mut data = record(FORMULA, &[0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        data.extend(record(STRING, &[2, 0, 0, b'o', b'k']));
        let mut reader = Biff8Reader::new(data);
        reader.next()?;
        let (kind, value) = read_formula_cell(&mut reader)?;
        assert_eq!(kind, Either::Left(CellType::InlineString));
        assert_eq!(value, "ok");
        Ok(())
    }

    #[test]
    fn error_cells_have_no_value() -> Result<(), MeterSheetError> {
        let mut payload = cell_header(0, 0, 0);
        payload.extend([0x07, 1]);
        let mut reader = Biff8Reader::new(record(BOOL_ERR, &payload));
        reader.next()?;
        reader.skip(4)?;
        let (kind, value) = read_bool_or_error_cell(&mut reader)?;
        assert_eq!(kind, Either::Left(CellType::Error));
        assert!(value.is_empty());
        Ok(())
    }

    #[test]
    fn reads_shared_string_table() -> Result<(), MeterSheetError> {
        let mut payload = vec![2, 0, 0, 0, 2, 0, 0, 0];
        payload.extend([3, 0, 0, b'k', b'W', b'h']);
        payload.extend([2, 0, 0, b'k', b'W']);
        let mut reader = Biff8Reader::new(record(SST, &payload));
        reader.next()?;
        assert_eq!(load_shared_strings(&mut reader)?, vec!["kWh".to_owned(), "kW".to_owned()]);
        Ok(())
    }
}
