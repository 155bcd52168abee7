//! Microsoft Office Excel Helpers
use crate::error::MeterSheetError;
use crate::helpers::cfb::Cfb;
use crate::helpers::cfb::CFB_SIGNATURE;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

pub(super) type ExcelArchive = ZipArchive<Cursor<Vec<u8>>>;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Opens an in-memory workbook archive and loads its sheet list and number formats.
///
/// Returns the archive, the number format of every cell style, and the
/// (name, zip path) pairs of the worksheets in workbook order.
pub(super) fn open<W, F>(data: Vec<u8>, load_workbook: W, load_number_formats: F) -> Result<(
    ExcelArchive,
    Vec<CellType>,
    Vec<(String, String)>
), MeterSheetError>
where
    W: Fn(&mut ExcelArchive) -> Result<(Vec<(String, String)>, bool), MeterSheetError>,
    F: Fn(&mut ExcelArchive, bool) -> Result<Vec<CellType>, MeterSheetError>,
{
    let mut zip = ZipArchive::new(Cursor::new(data))?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError)?
    }

    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Maps relationship ids to worksheet paths inside the archive.
pub(super) fn load_relationships(zip: &mut ExcelArchive, path: &str) -> Result<HashMap<String, String>, MeterSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves every cell style's number format id to a cell type,
/// preferring custom formats over the built-in table.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// An encrypted OOXML workbook is a compound file holding an `EncryptedPackage` stream.
pub(super) fn is_password_protected(data: &[u8]) -> bool {
    if !data.starts_with(&CFB_SIGNATURE) {
        return false;
    }
    Cfb::new(data.to_vec())
        .map(|cfb| cfb.exists("EncryptedPackage"))
        .unwrap_or(false)
}
