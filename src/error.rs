use thiserror::Error;

/// Main error type for the meter sheet engine.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum MeterSheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),

    // Engine errors
    #[error("{0}")]
    LoadError(#[from] crate::grid::loader::LoadError),

    #[error("{0}")]
    InferenceError(#[from] crate::inference::InferenceError),
}

impl MeterSheetError {
    /// Returns the inference failure behind this error, if that is what it is.
    pub fn as_inference(&self) -> Option<&crate::inference::InferenceError> {
        match self {
            Self::InferenceError(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the load failure behind this error, if that is what it is.
    pub fn as_load(&self) -> Option<&crate::grid::loader::LoadError> {
        match self {
            Self::LoadError(error) => Some(error),
            _ => None,
        }
    }
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, MeterSheetError> {
    /// Prefixes the error message, keeping engine failures matchable.
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| match e {
            MeterSheetError::LoadError(_) | MeterSheetError::InferenceError(_) => e,
            _ => MeterSheetError::WithContextError(format!("{}: {}", message, e)),
        })
    }
}
