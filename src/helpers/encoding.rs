//! Text decoding for delimited exports of unknown origin.
use encoding_rs::UTF_8;
use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes bytes with the first encoding that accepts them:
/// UTF-8 with BOM, UTF-8, Windows-1252, then Latin-1 (which accepts anything).
///
/// Returns the text and the label of the encoding used.
pub(crate) fn decode_text(data: &[u8]) -> (String, &'static str) {
    if let Some(rest) = data.strip_prefix(UTF8_BOM) {
        if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(rest) {
            return (text.into_owned(), "utf-8-sig");
        }
    }
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(data) {
        return (text.into_owned(), "utf-8");
    }
    if let Some(text) = WINDOWS_1252.decode_without_bom_handling_and_without_replacement(data) {
        return (text.into_owned(), "windows-1252");
    }
    // unreachable with the WHATWG Windows-1252 table, which maps every byte
    (data.iter().map(|byte| *byte as char).collect(), "latin-1")
}
