//! Delimited text: encoding detection, delimiter sniffing and record parsing.
use crate::error::MeterSheetError;
use crate::grid::Grid;
use crate::grid::Value;
use crate::helpers::encoding::decode_text;
use crate::options::Options;
use csv::ReaderBuilder;
use std::collections::HashMap;
use tracing::debug;

/// Candidates in tie-break order. Comma comes last because it doubles as a
/// decimal separator in many European exports.
const CANDIDATES: [u8; 4] = [b';', b'\t', b'|', b','];

/// A decoded and parsed delimited file.
pub(crate) struct DelimitedGrid {
    pub(crate) grid: Grid,
    pub(crate) encoding: &'static str,
    pub(crate) delimiter: u8,
}

pub(crate) fn read_delimited(data: &[u8], options: &Options) -> Result<DelimitedGrid, MeterSheetError> {
    let (text, encoding) = decode_text(data);
    let delimiter = sniff_delimiter(sample(&text, options.sample_bytes));
    debug!(encoding, delimiter = %(delimiter as char).escape_default(), "decoded delimited text");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if options.is_null(field) {
                        Value::Empty
                    } else {
                        Value::Text(field.to_owned())
                    }
                })
                .collect::<Vec<Value>>(),
        );
    }
    Ok(DelimitedGrid { grid: Grid::new(rows), encoding, delimiter })
}

/// The leading `limit` bytes of text, cut back to a char boundary.
/// A partial last line is dropped unless it is the only line.
pub(crate) fn sample(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];
    match head.rfind('\n') {
        Some(position) => &head[..position],
        None => head,
    }
}

/// Picks the delimiter whose per-line count is most consistent across the sample.
///
/// For each candidate the modal count over non-blank lines is found; candidates
/// whose mode is zero are out, and the rest are ranked by how many lines hit the
/// mode. Without any consistent candidate the most frequent one wins, or comma.
pub(crate) fn sniff_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample.lines().filter(|line| !line.trim().is_empty()).collect();
    let mut best: Option<(u8, usize)> = None;
    for candidate in CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|line| count_unquoted(line, candidate)).collect();
        let Some(mode) = mode(&counts) else {
            continue;
        };
        if mode == 0 {
            continue;
        }
        let support = counts.iter().filter(|count| **count == mode).count();
        if best.map_or(true, |(_, best_support)| support > best_support) {
            best = Some((candidate, support));
        }
    }
    best.map(|(delimiter, _)| delimiter).unwrap_or_else(|| most_frequent(sample))
}

/// Occurrences of `delimiter` outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent value; ties go to the larger value.
fn mode(counts: &[usize]) -> Option<usize> {
    let mut frequencies: HashMap<usize, usize> = HashMap::new();
    for count in counts {
        *frequencies.entry(*count).or_default() += 1;
    }
    frequencies
        .into_iter()
        .max_by_key(|(count, frequency)| (*frequency, *count))
        .map(|(count, _)| count)
}

fn most_frequent(sample: &str) -> u8 {
    let mut best = (b',', count_unquoted(sample, b','));
    for candidate in CANDIDATES {
        let count = count_unquoted(sample, candidate);
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
