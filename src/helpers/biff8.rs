//! Record reader for the BIFF8 workbook stream of legacy Excel (.xls) files.
//! A record's payload may spill over into CONTINUE records; the reader stitches
//! those chunks together transparently.

use crate::error::MeterSheetError;
use crate::helpers::bytes::to_f64;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u32;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use thiserror::Error;

const CONTINUE: u16 = 60;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining in record")]
    NoEnoughDataError(usize),
}

pub(crate) struct Biff8Reader {
    buffer: Vec<u8>,
    pointer: usize,
    chunks: Vec<(usize, usize)>,
    index: usize,
    offset: usize,
}

impl Biff8Reader {
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    /// Advances to the next record and returns its type.
    pub(crate) fn next(&mut self) -> Result<Option<u16>, MeterSheetError> {
        if self.pointer + 4 > self.buffer.len() {
            return Ok(None);
        }
        self.index = 0;
        self.offset = 0;
        self.chunks.clear();

        let kind = self.get_u16_at(self.pointer)?;
        self.push_chunk()?;
        while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
            self.push_chunk()?;
        }
        Ok(Some(kind))
    }

    fn push_chunk(&mut self) -> Result<(), MeterSheetError> {
        let size = self.get_u16_at(self.pointer + 2)? as usize;
        let lower = self.pointer + 4;
        let upper = (lower + size).min(self.buffer.len());
        self.pointer = lower + size;
        self.chunks.push((lower, upper));
        Ok(())
    }

    /// Moves to an absolute stream offset, e.g. a sheet's BOF.
    pub(crate) fn goto(&mut self, pointer: usize) {
        self.pointer = pointer;
    }

    fn read_exact(&mut self, length: usize) -> Result<&[u8], MeterSheetError> {
        let (source, target) = self.read_range(length);
        if target - source == length {
            Ok(&self.buffer[source..target])
        } else {
            Err(Biff8Error::NoEnoughDataError(length))?
        }
    }

    /// Reserves up to `length` bytes of the current chunk and returns their bounds.
    fn read_range(&mut self, length: usize) -> (usize, usize) {
        if let Some((lower, upper)) = self.chunks.get(self.index).copied() {
            let source = upper.min(lower + self.offset);
            let target = upper.min(source + length);
            if source < upper {
                if target == upper {
                    self.index += 1;
                    self.offset = 0;
                } else {
                    self.offset += target - source;
                }
                return (source, target);
            }
        }
        (0, 0)
    }

    pub(crate) fn skip(&mut self, length: usize) -> Result<(), MeterSheetError> {
        if length > 0 {
            self.read_exact(length)?;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, MeterSheetError> {
        self.read_exact(1).map(|data| data[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, MeterSheetError> {
        self.read_exact(2).map(to_u16)
    }

    /// Reads a u16 counted from the end of the record (MULRK stores its last column there).
    pub(crate) fn get_u16_back(&self, offset: usize) -> Result<u16, MeterSheetError> {
        let mut offset = offset;
        for (lower, upper) in self.chunks.iter().rev() {
            if *lower + offset <= *upper {
                return self.get_u16_at(*upper - offset);
            }
            offset -= *upper - *lower;
        }
        Err(Biff8Error::NoEnoughDataError(2))?
    }

    fn get_u16_at(&self, index: usize) -> Result<u16, MeterSheetError> {
        match self.buffer.get(index..index + 2) {
            Some(bytes) => Ok(to_u16(bytes)),
            None => Err(Biff8Error::NoEnoughDataError(2))?,
        }
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, MeterSheetError> {
        self.read_exact(4).map(to_u32)
    }

    pub(crate) fn read_usize(&mut self) -> Result<usize, MeterSheetError> {
        self.read_exact(4).map(to_usize)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, MeterSheetError> {
        self.read_exact(8).map(to_u64)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, MeterSheetError> {
        self.read_exact(8).map(to_f64)
    }

    /// Decodes an RK value: a 30-bit integer or the high bits of a double,
    /// optionally scaled by 1/100.
    pub(crate) fn read_rk_number(&mut self) -> Result<f64, MeterSheetError> {
        Ok(decode_rk(self.read_u32()?))
    }

    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, MeterSheetError> {
        let mut string = String::new();
        let chars = self.read_u8()? as usize;
        self.read_string_into(chars, false, &mut string)?;
        Ok(string)
    }

    pub(crate) fn read_xl_unicode_string(&mut self) -> Result<String, MeterSheetError> {
        let mut string = String::new();
        let chars = self.read_u16()? as usize;
        self.read_string_into(chars, false, &mut string)?;
        Ok(string)
    }

    /// Reads an SST entry, following the string across CONTINUE boundaries.
    pub(crate) fn read_xl_unicode_rich_extended_string(&mut self) -> Result<String, MeterSheetError> {
        let mut string = String::new();
        let mut expected = self.read_u16()? as usize;
        let mut actual = self.read_string_into(expected, true, &mut string)?;
        while actual < expected {
            expected -= actual;
            actual = self.read_string_into(expected, false, &mut string)?;
            if actual == 0 {
                Err(Biff8Error::NoEnoughDataError(expected))?;
            }
        }
        Ok(string)
    }

    /// Appends up to `chars` characters and returns how many were available in this chunk.
    fn read_string_into(&mut self, chars: usize, is_extend: bool, content: &mut String) -> Result<usize, MeterSheetError> {
        let flag = self.read_u8()?;
        let is_high_byte = (flag & 0x1) > 0;
        let rich_string_count = if is_extend && (flag & 0x8) > 0 {
            self.read_u16()? as usize
        } else {
            0
        };
        let phonetic_size = if is_extend && (flag & 0x4) > 0 {
            self.read_usize()?
        } else {
            0
        };
        let expected = if is_high_byte { chars << 1 } else { chars };
        let (source, target) = self.read_range(expected);
        let bytes = &self.buffer[source..target];
        if is_high_byte {
            let (string, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
            content.push_str(&string);
        } else {
            // compressed strings hold the low byte of each UTF-16 code unit
            content.extend(bytes.iter().map(|byte| *byte as char));
        }
        self.skip(4 * rich_string_count)?;
        self.skip(phonetic_size)?;
        let actual = target - source;
        Ok(if is_high_byte { actual >> 1 } else { actual })
    }
}

fn decode_rk(value: u32) -> f64 {
    let is_percentage = (value & 0x01) != 0;
    let is_integer = (value & 0x02) != 0;
    let number = if is_integer {
        ((value as i32) >> 2) as f64
    } else {
        f64::from_bits(((value & 0xFFFF_FFFC) as u64) << 32)
    };
    if is_percentage {
        number / 100.0
    } else {
        number
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
