//! OLE Compound File Binary (CFB) container used by legacy Excel (.xls) workbooks.
//! The whole container is held in memory; streams are reassembled by walking
//! the (mini) file allocation table chains.

use crate::error::MeterSheetError;
use crate::helpers::bytes::to_u16;
use crate::helpers::bytes::to_u64;
use crate::helpers::bytes::to_usize;
use crate::helpers::bytes::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use thiserror::Error;

/// Sector ids above this value are markers (free, end of chain, FAT, DIFAT).
const MAX_REG_SECT: usize = 0xFFFFFFFB;

/// Streams smaller than this live in the mini stream.
const MINI_STREAM_CUTOFF: usize = 4096;

/// Signature shared by every compound file.
pub(crate) const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("Sector chain points outside the file at sector '{0}'")]
    SectorChainError(usize),

    #[error("Empty root directory")]
    RootDirectoryError,
}

pub(crate) struct Cfb {
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    /// Parses a compound file from its raw bytes.
    pub(crate) fn new(data: Vec<u8>) -> Result<Cfb, MeterSheetError> {
        if data.len() < 512 {
            Err(CfbError::FileFormatError)?;
        }
        let header = Header::new(&data[..512])?;
        let sectors = Sectors { size: header.sector_size()?, data, header_offset: true };
        let file_allocation_table = Self::load_file_allocation_table(&sectors, &header)?;
        let directories = Self::load_directories(&file_allocation_table, &sectors, header.directory_start)?;
        let mini_file_allocation_table = if header.mini_file_allocation_table_count > 0 {
            let bytes = Self::read_chain(&file_allocation_table, &sectors, header.mini_file_allocation_table_start)?;
            to_usize_iter(&bytes).collect()
        } else {
            Vec::new()
        };
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => {
                let mut data = Self::read_chain(&file_allocation_table, &sectors, root.start)?;
                data.truncate(root.size);
                Sectors { data, size: 64, header_offset: false }
            }
            None => Sectors { data: Vec::new(), size: 64, header_offset: false },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads a whole stream by name.
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, MeterSheetError> {
        let Some(directory) = self.directories.get(name) else {
            return Ok(None);
        };
        let mut bytes = if directory.size < MINI_STREAM_CUTOFF {
            Self::read_chain(&self.mini_file_allocation_table, &self.mini_sectors, directory.start)?
        } else {
            Self::read_chain(&self.file_allocation_table, &self.sectors, directory.start)?
        };
        bytes.truncate(directory.size);
        Ok(Some(bytes))
    }

    /// Collects the FAT sectors listed in the header DIFAT and any chained DIFAT sectors.
    fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, MeterSheetError> {
        let mut fat_sectors: Vec<usize> = to_usize_iter(&sectors.data[76..512]).collect();
        let mut index = header.difat_start;
        let mut visited = 0usize;
        while index < MAX_REG_SECT {
            visited += 1;
            if visited > header.difat_count.max(1) {
                Err(CfbError::SectorChainError(index))?;
            }
            let mut entries: Vec<usize> = to_usize_iter(sectors.get(index)?).collect();
            index = entries.pop().ok_or(CfbError::SectorChainError(index))?;
            fat_sectors.extend(entries);
        }

        let mut file_allocation_table = Vec::new();
        for index in fat_sectors.into_iter().filter(|index| *index < MAX_REG_SECT) {
            file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
        }
        Ok(file_allocation_table)
    }

    fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, start: usize) -> Result<HashMap<String, Directory>, MeterSheetError> {
        let bytes = Self::read_chain(file_allocation_table, sectors, start)?;
        let directories: HashMap<String, Directory> = bytes
            .chunks_exact(128)
            .map(Directory::new)
            .filter(|(name, _)| !name.is_empty())
            .collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    /// Follows a sector chain, refusing chains that loop or leave the table.
    fn read_chain(table: &[usize], sectors: &Sectors, start: usize) -> Result<Vec<u8>, MeterSheetError> {
        let mut content = Vec::new();
        let mut index = start;
        let mut steps = 0usize;
        while index < MAX_REG_SECT {
            steps += 1;
            if steps > table.len() {
                Err(CfbError::SectorChainError(index))?;
            }
            content.extend_from_slice(sectors.get(index)?);
            index = *table.get(index).ok_or(CfbError::SectorChainError(index))?;
        }
        Ok(content)
    }
}

struct Sectors {
    data: Vec<u8>,
    size: usize,
    /// Regular sectors are numbered after the 512-byte header; mini sectors are not.
    header_offset: bool,
}

impl Sectors {
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let first = if self.header_offset { index + 1 } else { index };
        let source = first * self.size;
        let target = self.data.len().min(source + self.size);
        if source >= target {
            return Err(CfbError::SectorChainError(index));
        }
        Ok(&self.data[source..target])
    }
}

struct Header {
    major_version: u16,
    sector_shift: u16,
    directory_start: usize,
    mini_file_allocation_table_start: usize,
    mini_file_allocation_table_count: usize,
    difat_start: usize,
    difat_count: usize,
}

impl Header {
    fn new(data: &[u8]) -> Result<Self, MeterSheetError> {
        if data[0..8] != CFB_SIGNATURE {
            Err(CfbError::OleSignatureError)?;
        }
        Ok(Header {
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            directory_start: to_usize(&data[48..52]),
            mini_file_allocation_table_start: to_usize(&data[60..64]),
            mini_file_allocation_table_count: to_usize(&data[64..68]),
            difat_start: to_usize(&data[68..72]),
            difat_count: to_usize(&data[72..76]),
        })
    }

    fn sector_size(&self) -> Result<usize, MeterSheetError> {
        match (self.major_version, self.sector_shift) {
            (3, 0x0009) => Ok(512),
            // version 4 pads the header out to a full 4096-byte sector
            (4, 0x000C) => Ok(4096),
            (version, shift) => Err(CfbError::SectorSizeError(version, shift))?,
        }
    }
}

struct Directory {
    start: usize,
    size: usize,
}

impl Directory {
    fn new(bytes: &[u8]) -> (String, Directory) {
        let length = (to_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..length]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };
        let start = to_usize(&bytes[116..120]);
        // high dword is garbage in version 3 files
        let size = (to_u64(&bytes[120..128]) & 0xFFFF_FFFF) as usize;
        (name, Directory { start, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_input() {
        let error = Cfb::new(vec![0u8; 100]).err().unwrap();
        assert!(matches!(error, MeterSheetError::CfbHelperError(CfbError::FileFormatError)));
    }

    #[test]
    fn rejects_foreign_signature() {
        let error = Cfb::new(vec![0u8; 1024]).err().unwrap();
        assert!(matches!(error, MeterSheetError::CfbHelperError(CfbError::OleSignatureError)));
    }

    #[test]
    fn rejects_unknown_sector_size() {
        let mut data = vec![0u8; 1024];
        data[..8].copy_from_slice(&CFB_SIGNATURE);
        data[26] = 3;
        data[30] = 0x0C;
        let error = Cfb::new(data).err().unwrap();
        assert!(matches!(error, MeterSheetError::CfbHelperError(CfbError::SectorSizeError(3, 0x0C))));
    }

    #[test]
    fn mini_sectors_are_not_header_offset() {
        let sectors = Sectors { data: (0..128).collect(), size: 64, header_offset: false };
        assert_eq!(sectors.get(1).unwrap()[0], 64);
        assert!(sectors.get(2).is_err());
    }
}
