//! Little-endian readers over byte slices, shared by the CFB and BIFF8 parsers.
//! Callers slice exactly the width they read, so the fixed-size conversions cannot fail.

/// Converts a byte slice into an iterator of sector ids (32-bit little-endian).
/// A trailing partial chunk is ignored.
pub(crate) fn to_usize_iter(bytes: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize)
}

#[inline]
pub(crate) fn to_f64(s: &[u8]) -> f64 {
    f64::from_bits(to_u64(s))
}

#[inline]
pub(crate) fn to_u64(s: &[u8]) -> u64 {
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(&s[..8]);
    u64::from_le_bytes(buffer)
}

#[inline]
pub(crate) fn to_u32(s: &[u8]) -> u32 {
    u32::from_le_bytes([s[0], s[1], s[2], s[3]])
}

#[inline]
pub(crate) fn to_u16(s: &[u8]) -> u16 {
    u16::from_le_bytes([s[0], s[1]])
}

#[inline]
pub(crate) fn to_usize(s: &[u8]) -> usize {
    to_u32(s) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_integers() {
        assert_eq!(to_u16(&[0x34, 0x12]), 0x1234);
        assert_eq!(to_u32(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(to_usize(&[0x01, 0x00, 0x00, 0x00, 0xFF]), 1);
    }

    #[test]
    fn reads_double() {
        assert_eq!(to_f64(&12.5f64.to_le_bytes()), 12.5);
    }

    #[test]
    fn ignores_trailing_partial_sector_id() {
        let ids: Vec<usize> = to_usize_iter(&[1, 0, 0, 0, 2, 0, 0, 0, 3]).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
