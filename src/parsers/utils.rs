//! Common parsing utilities

use bitstream_io::{BigEndian, BitRead, BitReader};

/// Decode a 5-byte PTS/DTS field.
///
/// Layout: `magic[3:0] ts[32:30] marker ts[29:15] marker ts[14:0] marker`.
/// Marker bits are not checked. Returns the magic nibble and the 33-bit value.
pub fn read_timestamp(field: &[u8]) -> std::io::Result<(u8, u64)> {
    let mut br = BitReader::endian(field, BigEndian);
    let magic = br.read::<4, u8>()?;
    let high = br.read::<3, u64>()?;
    br.skip(1)?;
    let mid = br.read::<15, u64>()?;
    br.skip(1)?;
    let low = br.read::<15, u64>()?;
    Ok((magic, (high << 30) | (mid << 15) | low))
}

/// Encode a 33-bit timestamp with the given magic nibble (test fixtures)
#[cfg(test)]
pub fn write_timestamp(magic: u8, ts: u64) -> [u8; 5] {
    [
        (magic << 4) | (((ts >> 30) as u8 & 0x07) << 1) | 1,
        (ts >> 22) as u8,
        (((ts >> 15) as u8 & 0x7F) << 1) | 1,
        (ts >> 7) as u8,
        ((ts as u8 & 0x7F) << 1) | 1,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timestamp_fixture() {
        // magic 0010, ts = 0x1_2345_6789
        // bits 32..30 = 0b100, 29..15 = 0x468A, 14..0 = 0x6789
        let field = [0x29, 0x8D, 0x15, 0xCF, 0x13];
        let (magic, ts) = read_timestamp(&field).unwrap();
        assert_eq!(magic, 0b0010);
        assert_eq!(ts, 0x1_2345_6789);
    }

    #[test]
    fn test_read_timestamp_extremes() {
        let (magic, ts) = read_timestamp(&write_timestamp(0b0011, (1 << 33) - 1)).unwrap();
        assert_eq!(magic, 0b0011);
        assert_eq!(ts, (1 << 33) - 1);

        let (magic, ts) = read_timestamp(&write_timestamp(0b0001, 0)).unwrap();
        assert_eq!(magic, 0b0001);
        assert_eq!(ts, 0);
    }

    #[test]
    fn test_read_timestamp_short_field() {
        assert!(read_timestamp(&[0x21, 0x00, 0x01]).is_err());
    }
}
