//! PES optional header decoder
//!
//! Layout after the packet size:
//!
//! ```text
//! '10' scrambling(2) priority alignment copyright original
//! PTS_DTS(2) ESCR ES_rate DSM_trick_mode additional_copy_info CRC extension
//! header_length(8)
//! [PTS 5] [DTS 5] [DSM trick mode 1] [PES extension ...] [stuffing]
//! ```

use bitstream_io::{BigEndian, BitRead, BitReader};

use super::utils::read_timestamp;
use crate::constants::*;
use crate::error::{DemuxError, Result};
use crate::types::{PesExtension, PesHeader, SequenceCounter, StdBuffer};

/// Walks the optional fields without crossing `header_length`
struct FieldCursor<'a> {
    fields: &'a [u8],
    pos: usize,
    base: u64,
    header_length: u8,
}

impl<'a> FieldCursor<'a> {
    fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.pos + len > self.fields.len() {
            return Err(DemuxError::PesHeaderOverflow {
                field,
                header_length: self.header_length,
                offset: self.offset(),
            });
        }
        let out = &self.fields[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn unsupported(&self, field: &'static str) -> DemuxError {
        DemuxError::UnsupportedField {
            field,
            offset: self.offset(),
        }
    }
}

/// Decode the PES optional header.
///
/// `buf` holds the 3 fixed bytes followed by `header_length` bytes; `offset` is
/// the absolute position of `buf[0]`.
pub fn parse_pes_header(buf: &[u8], offset: u64) -> Result<PesHeader> {
    if buf.len() < PES_FIXED_HEADER_LEN {
        return Err(DemuxError::Truncated {
            offset,
            needed: PES_FIXED_HEADER_LEN as u64,
        });
    }

    let mut br = BitReader::endian(&buf[..2], BigEndian);
    br.skip(2)?; // '10'
    let mut header = PesHeader {
        scrambling_control: br.read::<2, u8>()?,
        priority: br.read_bit()?,
        data_alignment: br.read_bit()?,
        copyright: br.read_bit()?,
        original: br.read_bit()?,
        pts_dts_flags: br.read::<2, u8>()?,
        escr_flag: br.read_bit()?,
        es_rate_flag: br.read_bit()?,
        dsm_trick_mode_flag: br.read_bit()?,
        additional_copy_info_flag: br.read_bit()?,
        crc_flag: br.read_bit()?,
        extension_flag: br.read_bit()?,
        header_length: buf[2],
        ..PesHeader::default()
    };
    tracing::trace!(?header, "PES header flags");

    let available = &buf[PES_FIXED_HEADER_LEN..];
    let end = (header.header_length as usize).min(available.len());
    let mut cursor = FieldCursor {
        fields: &available[..end],
        pos: 0,
        base: offset + PES_FIXED_HEADER_LEN as u64,
        header_length: header.header_length,
    };

    if header.pts_dts_flags == 0b01 {
        return Err(DemuxError::InvalidPtsDtsFlags {
            flags: header.pts_dts_flags,
            offset: offset + 1,
        });
    }

    if header.pts_dts_flags & 0b10 != 0 {
        let expected = if header.pts_dts_flags == 0b11 {
            PTS_WITH_DTS_MAGIC
        } else {
            PTS_ONLY_MAGIC
        };
        header.pts = Some(read_checked_timestamp(&mut cursor, "PTS", expected)?);
    }
    if header.pts_dts_flags & 0b01 != 0 {
        header.dts = Some(read_checked_timestamp(&mut cursor, "DTS", DTS_MAGIC)?);
    }

    if header.escr_flag {
        return Err(cursor.unsupported("ESCR"));
    }
    if header.es_rate_flag {
        return Err(cursor.unsupported("ES_rate"));
    }
    if header.dsm_trick_mode_flag {
        header.dsm_trick_mode = Some(cursor.take(1, "DSM_trick_mode")?[0]);
    }
    if header.additional_copy_info_flag {
        return Err(cursor.unsupported("additional_copy_info"));
    }
    if header.crc_flag {
        return Err(cursor.unsupported("previous_PES_packet_CRC"));
    }

    if header.extension_flag {
        header.extension = Some(parse_extension(&mut cursor)?);
    }

    tracing::trace!(
        pts = ?header.pts,
        dts = ?header.dts,
        stuffing = cursor.fields.len() - cursor.pos,
        "PES optional fields"
    );
    Ok(header)
}

fn read_checked_timestamp(
    cursor: &mut FieldCursor<'_>,
    field: &'static str,
    expected: u8,
) -> Result<u64> {
    let offset = cursor.offset();
    let (magic, ts) = read_timestamp(cursor.take(TIMESTAMP_LEN, field)?)?;
    if magic != expected {
        return Err(DemuxError::TimestampMagic {
            field,
            found: magic,
            expected,
            offset,
        });
    }
    Ok(ts)
}

fn parse_extension(cursor: &mut FieldCursor<'_>) -> Result<PesExtension> {
    let flags = cursor.take(1, "PES_extension")?[0];
    let mut ext = PesExtension {
        private_data_flag: flags & 0x80 != 0,
        pack_header_field_flag: flags & 0x40 != 0,
        seq_counter_flag: flags & 0x20 != 0,
        std_buffer_flag: flags & 0x10 != 0,
        ..PesExtension::default()
    };
    // PS2 streams never set PES_extension_flag_2
    if flags & 0x01 != 0 {
        return Err(cursor.unsupported("PES_extension_flag_2"));
    }

    if ext.private_data_flag {
        let data = cursor.take(2, "PES_private_data")?;
        ext.private_data = Some(u16::from_be_bytes([data[0], data[1]]));
    }
    if ext.pack_header_field_flag {
        ext.pack_field_length = Some(cursor.take(1, "pack_field_length")?[0]);
    }
    if ext.seq_counter_flag {
        let mut br = BitReader::endian(cursor.take(2, "program_packet_sequence_counter")?, BigEndian);
        br.skip(1)?;
        let counter = br.read::<7, u8>()?;
        br.skip(1)?;
        let is_mpeg2 = br.read_bit()?;
        let stuffing_length = br.read::<6, u8>()?;
        ext.sequence_counter = Some(SequenceCounter {
            counter,
            is_mpeg2,
            stuffing_length,
        });
    }
    if ext.std_buffer_flag {
        let mut br = BitReader::endian(cursor.take(2, "P-STD_buffer")?, BigEndian);
        br.skip(2)?; // '01'
        let scale = br.read_bit()?;
        let size = br.read::<13, u16>()?;
        ext.std_buffer = Some(StdBuffer { scale, size });
    }

    tracing::trace!(?ext, "PES extension");
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::utils::write_timestamp;

    fn header(flags: u8, fields: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x81, flags, fields.len() as u8];
        buf.extend_from_slice(fields);
        buf
    }

    #[test]
    fn test_flags_only() {
        let h = parse_pes_header(&[0xB5, 0x00, 0x00], 0).unwrap();
        assert_eq!(h.scrambling_control, 0b11);
        assert!(!h.priority);
        assert!(h.data_alignment);
        assert!(!h.copyright);
        assert!(h.original);
        assert_eq!(h.pts_dts_flags, 0);
        assert_eq!(h.header_length, 0);
        assert!(h.pts.is_none() && h.dts.is_none() && h.extension.is_none());
    }

    #[test]
    fn test_pts_only() {
        let buf = header(0x80, &[0x29, 0x8D, 0x15, 0xCF, 0x13]);
        let h = parse_pes_header(&buf, 0).unwrap();
        assert_eq!(h.pts, Some(0x1_2345_6789));
        assert_eq!(h.dts, None);
    }

    #[test]
    fn test_pts_magic_mismatch() {
        // 0b0011 is only valid when a DTS follows
        let buf = header(0x80, &write_timestamp(0b0011, 1234));
        let err = parse_pes_header(&buf, 0x100).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::TimestampMagic { field: "PTS", found: 0b0011, expected: 0b0010, offset: 0x103 }
        ));
    }

    #[test]
    fn test_pts_and_dts() {
        let mut fields = write_timestamp(0b0011, 93_003).to_vec();
        fields.extend_from_slice(&write_timestamp(0b0001, 90_000));
        let h = parse_pes_header(&header(0xC0, &fields), 0).unwrap();
        assert_eq!(h.pts, Some(93_003));
        assert_eq!(h.dts, Some(90_000));
    }

    #[test]
    fn test_dts_magic_mismatch() {
        let mut fields = write_timestamp(0b0011, 93_003).to_vec();
        fields.extend_from_slice(&write_timestamp(0b0011, 90_000));
        let err = parse_pes_header(&header(0xC0, &fields), 0).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::TimestampMagic { field: "DTS", expected: 0b0001, offset: 8, .. }
        ));
    }

    #[test]
    fn test_dts_without_pts() {
        let err = parse_pes_header(&header(0x40, &write_timestamp(0b0001, 5)), 0).unwrap_err();
        assert!(matches!(err, DemuxError::InvalidPtsDtsFlags { flags: 0b01, offset: 1 }));

        // rejected before any field is read
        let err = parse_pes_header(&header(0x40, &[]), 0).unwrap_err();
        assert!(matches!(err, DemuxError::InvalidPtsDtsFlags { .. }));
    }

    #[test]
    fn test_unsupported_fields() {
        let cases: [(u8, &str); 4] = [
            (0x20, "ESCR"),
            (0x10, "ES_rate"),
            (0x04, "additional_copy_info"),
            (0x02, "previous_PES_packet_CRC"),
        ];
        for (flags, name) in cases {
            let err = parse_pes_header(&header(flags, &[0xFF; 8]), 0).unwrap_err();
            match err {
                DemuxError::UnsupportedField { field, offset } => {
                    assert_eq!(field, name);
                    assert_eq!(offset, 3);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsupported_after_pts() {
        let buf = header(0xA0, &write_timestamp(0b0010, 7));
        let err = parse_pes_header(&buf, 0).unwrap_err();
        assert!(matches!(err, DemuxError::UnsupportedField { field: "ESCR", offset: 8 }));
    }

    #[test]
    fn test_extension_cascade() {
        let fields = [
            0xFE, // all four sub-flags, reserved bits set
            0x12, 0x34, // private data
            0x07, // pack field length
            0xD5, 0xCA, // counter 0x55, mpeg2, stuffing 10
            0x6A, 0xBC, // scale 1, size 0x0ABC
        ];
        let h = parse_pes_header(&header(0x01, &fields), 0).unwrap();
        let ext = h.extension.unwrap();
        assert!(ext.private_data_flag && ext.pack_header_field_flag);
        assert!(ext.seq_counter_flag && ext.std_buffer_flag);
        assert_eq!(ext.private_data, Some(0x1234));
        assert_eq!(ext.pack_field_length, Some(7));
        assert_eq!(
            ext.sequence_counter,
            Some(SequenceCounter { counter: 0x55, is_mpeg2: true, stuffing_length: 10 })
        );
        assert_eq!(ext.std_buffer, Some(StdBuffer { scale: true, size: 0x0ABC }));
    }

    #[test]
    fn test_dsm_trick_mode_keeps_alignment() {
        let fields = [0x8C, 0x10, 0x6A, 0xBC];
        let h = parse_pes_header(&header(0x09, &fields), 0).unwrap();
        assert_eq!(h.dsm_trick_mode, Some(0x8C));
        let ext = h.extension.unwrap();
        assert_eq!(ext.private_data, None);
        assert_eq!(ext.std_buffer, Some(StdBuffer { scale: true, size: 0x0ABC }));
    }

    #[test]
    fn test_extension_flag_2_rejected() {
        let err = parse_pes_header(&header(0x01, &[0x01, 0x00]), 0).unwrap_err();
        assert!(matches!(err, DemuxError::UnsupportedField { field: "PES_extension_flag_2", .. }));
    }

    #[test]
    fn test_stuffing_after_fields() {
        let mut fields = write_timestamp(0b0010, 42).to_vec();
        fields.extend_from_slice(&[0xFF; 6]);
        let h = parse_pes_header(&header(0x80, &fields), 0).unwrap();
        assert_eq!(h.pts, Some(42));
        assert_eq!(h.header_length, 11);
    }

    #[test]
    fn test_field_overflow() {
        let err = parse_pes_header(&header(0x80, &[0x21, 0x00, 0x01]), 0).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::PesHeaderOverflow { field: "PTS", header_length: 3, offset: 3 }
        ));
    }
}
