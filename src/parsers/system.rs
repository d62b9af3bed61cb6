//! System header decoder

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::{EXTENDED_STREAM_ID, STREAM_BOUND_LEN, SYSTEM_HEADER_FIXED_LEN};
use crate::error::{DemuxError, Result};
use crate::types::{StreamBound, SystemHeaderInfo};

/// Decode a system header body of `packet_size` bytes starting at `offset`.
///
/// The container carries a single video stream, so bound entries are read as
/// 2-byte records from offset 6. The 24-bit extended stream id form is rejected.
pub fn parse_system_header(buf: &[u8], offset: u64) -> Result<SystemHeaderInfo> {
    if buf.len() < SYSTEM_HEADER_FIXED_LEN {
        return Err(DemuxError::SystemHeaderTooShort {
            len: buf.len() as u16,
            offset,
        });
    }

    let mut br = BitReader::endian(&buf[..SYSTEM_HEADER_FIXED_LEN], BigEndian);
    br.skip(1)?;
    let rate_bound = br.read::<22, u32>()?;
    br.skip(1)?;
    let audio_bound = br.read::<6, u8>()?;
    let fixed_flag = br.read_bit()?;
    let csps_flag = br.read_bit()?;
    let audio_lock_flag = br.read_bit()?;
    let video_lock_flag = br.read_bit()?;
    br.skip(1)?;
    let video_bound = br.read::<5, u8>()?;
    let packet_rate_restriction_flag = br.read_bit()?;

    let entries = &buf[SYSTEM_HEADER_FIXED_LEN..];
    if entries.first() == Some(&EXTENDED_STREAM_ID) {
        return Err(DemuxError::UnsupportedSystemHeader {
            stream_id: EXTENDED_STREAM_ID,
            offset: offset + SYSTEM_HEADER_FIXED_LEN as u64,
        });
    }

    let mut stream_bounds = Vec::with_capacity(entries.len() / STREAM_BOUND_LEN);
    for entry in entries.chunks_exact(STREAM_BOUND_LEN) {
        let mut br = BitReader::endian(entry, BigEndian);
        br.skip(2)?;
        let scale = br.read_bit()?;
        let size_bound = br.read::<13, u16>()?;
        stream_bounds.push(StreamBound { scale, size_bound });
    }

    let info = SystemHeaderInfo {
        rate_bound,
        audio_bound,
        fixed_flag,
        csps_flag,
        audio_lock_flag,
        video_lock_flag,
        video_bound,
        packet_rate_restriction_flag,
        stream_bounds,
    };
    tracing::trace!(
        rate_bound,
        audio_bound,
        fixed_flag,
        csps_flag,
        audio_lock_flag,
        video_lock_flag,
        video_bound,
        packet_rate_restriction_flag,
        streams = info.stream_bounds.len(),
        "system header"
    );
    for (idx, bound) in info.stream_bounds.iter().enumerate() {
        tracing::trace!(stream = idx, scale = bound.scale, size_bound = bound.size_bound, "P-STD bound");
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED: [u8; 6] = [0x80, 0xC4, 0xE1, 0x05, 0xE1, 0x7F];

    #[test]
    fn test_fixed_fields() {
        let info = parse_system_header(&FIXED, 0).unwrap();
        assert_eq!(info.rate_bound, 25200);
        assert_eq!(info.audio_bound, 1);
        assert!(!info.fixed_flag);
        assert!(info.csps_flag);
        assert!(info.audio_lock_flag);
        assert!(info.video_lock_flag);
        assert_eq!(info.video_bound, 1);
        assert!(!info.packet_rate_restriction_flag);
        assert!(info.stream_bounds.is_empty());
    }

    #[test]
    fn test_stream_bounds() {
        let mut buf = FIXED.to_vec();
        buf.extend_from_slice(&[0xE0, 0xE0, 0xE8, 0xBD, 0x1F, 0xFF]);
        let info = parse_system_header(&buf, 0).unwrap();
        assert_eq!(
            info.stream_bounds,
            vec![
                StreamBound { scale: true, size_bound: 0x00E0 },
                StreamBound { scale: true, size_bound: 0x08BD },
                StreamBound { scale: false, size_bound: 0x1FFF },
            ]
        );
    }

    #[test]
    fn test_odd_trailing_byte_ignored() {
        let mut buf = FIXED.to_vec();
        buf.extend_from_slice(&[0xE0, 0x20, 0xFF]);
        let info = parse_system_header(&buf, 0).unwrap();
        assert_eq!(info.stream_bounds.len(), 1);
    }

    #[test]
    fn test_extended_form_rejected() {
        let mut buf = FIXED.to_vec();
        buf.extend_from_slice(&[0xB7, 0xE0, 0xE8]);
        let err = parse_system_header(&buf, 0x10).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::UnsupportedSystemHeader { stream_id: 0xB7, offset: 0x16 }
        ));
    }

    #[test]
    fn test_too_short() {
        let err = parse_system_header(&FIXED[..4], 0).unwrap_err();
        assert!(matches!(err, DemuxError::SystemHeaderTooShort { len: 4, .. }));
    }
}
