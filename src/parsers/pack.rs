//! Pack header decoder

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::PACK_HEADER_LEN;
use crate::error::{DemuxError, Result};
use crate::types::PackClock;

/// Decode a pack header.
///
/// `buf` holds the 9 header bytes following the start code plus the
/// stuffing-length byte. The stuffing bytes themselves are skipped by the caller.
pub fn parse_pack_header(buf: &[u8], offset: u64) -> Result<PackClock> {
    if buf.len() < PACK_HEADER_LEN + 1 {
        return Err(DemuxError::Truncated {
            offset,
            needed: (PACK_HEADER_LEN + 1) as u64,
        });
    }
    let mut br = BitReader::endian(&buf[..PACK_HEADER_LEN + 1], BigEndian);

    br.skip(2)?; // '01'
    let scr_high = br.read::<3, u64>()?;
    br.skip(1)?;
    let scr_mid = br.read::<15, u64>()?;
    br.skip(1)?;
    let scr_low = br.read::<15, u64>()?;
    br.skip(1)?;
    let scr_ext = br.read::<9, u16>()?;
    br.skip(1)?;
    let mux_rate = br.read::<22, u32>()?;
    br.skip(2)?;

    br.skip(5)?; // reserved
    let stuffing_length = br.read::<3, u8>()?;

    let clock = PackClock {
        scr: (scr_high << 30) | (scr_mid << 15) | scr_low,
        scr_ext,
        mux_rate,
        stuffing_length,
    };
    tracing::trace!(
        scr = clock.scr,
        scr_ext = clock.scr_ext,
        mux_rate = clock.mux_rate,
        stuffing = clock.stuffing_length,
        "pack header"
    );
    Ok(clock)
}
