//! Packet scanner over a seekable input.
//!
//! Tracks the absolute position itself so every error can name an offset, and
//! refuses any read or skip that would run past the known input length.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use bytes::Buf;

use crate::constants::*;
use crate::error::{DemuxError, Result};
use crate::types::{PacketHeader, PacketKind};

pub struct PacketScanner<R> {
    reader: R,
    position: u64,
    length: u64,
    scratch: Vec<u8>,
}

impl<R: Read + Seek> PacketScanner<R> {
    /// Wraps `reader`, measuring its total length and rewinding to the start.
    pub fn new(mut reader: R) -> Result<Self> {
        let length = reader
            .seek(SeekFrom::End(0))
            .and_then(|len| reader.seek(SeekFrom::Start(0)).map(|_| len))
            .map_err(|source| DemuxError::Input { offset: 0, source })?;
        Ok(Self {
            reader,
            position: 0,
            length,
            scratch: Vec::with_capacity(SCRATCH_CAPACITY),
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.length
    }

    /// Reads the next start code and, unless it is the program end code, the
    /// 2-byte size that follows. Returns `Ok(None)` at end of input.
    pub fn next_packet(&mut self) -> Result<Option<PacketHeader>> {
        if self.is_at_end() {
            return Ok(None);
        }
        let offset = self.position;
        let start_code = self.read_u32()?;
        let has_size = PacketKind::from_start_code(start_code)
            .map_or(true, |kind| kind.has_packet_size());
        let packet_size = if has_size { self.read_u16()? } else { 0 };
        Ok(Some(PacketHeader {
            start_code,
            packet_size,
            offset,
        }))
    }

    /// Reads exactly `len` bytes into the scratch buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.ensure_available(len as u64)?;
        let offset = self.position;
        self.scratch.clear();
        self.scratch.resize(len, 0);
        if let Err(err) = self.reader.read_exact(&mut self.scratch) {
            return Err(eof_as_truncated(err, offset, len as u64));
        }
        self.position += len as u64;
        Ok(&self.scratch)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = self.read_bytes(PACKET_SIZE_LEN)?;
        Ok(buf.get_u16())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = self.read_bytes(START_CODE_LEN)?;
        Ok(buf.get_u32())
    }

    /// Advances `len` bytes without reading them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        self.ensure_available(len)?;
        self.reader
            .seek_relative(len as i64)
            .map_err(|source| DemuxError::Input {
                offset: self.position,
                source,
            })?;
        self.position += len;
        Ok(())
    }

    fn ensure_available(&self, len: u64) -> Result<()> {
        if self.position + len > self.length {
            return Err(DemuxError::Truncated {
                offset: self.position,
                needed: len,
            });
        }
        Ok(())
    }
}

fn eof_as_truncated(err: std::io::Error, offset: u64, needed: u64) -> DemuxError {
    if err.kind() == ErrorKind::UnexpectedEof {
        DemuxError::Truncated { offset, needed }
    } else {
        DemuxError::Input { offset, source: err }
    }
}
