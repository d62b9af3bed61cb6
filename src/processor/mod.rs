//! Main packet processing logic

use std::io::{Read, Seek};

use crate::constants::*;
use crate::error::{DemuxError, Result};
use crate::parsers::{parse_pack_header, parse_pes_header, parse_system_header};
use crate::router::StreamRouter;
use crate::scanner::PacketScanner;
use crate::sink::{OpenSink, OutputSinks};
use crate::stats::StatsManager;
use crate::types::{OutputSummary, PacketHeader, PacketKind};

/// Bytes of start code + packet size in front of every sized packet
const PACKET_PREFIX_LEN: u64 = (START_CODE_LEN + PACKET_SIZE_LEN) as u64;

/// Result of a completed run
#[derive(Debug)]
pub struct ProcessorOutcome {
    pub stats: StatsManager,
    pub outputs: Vec<OutputSummary>,
    /// Position after the last packet handled (program end code included)
    pub consumed_bytes: u64,
    pub input_length: u64,
    pub saw_program_end: bool,
}

pub struct PacketProcessor<R, O: OpenSink> {
    scanner: PacketScanner<R>,
    router: StreamRouter<O>,
    stats: StatsManager,
    allow_missing_end: bool,
    saw_program_end: bool,
}

impl<R: Read + Seek, O: OpenSink> PacketProcessor<R, O> {
    pub fn new(scanner: PacketScanner<R>, sinks: OutputSinks<O>, allow_missing_end: bool) -> Self {
        Self {
            scanner,
            router: StreamRouter::new(sinks),
            stats: StatsManager::new(),
            allow_missing_end,
            saw_program_end: false,
        }
    }

    /// Walk packets until the program end code.
    pub fn run(&mut self) -> Result<()> {
        while let Some(header) = self.scanner.next_packet()? {
            if !self.process_packet(header)? {
                let trailing = self.scanner.length() - self.scanner.position();
                if trailing > 0 {
                    tracing::warn!(
                        offset = self.scanner.position(),
                        trailing,
                        "ignoring data after program end"
                    );
                }
                return Ok(());
            }
        }

        let offset = self.scanner.position();
        if self.allow_missing_end {
            tracing::warn!(offset, "end of file without program end code");
            Ok(())
        } else {
            Err(DemuxError::MissingProgramEnd { offset })
        }
    }

    /// Handle a single packet whose start code (and size) were just read.
    ///
    /// Returns `false` once the program end code is reached.
    pub fn process_packet(&mut self, header: PacketHeader) -> Result<bool> {
        let Some(kind) = header.kind() else {
            return Err(DemuxError::UnrecognizedPacketId {
                id: header.start_code,
                offset: header.offset,
            });
        };

        match kind {
            PacketKind::ProgramEnd => {
                tracing::debug!(offset = header.offset, "program end");
                self.saw_program_end = true;
                return Ok(false);
            }
            PacketKind::PackHeader => self.process_pack_header(&header)?,
            PacketKind::SystemHeader => self.process_system_header(&header)?,
            PacketKind::Padding => self.process_padding(&header)?,
            PacketKind::Video(_) | PacketKind::PrivateStream1 => self.process_pes(&header)?,
        }
        Ok(true)
    }

    fn process_pack_header(&mut self, header: &PacketHeader) -> Result<()> {
        tracing::debug!(offset = header.offset, "pack header");

        // The "size" bytes are the first two header bytes
        let mut block = [0u8; PACK_HEADER_LEN + 1];
        block[..PACKET_SIZE_LEN].copy_from_slice(&header.packet_size.to_be_bytes());
        block[PACKET_SIZE_LEN..]
            .copy_from_slice(self.scanner.read_bytes(PACK_HEADER_LEN + 1 - PACKET_SIZE_LEN)?);

        let clock = parse_pack_header(&block, header.offset + START_CODE_LEN as u64)?;
        let stuffing = clock.stuffing_length as u64;
        self.scanner.skip(stuffing)?;

        self.stats.record_pack(&clock);
        self.stats
            .add_overhead((START_CODE_LEN + PACK_HEADER_LEN + 1) as u64 + stuffing);
        Ok(())
    }

    fn process_system_header(&mut self, header: &PacketHeader) -> Result<()> {
        tracing::debug!(offset = header.offset, size = header.packet_size, "system header");
        let body = self.scanner.read_bytes(header.packet_size as usize)?;
        let info = parse_system_header(body, header.offset + PACKET_PREFIX_LEN)?;

        self.stats.record_system_header(info);
        self.stats
            .add_overhead(PACKET_PREFIX_LEN + header.packet_size as u64);
        Ok(())
    }

    fn process_padding(&mut self, header: &PacketHeader) -> Result<()> {
        tracing::debug!(offset = header.offset, size = header.packet_size, "padding");
        self.scanner.skip(header.packet_size as u64)?;

        self.stats.record_padding();
        self.stats
            .add_overhead(PACKET_PREFIX_LEN + header.packet_size as u64);
        Ok(())
    }

    fn process_pes(&mut self, header: &PacketHeader) -> Result<()> {
        tracing::debug!(
            offset = header.offset,
            id = %format_args!("{:08X}", header.start_code),
            size = header.packet_size,
            "PES packet"
        );
        let fixed_offset = header.offset + PACKET_PREFIX_LEN;
        let packet_size = header.packet_size as usize;
        if packet_size < PES_FIXED_HEADER_LEN {
            return Err(DemuxError::PesLengthMismatch {
                header_length: 0,
                packet_size: header.packet_size,
                offset: fixed_offset,
            });
        }

        let mut pes_head = [0u8; PES_FIXED_HEADER_LEN + u8::MAX as usize];
        pes_head[..PES_FIXED_HEADER_LEN].copy_from_slice(self.scanner.read_bytes(PES_FIXED_HEADER_LEN)?);
        let header_length = pes_head[2];
        let head_len = PES_FIXED_HEADER_LEN + header_length as usize;
        if packet_size < head_len {
            return Err(DemuxError::PesLengthMismatch {
                header_length,
                packet_size: header.packet_size,
                offset: fixed_offset,
            });
        }
        pes_head[PES_FIXED_HEADER_LEN..head_len]
            .copy_from_slice(self.scanner.read_bytes(header_length as usize)?);
        let pes = parse_pes_header(&pes_head[..head_len], fixed_offset)?;

        let payload_start = self.scanner.position();
        let payload = self.scanner.read_bytes(packet_size - head_len)?;
        let route = self.router.dispatch(header, payload, payload_start)?;

        let written = (payload.len() - route.payload_offset) as u64;
        self.stats.record_payload(route.kind, written, pes.pts);
        self.stats
            .add_overhead(PACKET_PREFIX_LEN + head_len as u64 + route.payload_offset as u64);
        Ok(())
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    pub fn position(&self) -> u64 {
        self.scanner.position()
    }

    pub fn router(&self) -> &StreamRouter<O> {
        &self.router
    }

    /// Close the outputs and hand back the run counters
    pub fn finish(self) -> Result<ProcessorOutcome> {
        let consumed_bytes = self.scanner.position();
        let input_length = self.scanner.length();
        let outputs = self.router.into_sinks().finish(consumed_bytes)?;
        Ok(ProcessorOutcome {
            stats: self.stats,
            outputs,
            consumed_bytes,
            input_length,
            saw_program_end: self.saw_program_end,
        })
    }
}
