//! Error types for PSS demuxing.
//!
//! Every format error carries the absolute byte offset where it was detected.

use thiserror::Error;

/// Errors raised while demuxing a PSS container. All of them are fatal.
#[derive(Error, Debug)]
pub enum DemuxError {
    /// I/O failure with no stream position, such as opening the input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Read or seek on the input failed for a reason other than end of file.
    #[error("0x{offset:08X}: input read failed")]
    Input {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Opening, writing or flushing an output failed.
    ///
    /// `offset` is the input position of the payload being written.
    #[error("0x{offset:08X}: cannot {action} output {path}")]
    Sink {
        action: &'static str,
        path: String,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// End of input reached in the middle of a packet.
    #[error("0x{offset:08X}: unexpected end of file ({needed} more bytes needed)")]
    Truncated {
        /// Offset of the read that could not be satisfied.
        offset: u64,
        /// Bytes the read required.
        needed: u64,
    },

    /// End of input reached without a program end code.
    #[error("0x{offset:08X}: end of file without program end code")]
    MissingProgramEnd { offset: u64 },

    /// Start code outside the set the demuxer understands.
    #[error("0x{offset:08X}: unrecognized packet id {id:08X}")]
    UnrecognizedPacketId { id: u32, offset: u64 },

    /// Recognized PES header field that is not implemented.
    #[error("0x{offset:08X}: unsupported PES field: {field}")]
    UnsupportedField { field: &'static str, offset: u64 },

    /// PTS or DTS marker nibble does not match the flags.
    #[error("0x{offset:08X}: invalid {field} magic {found:#06b} (expected {expected:#06b})")]
    TimestampMagic {
        field: &'static str,
        found: u8,
        expected: u8,
        offset: u64,
    },

    /// `PTS_DTS_flags` value 0b01 (DTS without PTS).
    #[error("0x{offset:08X}: invalid PTS DTS flags {flags:#04b}")]
    InvalidPtsDtsFlags { flags: u8, offset: u64 },

    /// Optional PES fields run past the declared header length.
    #[error("0x{offset:08X}: PES header field {field} overflows header length {header_length}")]
    PesHeaderOverflow {
        field: &'static str,
        header_length: u8,
        offset: u64,
    },

    /// Declared PES header length exceeds the packet size.
    #[error("0x{offset:08X}: PES header length {header_length} exceeds packet size {packet_size}")]
    PesLengthMismatch {
        header_length: u8,
        packet_size: u16,
        offset: u64,
    },

    /// System header shorter than its fixed part.
    #[error("0x{offset:08X}: system header too short ({len} bytes)")]
    SystemHeaderTooShort { len: u16, offset: u64 },

    /// 24-bit extended stream id form of the system header.
    #[error("0x{offset:08X}: unsupported system header form (stream id {stream_id:02X})")]
    UnsupportedSystemHeader { stream_id: u8, offset: u64 },

    /// Private stream payload too short to carry a sub-stream signature.
    #[error("0x{offset:08X}: private stream payload of {len} bytes has no sub-stream signature")]
    MissingSignature { len: usize, offset: u64 },

    /// Private stream sub-stream signature not recognized.
    #[error("0x{offset:08X}: unknown sub-stream signature {signature:08X}")]
    UnknownSignature { signature: u32, offset: u64 },

    /// Start code reached the router without being a PES stream code.
    #[error("0x{offset:08X}: packet id {id:08X} cannot carry elementary stream data")]
    NotAStreamPacket { id: u32, offset: u64 },
}

impl DemuxError {
    /// Byte offset associated with the error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DemuxError::Io(_) => None,
            DemuxError::Truncated { offset, .. }
            | DemuxError::Input { offset, .. }
            | DemuxError::Sink { offset, .. }
            | DemuxError::MissingProgramEnd { offset }
            | DemuxError::UnrecognizedPacketId { offset, .. }
            | DemuxError::UnsupportedField { offset, .. }
            | DemuxError::TimestampMagic { offset, .. }
            | DemuxError::InvalidPtsDtsFlags { offset, .. }
            | DemuxError::PesHeaderOverflow { offset, .. }
            | DemuxError::PesLengthMismatch { offset, .. }
            | DemuxError::SystemHeaderTooShort { offset, .. }
            | DemuxError::UnsupportedSystemHeader { offset, .. }
            | DemuxError::MissingSignature { offset, .. }
            | DemuxError::UnknownSignature { offset, .. }
            | DemuxError::NotAStreamPacket { offset, .. } => Some(*offset),
        }
    }
}

/// Result type for demux operations.
pub type Result<T> = std::result::Result<T, DemuxError>;
