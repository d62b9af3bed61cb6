use serde::Serialize;
use std::path::PathBuf;

use crate::constants::*;

/// Start code + size pair read at the head of every packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub start_code: u32,
    /// For pack headers these are the first two header bytes, not a size
    pub packet_size: u16,
    /// Absolute offset of the start code
    pub offset: u64,
}

impl PacketHeader {
    pub fn kind(&self) -> Option<PacketKind> {
        PacketKind::from_start_code(self.start_code)
    }
}

/// Packet kinds the scanner dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    PackHeader,
    SystemHeader,
    Padding,
    /// Video elementary stream 0..=15 (0xE0..=0xEF)
    Video(u8),
    PrivateStream1,
    ProgramEnd,
}

impl PacketKind {
    pub fn from_start_code(code: u32) -> Option<Self> {
        match code {
            PROGRAM_END_CODE => Some(PacketKind::ProgramEnd),
            PACK_HEADER_CODE => Some(PacketKind::PackHeader),
            SYSTEM_HEADER_CODE => Some(PacketKind::SystemHeader),
            PADDING_CODE => Some(PacketKind::Padding),
            PRIVATE_STREAM_1_CODE => Some(PacketKind::PrivateStream1),
            VIDEO_CODE_MIN..=VIDEO_CODE_MAX => Some(PacketKind::Video((code - VIDEO_CODE_MIN) as u8)),
            _ => None,
        }
    }

    /// Whether a 2-byte packet size follows the start code
    pub fn has_packet_size(&self) -> bool {
        !matches!(self, PacketKind::ProgramEnd)
    }
}

/// Decoded pack header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PackClock {
    /// System clock reference, 33 bits
    pub scr: u64,
    /// SCR extension, 9 bits
    pub scr_ext: u16,
    /// Program mux rate, 22 bits, units of 50 bytes/s
    pub mux_rate: u32,
    pub stuffing_length: u8,
}

/// One P-STD buffer bound entry of the system header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamBound {
    pub scale: bool,
    pub size_bound: u16,
}

/// Decoded system header
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SystemHeaderInfo {
    pub rate_bound: u32,
    pub audio_bound: u8,
    pub fixed_flag: bool,
    pub csps_flag: bool,
    pub audio_lock_flag: bool,
    pub video_lock_flag: bool,
    pub video_bound: u8,
    pub packet_rate_restriction_flag: bool,
    pub stream_bounds: Vec<StreamBound>,
}

/// Program packet sequence counter of the PES extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter {
    pub counter: u8,
    pub is_mpeg2: bool,
    pub stuffing_length: u8,
}

/// P-STD buffer field of the PES extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdBuffer {
    pub scale: bool,
    pub size: u16,
}

/// PES extension cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PesExtension {
    pub private_data_flag: bool,
    pub pack_header_field_flag: bool,
    pub seq_counter_flag: bool,
    pub std_buffer_flag: bool,
    pub private_data: Option<u16>,
    pub pack_field_length: Option<u8>,
    pub sequence_counter: Option<SequenceCounter>,
    pub std_buffer: Option<StdBuffer>,
}

/// Decoded PES optional header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PesHeader {
    pub scrambling_control: u8,
    pub priority: bool,
    pub data_alignment: bool,
    pub copyright: bool,
    pub original: bool,
    pub pts_dts_flags: u8,
    pub escr_flag: bool,
    pub es_rate_flag: bool,
    pub dsm_trick_mode_flag: bool,
    pub additional_copy_info_flag: bool,
    pub crc_flag: bool,
    pub extension_flag: bool,
    pub header_length: u8,
    pub pts: Option<u64>,
    pub dts: Option<u64>,
    pub dsm_trick_mode: Option<u8>,
    pub extension: Option<PesExtension>,
}

/// Logical output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Private,
    Video,
    Audio,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Private, StreamKind::Video, StreamKind::Audio];

    /// Output file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            StreamKind::Private => "bin",
            StreamKind::Video => "m2v",
            StreamKind::Audio => "ss2",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StreamKind::Private => "private",
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        };
        f.pad(name)
    }
}

/// What one output received during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSummary {
    pub kind: StreamKind,
    pub path: String,
    pub bytes: u64,
    pub packets: u64,
}

/// Configuration options for a demux run
#[derive(Debug, Clone, Default)]
pub struct DemuxOptions {
    pub input: PathBuf,
    /// Directory for the output files; defaults to the input's directory
    pub output_dir: Option<PathBuf>,
    /// Accept input that ends on a packet boundary without a program end code
    pub allow_missing_end: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_kind_ranges() {
        assert_eq!(PacketKind::from_start_code(0x1E0), Some(PacketKind::Video(0)));
        assert_eq!(PacketKind::from_start_code(0x1EF), Some(PacketKind::Video(15)));
        assert_eq!(PacketKind::from_start_code(0x1F0), None);
        assert_eq!(PacketKind::from_start_code(0x1C0), None);
        assert_eq!(PacketKind::from_start_code(0x1BD), Some(PacketKind::PrivateStream1));
        assert_eq!(PacketKind::from_start_code(0x2BA), None);
        assert!(!PacketKind::ProgramEnd.has_packet_size());
        assert!(PacketKind::PackHeader.has_packet_size());
    }

    #[test]
    fn test_stream_kind_extensions() {
        let exts: Vec<_> = StreamKind::ALL.iter().map(|k| k.extension()).collect();
        assert_eq!(exts, ["bin", "m2v", "ss2"]);
    }
}
