//! Constants for PSS container demuxing

/// Start codes (0x000001xx)
pub const PROGRAM_END_CODE: u32 = 0x0000_01B9;
pub const PACK_HEADER_CODE: u32 = 0x0000_01BA;
pub const SYSTEM_HEADER_CODE: u32 = 0x0000_01BB;
pub const PRIVATE_STREAM_1_CODE: u32 = 0x0000_01BD;
pub const PADDING_CODE: u32 = 0x0000_01BE;
pub const VIDEO_CODE_MIN: u32 = 0x0000_01E0;
pub const VIDEO_CODE_MAX: u32 = 0x0000_01EF;

/// Field sizes in bytes
pub const START_CODE_LEN: usize = 4;
pub const PACKET_SIZE_LEN: usize = 2;
pub const PACK_HEADER_LEN: usize = 9;
pub const SYSTEM_HEADER_FIXED_LEN: usize = 6;
pub const STREAM_BOUND_LEN: usize = 2;
pub const PES_FIXED_HEADER_LEN: usize = 3;
pub const TIMESTAMP_LEN: usize = 5;
pub const SUBSTREAM_SIGNATURE_LEN: usize = 4;

/// Stream id announcing the 24-bit extended system header layout (unsupported)
pub const EXTENDED_STREAM_ID: u8 = 0xB7;

/// Private stream 1 sub-stream signature carrying SS2 audio
pub const SS2_AUDIO_SIGNATURE: u32 = 0xFFA0_0000;

/// PTS/DTS magic nibbles
pub const PTS_ONLY_MAGIC: u8 = 0b0010;
pub const PTS_WITH_DTS_MAGIC: u8 = 0b0011;
pub const DTS_MAGIC: u8 = 0b0001;

/// PTS clock (90 kHz)
pub const PTS_CLOCK_HZ: u64 = 90_000;

/// Initial capacity of the per-packet scratch buffer
pub const SCRATCH_CAPACITY: usize = 8192;
