//! Header decoders for the PSS container
//!
//! Each decoder works on a buffer the scanner has already read and returns
//! the decoded fields; none of them touch the input stream.

mod pack;
mod pes;
mod system;
mod utils;

pub use pack::parse_pack_header;
pub use pes::parse_pes_header;
pub use system::parse_system_header;
pub use utils::read_timestamp;
