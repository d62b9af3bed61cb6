// src/lib.rs
pub mod demuxer {
    pub use crate::report::DemuxReport;
    pub use crate::types::DemuxOptions as Options;

    /// Blocking entry-point; returns once the input is fully demuxed
    pub fn run(opts: &Options) -> crate::error::Result<DemuxReport> {
        crate::core::run(opts)
    }
}

pub mod constants;
pub mod error;
pub mod parsers;
pub mod processor;
pub mod report;
pub mod router;
pub mod scanner;
pub mod sink;
pub mod stats;
pub mod types;
mod core;

pub use crate::core::demux;
pub use crate::error::{DemuxError, Result};
pub use crate::report::{DemuxReport, Reporter};
pub use crate::sink::{FileSinkOpener, OpenSink};
pub use crate::types::{DemuxOptions, StreamKind};
