use std::fs::File;
use std::io::{BufReader, Read, Seek};

use crate::error::Result;
use crate::processor::{PacketProcessor, ProcessorOutcome};
use crate::report::{DemuxReport, Reporter};
use crate::scanner::PacketScanner;
use crate::sink::{FileSinkOpener, OpenSink, OutputSinks};
use crate::types::DemuxOptions;

/// Demux `opts.input` into sibling `.bin`/`.m2v`/`.ss2` files.
pub fn run(opts: &DemuxOptions) -> Result<DemuxReport> {
    let reader = BufReader::new(File::open(&opts.input)?);
    let opener = FileSinkOpener::new(&opts.input, opts.output_dir.as_deref());

    tracing::info!(input = %opts.input.display(), "demuxing");
    let outcome = demux(reader, opener, opts.allow_missing_end)?;
    let report = Reporter::create_report(&opts.input, &outcome);

    tracing::info!(
        consumed = report.consumed_bytes,
        outputs = report.outputs.len(),
        overhead = report.overhead_bytes,
        "demux finished"
    );
    Ok(report)
}

/// Demux any seekable reader into the sinks `opener` provides.
///
/// On error the opened sinks are dropped without an explicit flush.
pub fn demux<R, O>(reader: R, opener: O, allow_missing_end: bool) -> Result<ProcessorOutcome>
where
    R: Read + Seek,
    O: OpenSink,
{
    let scanner = PacketScanner::new(reader)?;
    let mut processor = PacketProcessor::new(scanner, OutputSinks::new(opener), allow_missing_end);
    processor.run()?;
    processor.finish()
}
