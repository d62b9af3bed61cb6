//! Output sink management
//!
//! One destination per [`StreamKind`], opened the first time that kind has
//! payload to write and kept for the rest of the run.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{DemuxError, Result};
use crate::types::{OutputSummary, StreamKind};

/// Opens the destination for a stream kind
pub trait OpenSink {
    type Sink: Write;

    /// Human-readable name of the destination for `kind`, used in errors.
    fn destination(&self, kind: StreamKind) -> String;

    fn open(&mut self, kind: StreamKind) -> io::Result<Self::Sink>;
}

/// Replace the extension of `path` with `ext`, or append it when there is none
pub fn substitute_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Opens `<base>.bin`, `<base>.m2v` and `<base>.ss2` files
#[derive(Debug, Clone)]
pub struct FileSinkOpener {
    base: PathBuf,
}

impl FileSinkOpener {
    /// Outputs go next to `input`, or into `output_dir` under the input's file name.
    pub fn new(input: &Path, output_dir: Option<&Path>) -> Self {
        let base = match (output_dir, input.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => input.to_path_buf(),
        };
        Self { base }
    }

    pub fn path_for(&self, kind: StreamKind) -> PathBuf {
        substitute_extension(&self.base, kind.extension())
    }
}

impl OpenSink for FileSinkOpener {
    type Sink = BufWriter<File>;

    fn destination(&self, kind: StreamKind) -> String {
        self.path_for(kind).display().to_string()
    }

    fn open(&mut self, kind: StreamKind) -> io::Result<Self::Sink> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_for(kind))?;
        Ok(BufWriter::new(file))
    }
}

/// An opened output for one stream kind
pub struct OutputStream<W> {
    pub kind: StreamKind,
    pub sink: W,
    pub destination: String,
    pub bytes: u64,
    pub writes: u64,
}

/// Lazily opened outputs keyed by stream kind
pub struct OutputSinks<O: OpenSink> {
    opener: O,
    streams: BTreeMap<StreamKind, OutputStream<O::Sink>>,
}

impl<O: OpenSink> OutputSinks<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            streams: BTreeMap::new(),
        }
    }

    /// Append `data` to the output for `kind`, opening it on first use.
    ///
    /// `offset` is the input position of `data`, reported on failure.
    pub fn write(&mut self, kind: StreamKind, data: &[u8], offset: u64) -> Result<()> {
        let stream = match self.streams.entry(kind) {
            std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::btree_map::Entry::Vacant(entry) => {
                let destination = self.opener.destination(kind);
                let sink = match self.opener.open(kind) {
                    Ok(sink) => sink,
                    Err(source) => {
                        return Err(DemuxError::Sink {
                            action: "open",
                            path: destination,
                            offset,
                            source,
                        });
                    }
                };
                tracing::info!(%kind, %destination, "opened output");
                entry.insert(OutputStream {
                    kind,
                    sink,
                    destination,
                    bytes: 0,
                    writes: 0,
                })
            }
        };
        if let Err(source) = stream.sink.write_all(data) {
            return Err(DemuxError::Sink {
                action: "write",
                path: stream.destination.clone(),
                offset,
                source,
            });
        }
        stream.bytes += data.len() as u64;
        stream.writes += 1;
        Ok(())
    }

    pub fn is_open(&self, kind: StreamKind) -> bool {
        self.streams.contains_key(&kind)
    }

    pub fn get(&self, kind: StreamKind) -> Option<&OutputStream<O::Sink>> {
        self.streams.get(&kind)
    }

    pub fn opened_kinds(&self) -> impl Iterator<Item = StreamKind> + '_ {
        self.streams.keys().copied()
    }

    /// Flush and close every opened output; `offset` is the input position
    /// the run stopped at.
    pub fn finish(self, offset: u64) -> Result<Vec<OutputSummary>> {
        let mut summaries = Vec::with_capacity(self.streams.len());
        for (kind, mut stream) in self.streams {
            if let Err(source) = stream.sink.flush() {
                return Err(DemuxError::Sink {
                    action: "flush",
                    path: stream.destination,
                    offset,
                    source,
                });
            }
            tracing::debug!(%kind, bytes = stream.bytes, "closed output");
            summaries.push(OutputSummary {
                kind,
                path: stream.destination,
                bytes: stream.bytes,
                packets: stream.writes,
            });
        }
        Ok(summaries)
    }
}
