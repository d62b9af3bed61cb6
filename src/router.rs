//! Stream classification and payload routing

use bytes::Buf;

use crate::constants::{SS2_AUDIO_SIGNATURE, SUBSTREAM_SIGNATURE_LEN};
use crate::error::{DemuxError, Result};
use crate::sink::{OpenSink, OutputSinks};
use crate::types::{PacketHeader, PacketKind, StreamKind};

/// Where a PES payload goes and how many leading bytes to strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub kind: StreamKind,
    pub payload_offset: usize,
}

/// Classify a PES payload.
///
/// `payload_start` is the absolute offset of `payload[0]`, used in errors.
pub fn classify(header: &PacketHeader, payload: &[u8], payload_start: u64) -> Result<Route> {
    match header.kind() {
        Some(PacketKind::Video(_)) => Ok(Route {
            kind: StreamKind::Video,
            payload_offset: 0,
        }),
        Some(PacketKind::PrivateStream1) => {
            if payload.len() < SUBSTREAM_SIGNATURE_LEN {
                return Err(DemuxError::MissingSignature {
                    len: payload.len(),
                    offset: payload_start,
                });
            }
            let mut sig = &payload[..SUBSTREAM_SIGNATURE_LEN];
            let signature = sig.get_u32();
            match signature {
                SS2_AUDIO_SIGNATURE => Ok(Route {
                    kind: StreamKind::Audio,
                    payload_offset: SUBSTREAM_SIGNATURE_LEN,
                }),
                _ => Err(DemuxError::UnknownSignature {
                    signature,
                    offset: payload_start,
                }),
            }
        }
        _ => Err(DemuxError::NotAStreamPacket {
            id: header.start_code,
            offset: header.offset,
        }),
    }
}

/// Classifies payloads and appends them to the matching output
pub struct StreamRouter<O: OpenSink> {
    sinks: OutputSinks<O>,
}

impl<O: OpenSink> StreamRouter<O> {
    pub fn new(sinks: OutputSinks<O>) -> Self {
        Self { sinks }
    }

    /// Route one payload; returns the route taken.
    pub fn dispatch(&mut self, header: &PacketHeader, payload: &[u8], payload_start: u64) -> Result<Route> {
        let route = classify(header, payload, payload_start)?;
        let data = &payload[route.payload_offset..];
        let data_start = payload_start + route.payload_offset as u64;
        self.sinks.write(route.kind, data, data_start)?;
        tracing::debug!(kind = %route.kind, bytes = data.len(), "wrote payload");
        Ok(route)
    }

    pub fn sinks(&self) -> &OutputSinks<O> {
        &self.sinks
    }

    pub fn into_sinks(self) -> OutputSinks<O> {
        self.sinks
    }
}
