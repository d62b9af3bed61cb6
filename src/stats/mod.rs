//! Run statistics for the demuxer

use std::collections::HashMap;

use crate::constants::PTS_CLOCK_HZ;
use crate::types::{PackClock, StreamKind, SystemHeaderInfo};

/// Per stream-kind counters
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub packets: u64,
    pub payload_bytes: u64,
    pub first_pts: Option<u64>,
    pub last_pts: Option<u64>,
}

/// Collects counters while the processor walks the input
#[derive(Debug, Default)]
pub struct StatsManager {
    pub pack_headers: u64,
    pub system_headers: u64,
    pub padding_packets: u64,
    /// Start codes, sizes, headers, stuffing, padding and stripped signatures
    pub overhead_bytes: u64,
    pub first_scr: Option<u64>,
    pub last_scr: Option<u64>,
    pub system_header: Option<SystemHeaderInfo>,
    streams: HashMap<StreamKind, StreamStats>,
}

impl StatsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes consumed by a decoder without reaching an output
    pub fn add_overhead(&mut self, bytes: u64) {
        self.overhead_bytes += bytes;
    }

    pub fn record_pack(&mut self, clock: &PackClock) {
        self.pack_headers += 1;
        self.first_scr.get_or_insert(clock.scr);
        self.last_scr = Some(clock.scr);
    }

    /// Keeps the first system header seen
    pub fn record_system_header(&mut self, info: SystemHeaderInfo) {
        self.system_headers += 1;
        if self.system_header.is_none() {
            self.system_header = Some(info);
        }
    }

    pub fn record_padding(&mut self) {
        self.padding_packets += 1;
    }

    pub fn record_payload(&mut self, kind: StreamKind, bytes: u64, pts: Option<u64>) {
        let stats = self.streams.entry(kind).or_default();
        stats.packets += 1;
        stats.payload_bytes += bytes;
        if let Some(pts) = pts {
            stats.first_pts.get_or_insert(pts);
            stats.last_pts = Some(pts);
        }
    }

    pub fn get(&self, kind: StreamKind) -> Option<&StreamStats> {
        self.streams.get(&kind)
    }

    pub fn total_payload_bytes(&self) -> u64 {
        self.streams.values().map(|s| s.payload_bytes).sum()
    }

    /// Distance between first and last PTS of a stream, in seconds
    pub fn pts_span_secs(&self, kind: StreamKind) -> Option<f64> {
        let stats = self.streams.get(&kind)?;
        let (first, last) = (stats.first_pts?, stats.last_pts?);
        Some(last.saturating_sub(first) as f64 / PTS_CLOCK_HZ as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_and_pts_span() {
        let mut stats = StatsManager::new();
        stats.record_payload(StreamKind::Video, 100, Some(90_000));
        stats.record_payload(StreamKind::Video, 50, None);
        stats.record_payload(StreamKind::Video, 25, Some(270_000));
        stats.record_payload(StreamKind::Audio, 10, None);

        let video = stats.get(StreamKind::Video).unwrap();
        assert_eq!(video.packets, 3);
        assert_eq!(video.payload_bytes, 175);
        assert_eq!(stats.total_payload_bytes(), 185);
        assert_eq!(stats.pts_span_secs(StreamKind::Video), Some(2.0));
        assert_eq!(stats.pts_span_secs(StreamKind::Audio), None);
        assert!(stats.get(StreamKind::Private).is_none());
    }

    #[test]
    fn test_scr_range() {
        let mut stats = StatsManager::new();
        for scr in [3600, 7200, 10800] {
            stats.record_pack(&PackClock { scr, ..PackClock::default() });
        }
        assert_eq!(stats.pack_headers, 3);
        assert_eq!(stats.first_scr, Some(3600));
        assert_eq!(stats.last_scr, Some(10800));
    }
}
