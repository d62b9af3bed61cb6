//! Report generation for demux runs

use std::path::Path;

use serde::Serialize;

use crate::processor::ProcessorOutcome;
use crate::types::{OutputSummary, StreamKind, SystemHeaderInfo};

/// Per stream-kind section of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamReport {
    pub kind: StreamKind,
    pub packets: u64,
    pub payload_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_pts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts_span_secs: Option<f64>,
}

/// Result of one demux run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemuxReport {
    pub input: String,
    pub input_bytes: u64,
    pub consumed_bytes: u64,
    pub generated_at: String,
    /// False when the run stopped at end of input without a program end code
    pub program_end: bool,
    pub outputs: Vec<OutputSummary>,
    pub streams: Vec<StreamReport>,
    pub pack_headers: u64,
    pub system_headers: u64,
    pub padding_packets: u64,
    pub overhead_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_scr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_header: Option<SystemHeaderInfo>,
}

impl DemuxReport {
    pub fn output(&self, kind: StreamKind) -> Option<&OutputSummary> {
        self.outputs.iter().find(|o| o.kind == kind)
    }
}

/// Report generator for demux results
pub struct Reporter;

impl Reporter {
    /// Build the structured report for API consumers
    pub fn create_report(input: &Path, outcome: &ProcessorOutcome) -> DemuxReport {
        let stats = &outcome.stats;
        let streams = StreamKind::ALL
            .iter()
            .filter_map(|&kind| {
                let s = stats.get(kind)?;
                Some(StreamReport {
                    kind,
                    packets: s.packets,
                    payload_bytes: s.payload_bytes,
                    first_pts: s.first_pts,
                    last_pts: s.last_pts,
                    pts_span_secs: stats.pts_span_secs(kind),
                })
            })
            .collect();

        DemuxReport {
            input: input.display().to_string(),
            input_bytes: outcome.input_length,
            consumed_bytes: outcome.consumed_bytes,
            generated_at: chrono::Utc::now().to_rfc3339(),
            program_end: outcome.saw_program_end,
            outputs: outcome.outputs.clone(),
            streams,
            pack_headers: stats.pack_headers,
            system_headers: stats.system_headers,
            padding_packets: stats.padding_packets,
            overhead_bytes: stats.overhead_bytes,
            first_scr: stats.first_scr,
            last_scr: stats.last_scr,
            system_header: stats.system_header.clone(),
        }
    }

    /// Pretty-printed JSON for CLI output
    pub fn generate_json_report(report: &DemuxReport) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }

    /// Short human-readable summary, one line per output
    pub fn generate_text_report(report: &DemuxReport) -> String {
        let mut lines = vec![format!(
            "{}: {} of {} bytes, {} pack headers, {} overhead bytes",
            report.input,
            report.consumed_bytes,
            report.input_bytes,
            report.pack_headers,
            report.overhead_bytes
        )];
        for output in &report.outputs {
            let span = report
                .streams
                .iter()
                .find(|s| s.kind == output.kind)
                .and_then(|s| s.pts_span_secs)
                .map(|secs| format!(", {secs:.3}s"))
                .unwrap_or_default();
            lines.push(format!(
                "  {:<7} {} ({} bytes in {} packets{span})",
                output.kind, output.path, output.bytes, output.packets
            ));
        }
        if report.outputs.is_empty() {
            lines.push("  no elementary stream data found".to_string());
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsManager;
    use crate::types::PackClock;

    fn outcome() -> ProcessorOutcome {
        let mut stats = StatsManager::new();
        stats.record_pack(&PackClock { scr: 900, ..PackClock::default() });
        stats.record_payload(StreamKind::Video, 2048, Some(90_000));
        stats.record_payload(StreamKind::Video, 1024, Some(135_000));
        stats.record_payload(StreamKind::Audio, 512, None);
        stats.add_overhead(64);
        ProcessorOutcome {
            stats,
            outputs: vec![
                OutputSummary { kind: StreamKind::Video, path: "op.m2v".into(), bytes: 3072, packets: 2 },
                OutputSummary { kind: StreamKind::Audio, path: "op.ss2".into(), bytes: 512, packets: 1 },
            ],
            consumed_bytes: 3652,
            input_length: 3652,
            saw_program_end: true,
        }
    }

    #[test]
    fn test_create_report() {
        let report = Reporter::create_report(Path::new("op.pss"), &outcome());
        assert_eq!(report.input, "op.pss");
        assert_eq!(report.streams.len(), 2);
        assert_eq!(report.streams[0].kind, StreamKind::Video);
        assert_eq!(report.streams[0].pts_span_secs, Some(0.5));
        assert_eq!(report.output(StreamKind::Audio).unwrap().bytes, 512);
        assert!(report.output(StreamKind::Private).is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());
    }

    #[test]
    fn test_json_shape() {
        let report = Reporter::create_report(Path::new("op.pss"), &outcome());
        let json = Reporter::generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outputs"][0]["kind"], "video");
        assert_eq!(value["outputs"][1]["path"], "op.ss2");
        assert_eq!(value["first_scr"], 900);
        assert_eq!(value["streams"][1]["kind"], "audio");
        assert!(value["streams"][1].get("first_pts").is_none());
        assert!(value.get("system_header").is_none());
    }

    #[test]
    fn test_text_report() {
        let report = Reporter::create_report(Path::new("op.pss"), &outcome());
        let text = Reporter::generate_text_report(&report);
        assert!(text.starts_with("op.pss: 3652 of 3652 bytes"));
        assert!(text.contains("video   op.m2v (3072 bytes in 2 packets, 0.500s)"));
        assert!(text.contains("audio   op.ss2 (512 bytes in 1 packets)"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with(")\n"));
    }
}
