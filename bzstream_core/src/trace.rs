use serde::Serialize;

use crate::codec::Direction;

/// Which primitive a traced call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Transform,
    Finish,
}

/// One codec call, as reported by the trace facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub phase: Phase,
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub end_of_stream: bool,
}

/// Running totals over every traced call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub calls: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Optional per-call logging for a driver. Purely observational.
#[derive(Debug, Clone)]
pub struct Trace {
    label: &'static str,
    enabled: bool,
    summary: TraceSummary,
}

impl Trace {
    pub fn new(direction: Direction, enabled: bool) -> Self {
        Self {
            label: direction.label(),
            enabled,
            summary: TraceSummary::default(),
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn summary(&self) -> TraceSummary {
        self.summary
    }

    pub fn record(&mut self, record: TraceRecord) {
        if !self.enabled {
            return;
        }
        self.summary.calls += 1;
        self.summary.bytes_in += record.bytes_in as u64;
        self.summary.bytes_out += record.bytes_out as u64;
        tracing::debug!(
            label = self.label,
            phase = ?record.phase,
            bytes_in = record.bytes_in,
            bytes_out = record.bytes_out,
            end_of_stream = record.end_of_stream,
            "codec call"
        );
    }
}
