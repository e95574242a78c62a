//! Write-only sinks for per-event and per-step state dumps.
//!
//! Sinks only observe; nothing they do feeds back into the simulation.

use crate::gillespie::Outcome;
use channoise_data::NodeIndex;
use std::io::Write;

/// One fired (or empty) event inside an advance window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    pub node: NodeIndex,
    /// Time the event occurred (ms).
    pub time: f64,
    pub outcome: Outcome,
    pub lambda: f64,
    pub closed: u32,
    pub open: u32,
}

/// State of a node at the end of one advance call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub node: NodeIndex,
    pub step_index: u64,
    pub window_start: f64,
    pub window_end: f64,
    pub v_m: f64,
    pub events: u32,
    pub closed: u32,
    pub open: u32,
    pub next_event: Option<f64>,
}

pub trait DiagnosticSink {
    fn record_event(&mut self, _event: &EventRecord) {}
    fn record_step(&mut self, step: &StepRecord);

    /// Flushes buffered output and reports any write failure seen so far.
    fn finish(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record_step(&mut self, _step: &StepRecord) {}
}

/// Emits `tracing` events at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record_event(&mut self, event: &EventRecord) {
        tracing::trace!(
            node = event.node,
            time = event.time,
            outcome = ?event.outcome,
            lambda = event.lambda,
            closed = event.closed,
            open = event.open,
            "Channel event"
        );
    }

    fn record_step(&mut self, step: &StepRecord) {
        tracing::trace!(
            node = step.node,
            step = step.step_index,
            v_m = step.v_m,
            events = step.events,
            closed = step.closed,
            open = step.open,
            "Channel step"
        );
    }
}

/// Human-readable dumps to any writer.
///
/// Write failures are kept, not propagated; the first one is available via
/// [`WriterSink::take_error`].
pub struct WriterSink<W: Write> {
    writer: W,
    events: bool,
    error: Option<std::io::Error>,
}

impl<W: Write> WriterSink<W> {
    /// Per-step lines only.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            events: false,
            error: None,
        }
    }

    /// Per-step lines plus one line per event.
    pub fn verbose(writer: W) -> Self {
        Self {
            writer,
            events: true,
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn keep(&mut self, result: std::io::Result<()>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn record_event(&mut self, event: &EventRecord) {
        if !self.events {
            return;
        }
        let result = writeln!(
            self.writer,
            "  node {:4} t={:.6} {:?} lambda={:.4} closed={} open={}",
            event.node, event.time, event.outcome, event.lambda, event.closed, event.open
        );
        self.keep(result);
    }

    fn record_step(&mut self, step: &StepRecord) {
        let next = step
            .next_event
            .map_or_else(|| "none".to_string(), |t| format!("{t:.6}"));
        let result = writeln!(
            self.writer,
            "node {:4} step {:6} [{:.4}, {:.4}) V_m={:.3} events={} closed={} open={} next={}",
            step.node,
            step.step_index,
            step.window_start,
            step.window_end,
            step.v_m,
            step.events,
            step.closed,
            step.open,
            next
        );
        self.keep(result);
    }

    fn finish(&mut self) -> std::io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()
    }
}
