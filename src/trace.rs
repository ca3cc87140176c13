//! Per-cycle trace of the accumulator
//!
//! Tracing is a side channel of the driver: a sink receives one
//! [StepTrace] per cycle and has no way to influence the
//! computation.

use std::fmt;
use std::io::{self, Write};

use crate::utils::hex_digits;
use crate::width::Width;

/// Accumulator value before and after one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTrace {
    pub width: Width,
    pub index: u32,
    pub before: u128,
    pub after: u128,
}

impl StepTrace {
    /// Render with the field width of the original diagnostic print
    /// (w/2 hex digits, rounded down). This matches the default
    /// rendering for even widths and is one digit short of the
    /// accumulator for odd widths.
    pub fn legacy(&self) -> Legacy<'_> {
        Legacy(self)
    }

    fn write_with_digits(&self, f: &mut fmt::Formatter, digits: usize) -> fmt::Result {
        write!(
            f,
            "Step {:02}: accum {:0digits$x} -> {:0digits$x}",
            self.index, self.before, self.after
        )
    }
}

/// Full-accumulator-width rendering
impl fmt::Display for StepTrace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_with_digits(f, hex_digits(self.width.accum_bits()))
    }
}

pub struct Legacy<'a>(&'a StepTrace);

impl fmt::Display for Legacy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let digits = (self.0.width.bits() / 2) as usize;
        self.0.write_with_digits(f, digits)
    }
}

/// Receiver of trace entries, one per cycle, in cycle order
pub trait TraceSink {
    fn record(&mut self, entry: StepTrace);
}

impl TraceSink for Vec<StepTrace> {
    fn record(&mut self, entry: StepTrace) {
        self.push(entry);
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn record(&mut self, entry: StepTrace) {
        (**self).record(entry)
    }
}

/// Both sinks receive every entry, the first one first
impl<A: TraceSink, B: TraceSink> TraceSink for (A, B) {
    fn record(&mut self, entry: StepTrace) {
        self.0.record(entry);
        self.1.record(entry);
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(pub F);

impl<F: FnMut(StepTrace)> TraceSink for FnSink<F> {
    fn record(&mut self, entry: StepTrace) {
        (self.0)(entry)
    }
}

/// Forwards each entry as a debug-level tracing event
#[derive(Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&mut self, entry: StepTrace) {
        tracing::debug!(width = entry.width.bits(), "{entry}");
    }
}

/// Writes each entry as a line of text
pub struct PrintSink<W: Write> {
    out: W,
    legacy: bool,
    error: Option<io::Error>,
}

impl PrintSink<io::Stdout> {
    pub fn stdout(legacy: bool) -> Self {
        Self::new(io::stdout(), legacy)
    }
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W, legacy: bool) -> Self {
        Self {
            out,
            legacy,
            error: None,
        }
    }

    /// Return the writer, or the first write error that occurred
    /// while recording. Entries after a failed write are dropped.
    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> TraceSink for PrintSink<W> {
    fn record(&mut self, entry: StepTrace) {
        if self.error.is_some() {
            return;
        }
        let result = if self.legacy {
            writeln!(self.out, "{}", entry.legacy())
        } else {
            writeln!(self.out, "{entry}")
        };
        if let Err(e) = result {
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::sync::{Arc, Mutex};

    fn entry(bits: u32, index: u32, before: u128, after: u128) -> StepTrace {
        StepTrace {
            width: Width::new(bits).unwrap(),
            index,
            before,
            after,
        }
    }

    #[test]
    fn check_default_format_covers_accumulator() {
        let e = entry(8, 3, 0x12, 0xabcd);
        assert_eq!(e.to_string(), "Step 03: accum 0012 -> abcd");
    }

    #[test]
    fn check_legacy_format() {
        let e = entry(8, 3, 0x12, 0xabcd);
        assert_eq!(e.legacy().to_string(), "Step 03: accum 0012 -> abcd");
        let e = entry(4, 0, 0x7, 0xe);
        assert_eq!(e.legacy().to_string(), "Step 00: accum 07 -> 0e");
        assert_eq!(e.to_string(), "Step 00: accum 07 -> 0e");
        let e = entry(16, 12, 0x7, 0xe);
        assert_eq!(e.legacy().to_string(), "Step 12: accum 00000007 -> 0000000e");
        assert_eq!(e.to_string(), "Step 12: accum 00000007 -> 0000000e");
    }

    #[test]
    fn check_legacy_format_odd_width() {
        let e = entry(5, 4, 0x1f, 0x3e);
        assert_eq!(e.legacy().to_string(), "Step 04: accum 1f -> 3e");
        assert_eq!(e.to_string(), "Step 04: accum 01f -> 03e");
        // Values wider than the field are printed in full
        let e = entry(5, 4, 0x3ff, 0x100);
        assert_eq!(e.legacy().to_string(), "Step 04: accum 3ff -> 100");
    }

    #[test]
    fn check_print_sink() {
        let mut sink = PrintSink::new(Vec::new(), false);
        sink.record(entry(4, 0, 0x7, 0xe));
        sink.record(entry(4, 1, 0xe, 0x1c));
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(out, "Step 00: accum 07 -> 0e\nStep 01: accum 0e -> 1c\n");
    }

    #[test]
    fn check_pair_of_sinks() {
        let mut log = Vec::new();
        let mut print = PrintSink::new(Vec::new(), true);
        {
            let mut sink = (&mut log, &mut print);
            sink.record(entry(4, 0, 0x7, 0xe));
        }
        assert_eq!(log, vec![entry(4, 0, 0x7, 0xe)]);
        let out = String::from_utf8(print.finish().unwrap()).unwrap();
        assert_eq!(out, "Step 00: accum 07 -> 0e\n");
    }

    /// Writer that keeps everything written to it
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn check_log_sink_emits_debug_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut sink = LogSink;
            sink.record(entry(4, 0, 0x7, 0xe));
            sink.record(entry(4, 1, 0xe, 0x1c));
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("DEBUG"));
        assert!(lines[0].contains("Step 00: accum 07 -> 0e"));
        assert!(lines[1].contains("Step 01: accum 0e -> 1c"));
        assert!(lines[1].contains("width=4"));
    }

    #[test]
    fn check_log_sink_silent_above_debug() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            LogSink.record(entry(4, 0, 0x7, 0xe));
        });

        assert!(captured.0.lock().unwrap().is_empty());
    }

    #[test]
    fn check_closure_sink() {
        let mut indices = Vec::new();
        {
            let mut sink = FnSink(|e: StepTrace| indices.push(e.index));
            sink.record(entry(4, 0, 0, 0));
            sink.record(entry(4, 1, 0, 0));
        }
        assert_eq!(indices, vec![0, 1]);
    }
}
