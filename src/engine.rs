// Concurrent injection engine for Canary
// Uses tokio tasks bounded by a semaphore, one task per input line

use std::borrow::Cow;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::CanaryResult;
use crate::injector::CanaryInjector;
use crate::models::Line;
use crate::sink::OutputSink;

/// Default number of lines processed at the same time
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: u64,
    pub injected: u64,
    pub skipped: u64,
}

impl RunSummary {
    fn record(&mut self, injected: bool) {
        if injected {
            self.injected += 1;
        } else {
            self.skipped += 1;
        }
    }
}

pub struct InjectionEngine {
    injector: Arc<CanaryInjector>,
    concurrency: usize,
}

impl InjectionEngine {
    pub fn new(injector: CanaryInjector, concurrency: usize) -> Self {
        Self {
            injector: Arc::new(injector),
            concurrency: concurrency.max(1),
        }
    }

    pub fn injector(&self) -> &CanaryInjector {
        &self.injector
    }

    /// Read `reader` line by line and process every line on the worker pool.
    ///
    /// The reader stalls while all `concurrency` slots are busy. Returns once
    /// every dispatched task has finished and the sink has been flushed.
    /// Results reach the sink in completion order unless the sink reorders them.
    pub async fn run<R, W>(&self, mut reader: R, sink: Arc<OutputSink<W>>) -> CanaryResult<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<CanaryResult<bool>> = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut buf = Vec::new();
        let mut read_error = None;

        info!(concurrency = self.concurrency, "starting injection run");

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    // Lines already dispatched still finish and get flushed
                    warn!(error = %e, line = summary.lines_read + 1, "input read failed");
                    read_error = Some(e);
                    break;
                }
            }

            summary.lines_read += 1;
            let line = Line::new(summary.lines_read, decode_line(&buf, summary.lines_read));

            let permit = Arc::clone(&slots).acquire_owned().await?;
            let injector = Arc::clone(&self.injector);
            let sink = Arc::clone(&sink);

            tasks.spawn(async move {
                let _permit = permit;
                let result = injector.process_line(&line.text, line.number);
                let injected = result.is_some();
                sink.emit(line, result).await?;
                Ok(injected)
            });

            // Reap finished tasks so the set does not grow with the input
            while let Some(joined) = tasks.try_join_next() {
                summary.record(joined??);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            summary.record(joined??);
        }
        sink.flush().await?;

        if let Some(e) = read_error {
            return Err(e.into());
        }

        info!(
            lines = summary.lines_read,
            injected = summary.injected,
            skipped = summary.skipped,
            "injection run complete"
        );
        Ok(summary)
    }
}

/// Strip the line terminator and decode, replacing invalid UTF-8 with U+FFFD
fn decode_line(raw: &[u8], line_number: u64) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match String::from_utf8_lossy(raw) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            debug!(line = line_number, "input line is not valid UTF-8, decoded lossily");
            text
        }
    }
}
