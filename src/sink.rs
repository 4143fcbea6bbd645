// Output sink for Canary
// Serializes output, change-log and status writes from concurrent workers

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::CanaryResult;
use crate::models::{Injection, Line, LogFormat, OutputOrder};

/// One change-log entry in JSON form
#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    line: u64,
    original: &'a str,
    injected: &'a str,
}

/// Writers handed back once the run is over
pub struct SinkParts<W> {
    pub output: W,
    pub log: Option<W>,
    pub status: Option<W>,
}

struct SinkState<W> {
    output: W,
    log: Option<W>,
    status: Option<W>,
    log_format: LogFormat,
    order: OutputOrder,
    /// Results waiting for earlier lines when writing in input order
    pending: BTreeMap<u64, (Line, Option<Injection>)>,
    next_line: u64,
}

impl<W: AsyncWrite + Unpin + Send> SinkState<W> {
    async fn write_result(&mut self, line: &Line, result: Option<&Injection>) -> CanaryResult<()> {
        match result {
            Some(injection) => {
                self.output.write_all(injection.line.as_bytes()).await?;
                self.output.write_all(b"\n").await?;

                if let Some(log) = self.log.as_mut() {
                    let entry = match self.log_format {
                        LogFormat::Text => injection.log_entry.clone(),
                        LogFormat::Json => serde_json::to_string(&LogRecord {
                            line: line.number,
                            original: &line.text,
                            injected: &injection.line,
                        })?,
                    };
                    log.write_all(entry.as_bytes()).await?;
                    log.write_all(b"\n").await?;
                }

                if let Some(status) = self.status.as_mut() {
                    let msg = format!("[+] Injected: {}\n", injection.line);
                    status.write_all(msg.as_bytes()).await?;
                }
            }
            None => {
                if let Some(status) = self.status.as_mut() {
                    let msg = format!("[-] Skipped: {}\n", line.text);
                    status.write_all(msg.as_bytes()).await?;
                }
            }
        }
        Ok(())
    }

    /// Write every buffered result whose predecessors have all been written
    async fn drain_ready(&mut self) -> CanaryResult<()> {
        while let Some((line, result)) = self.pending.remove(&self.next_line) {
            self.next_line += 1;
            self.write_result(&line, result.as_ref()).await?;
        }
        Ok(())
    }
}

/// Append-only destination for processed lines.
///
/// Every write belonging to one result happens under a single lock, so the
/// output, log and status lines of two results never interleave.
pub struct OutputSink<W> {
    state: Mutex<SinkState<W>>,
}

impl<W: AsyncWrite + Unpin + Send> OutputSink<W> {
    pub fn new(output: W) -> Self {
        Self {
            state: Mutex::new(SinkState {
                output,
                log: None,
                status: None,
                log_format: LogFormat::default(),
                order: OutputOrder::default(),
                pending: BTreeMap::new(),
                next_line: 1,
            }),
        }
    }

    /// Also record `original -> injected` entries to `log`
    pub fn with_log(mut self, log: W, format: LogFormat) -> Self {
        let state = self.state.get_mut();
        state.log = Some(log);
        state.log_format = format;
        self
    }

    /// Write an injected/skipped status line per input line to `status`
    pub fn with_status(mut self, status: W) -> Self {
        self.state.get_mut().status = Some(status);
        self
    }

    pub fn with_order(mut self, order: OutputOrder) -> Self {
        self.state.get_mut().order = order;
        self
    }

    /// Record the outcome for `line`; `None` means the line was skipped
    pub async fn emit(&self, line: Line, result: Option<Injection>) -> CanaryResult<()> {
        let mut state = self.state.lock().await;
        match state.order {
            OutputOrder::Completion => state.write_result(&line, result.as_ref()).await,
            OutputOrder::Input => {
                state.pending.insert(line.number, (line, result));
                state.drain_ready().await
            }
        }
    }

    /// Write anything still buffered and flush all streams
    pub async fn flush(&self) -> CanaryResult<()> {
        let mut state = self.state.lock().await;
        let leftover = std::mem::take(&mut state.pending);
        for (_, (line, result)) in leftover {
            state.write_result(&line, result.as_ref()).await?;
        }

        state.output.flush().await?;
        if let Some(log) = state.log.as_mut() {
            log.flush().await?;
        }
        if let Some(status) = state.status.as_mut() {
            status.flush().await?;
        }
        Ok(())
    }

    pub fn into_parts(self) -> SinkParts<W> {
        let state = self.state.into_inner();
        SinkParts {
            output: state.output,
            log: state.log,
            status: state.status,
        }
    }
}
