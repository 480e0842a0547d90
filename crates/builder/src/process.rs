//! Toolchain phase execution with line-by-line output capture

use sandbuild_errors::{BuildError, Error};
use sandbuild_events::{AppEvent, BuildEvent, BuildPhase, EventEmitter, EventSender, OutputStream};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Sink every captured line goes to: the event stream and a shared buffer
#[derive(Debug, Clone)]
pub(crate) struct OutputSink {
    pub(crate) captured: Arc<Mutex<Vec<String>>>,
    pub(crate) events: Option<EventSender>,
}

impl OutputSink {
    fn record(&self, phase: BuildPhase, stream: OutputStream, line: String) {
        self.captured
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line.clone());
        self.events
            .emit(AppEvent::Build(BuildEvent::OutputLine { phase, stream, line }));
    }
}

/// Inputs shared by both phases of one build
pub(crate) struct PhaseContext<'a> {
    pub(crate) program: &'a str,
    pub(crate) working_dir: &'a Path,
    pub(crate) env: &'a BTreeMap<String, Option<String>>,
    pub(crate) sink: &'a OutputSink,
}

impl PhaseContext<'_> {
    /// Run one phase to completion and return its exit code.
    ///
    /// The exit code is informational; a failing phase is not an error.
    pub(crate) async fn run(
        &self,
        phase: BuildPhase,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Option<i32>, Error> {
        let mut cmd = Command::new(self.program);
        cmd.args(args)
            .current_dir(self.working_dir)
            .envs(
                self.env
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_deref().unwrap_or(""))),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        self.sink.events.emit(AppEvent::Build(BuildEvent::PhaseStarted {
            phase,
            command: format!("{} {}", self.program, args.join(" ")),
            working_dir: self.working_dir.to_path_buf(),
        }));

        let mut child = cmd.spawn().map_err(|e| BuildError::ToolchainSpawn {
            program: self.program.to_string(),
            message: e.to_string(),
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::internal("toolchain stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::internal("toolchain stderr was not captured"))?;

        let run = async {
            let (status, (), ()) = tokio::join!(
                child.wait(),
                drain(stdout, phase, OutputStream::Stdout, self.sink),
                drain(stderr, phase, OutputStream::Stderr, self.sink),
            );
            status
        };

        // Dropping the child on cancellation kills it
        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            status = run => status.map_err(|e| BuildError::ToolchainSpawn {
                program: self.program.to_string(),
                message: e.to_string(),
            })?,
        };

        let exit_code = status.code();
        self.sink.events.emit(AppEvent::Build(BuildEvent::PhaseCompleted {
            phase,
            exit_code,
        }));
        Ok(exit_code)
    }
}

/// Forward every line of `reader` to the sink until EOF
async fn drain<R>(reader: R, phase: BuildPhase, stream: OutputStream, sink: &OutputSink)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.record(phase, stream, line.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                sink.events
                    .emit_debug(format!("stopped reading {} output: {e}", phase.as_str()));
                break;
            }
        }
    }
}
