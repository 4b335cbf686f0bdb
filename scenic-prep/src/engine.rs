use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use tracing::{debug, info, warn};

use crate::command::EngineCommand;
use crate::error::RunnerError;

pub const DEFAULT_ENGINE: &str = "nextflow";

/// How a child process ended. `code` is `None` when it was killed by a
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The external workflow engine the runner drives.
pub trait WorkflowEngine {
    /// Name or path of the engine executable.
    fn program(&self) -> &str;

    /// Checks that the engine can be found and runs.
    fn verify(&self) -> Result<(), RunnerError>;

    /// Runs `command`, echoing its stdout and stderr line by line to `out`.
    fn run(&self, command: &EngineCommand, out: &mut dyn Write) -> Result<RunStatus, RunnerError>;

    /// Removes cached work left by previous runs.
    fn clean(&self, out: &mut dyn Write) -> Result<RunStatus, RunnerError>;
}

/// Drives a Nextflow installation through its command line.
#[derive(Debug, Clone)]
pub struct Nextflow {
    program: String,
}

impl Nextflow {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Nextflow {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE)
    }
}

fn launch_error(program: &str, source: std::io::Error) -> RunnerError {
    if source.kind() == std::io::ErrorKind::NotFound {
        RunnerError::EngineUnavailable {
            program: program.to_owned(),
        }
    } else {
        RunnerError::EngineLaunch {
            program: program.to_owned(),
            source,
        }
    }
}

impl WorkflowEngine for Nextflow {
    fn program(&self) -> &str {
        &self.program
    }

    fn verify(&self) -> Result<(), RunnerError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| launch_error(&self.program, e))?;
        if !output.status.success() {
            return Err(RunnerError::EngineVerificationFailed {
                program: self.program.clone(),
                code: output.status.code(),
            });
        }
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        info!("Nextflow is available.");
        Ok(())
    }

    fn run(&self, command: &EngineCommand, out: &mut dyn Write) -> Result<RunStatus, RunnerError> {
        stream_command(&command.program, &command.args, out)
    }

    fn clean(&self, out: &mut dyn Write) -> Result<RunStatus, RunnerError> {
        stream_command(&self.program, ["clean", "-f"], out)
    }
}

type Line = std::io::Result<Vec<u8>>;

fn forward_lines<R: Read>(reader: R, tx: Sender<Line>) {
    let mut reader = BufReader::new(reader);
    loop {
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(Ok(buf)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// Runs `program` with `args` and echoes every line of its stdout and
/// stderr to `out` as it is produced, with trailing whitespace trimmed.
/// Both pipes are drained on their own threads so the child never blocks on
/// a full pipe. Blocks until the child exits.
///
/// Lines from one stream keep their order. The interleaving of stdout lines
/// with stderr lines is whatever order the reader threads deliver them in,
/// which need not match the order the child wrote them.
pub fn stream_command<I, S>(program: &str, args: I, out: &mut dyn Write) -> Result<RunStatus, RunnerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(program, e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (tx, rx) = mpsc::channel::<Line>();

    let mut echo_error: Option<std::io::Error> = None;
    std::thread::scope(|s| {
        if let Some(stdout) = stdout {
            let tx = tx.clone();
            s.spawn(move || forward_lines(stdout, tx));
        }
        if let Some(stderr) = stderr {
            let tx = tx.clone();
            s.spawn(move || forward_lines(stderr, tx));
        }
        drop(tx);

        for line in rx {
            let written = line.and_then(|bytes| {
                writeln!(out, "{}", String::from_utf8_lossy(&bytes).trim_end())?;
                out.flush()
            });
            if let Err(e) = written {
                // keep draining so the child can finish
                if echo_error.is_none() {
                    warn!("could not echo output of `{}`: {}", program, e);
                    echo_error = Some(e);
                }
            }
        }
    });

    let status = child.wait()?;
    if let Some(e) = echo_error {
        return Err(RunnerError::Io(e));
    }
    Ok(RunStatus {
        code: status.code(),
    })
}
