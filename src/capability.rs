//! Analyzer capabilities
//!
//! A capability takes a request envelope and returns a response envelope.
//! Built-in analyzers run in process; anything else runs as a child process
//! speaking JSON over stdin and stdout.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

use crate::analysis::{Analyzer, analyze_request};
use crate::protocol::{self, AnalysisRequest, AnalysisResponse};
use crate::rules::AnalyzerId;

/// Failure of an out-of-process capability.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode analyzer request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to start analyzer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error communicating with analyzer {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "analyzer {program} exited with {status}\nSubprocess stdout:'''{stdout}'''\nSubprocess stderr:'''{stderr}'''"
    )]
    Exit {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error(
        "analyzer {program} returned malformed output: {source}\nSubprocess stdout:'''{stdout}'''\nSubprocess stderr:'''{stderr}'''"
    )]
    Decode {
        program: String,
        #[source]
        source: serde_json::Error,
        stdout: String,
        stderr: String,
    },
}

/// Something that can analyze a request envelope.
pub trait Capability {
    /// Name used in logs and report file names.
    fn name(&self) -> &str;

    fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ProtocolError>;
}

/// Runs an [`Analyzer`] directly in this process.
#[derive(Debug, Clone)]
pub struct InProcess<A> {
    analyzer: A,
}

impl<A: Analyzer> InProcess<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }
}

impl<A: Analyzer> Capability for InProcess<A> {
    fn name(&self) -> &str {
        self.analyzer.name()
    }

    fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ProtocolError> {
        Ok(analyze_request(request, &self.analyzer))
    }
}

/// Runs an analyzer executable, writing the request to its stdin and
/// decoding the response from its stdout.
#[derive(Debug, Clone)]
pub struct ExternalProcess {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalProcess {
    /// An executable speaking the protocol with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            name: program.display().to_string(),
            program,
            args: Vec::new(),
        }
    }

    /// A built-in analyzer run as `<exe> analyzer <id>`.
    pub fn builtin(exe: impl Into<PathBuf>, id: AnalyzerId) -> Self {
        Self {
            name: id.as_str().to_string(),
            program: exe.into(),
            args: vec!["analyzer".into(), id.as_str().into()],
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Capability for ExternalProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, ProtocolError> {
        let input = serde_json::to_vec(request).map_err(ProtocolError::Encode)?;

        debug!(program = %self.program.display(), bytes = input.len(), "spawning analyzer");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProtocolError::Spawn {
                program: self.program_name(),
                source,
            })?;

        // stdin is fed from a helper thread while output is drained here.
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || -> std::io::Result<()> {
                stdin.write_all(&input)?;
                stdin.flush()
            })
        });

        let output = child.wait_with_output().map_err(|source| ProtocolError::Io {
            program: self.program_name(),
            source,
        })?;
        let write_result = match writer {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked"))),
            None => Err(std::io::Error::other("child stdin was not captured")),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ProtocolError::Exit {
                program: self.program_name(),
                status: output.status,
                stdout,
                stderr,
            });
        }
        write_result.map_err(|source| ProtocolError::Io {
            program: self.program_name(),
            source,
        })?;

        protocol::decode_response(&output.stdout).map_err(|source| ProtocolError::Decode {
            program: self.program_name(),
            source,
            stdout,
            stderr,
        })
    }
}

/// Resolve a configured analyzer name to a capability.
///
/// Built-in names run in process, or through `isolate_with` (normally the
/// current executable) when it is given. Any other name is an executable.
pub fn resolve(name: &str, isolate_with: Option<&Path>) -> Box<dyn Capability> {
    match (AnalyzerId::lookup(name), isolate_with) {
        (Ok(id), None) => Box::new(InProcess::new(id)),
        (Ok(id), Some(exe)) => Box::new(ExternalProcess::builtin(exe, id)),
        (Err(_), _) => Box::new(ExternalProcess::new(name)),
    }
}
