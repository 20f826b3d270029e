//! One live or finished external build invocation.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tempfile::NamedTempFile;

use crate::error::ExecError;

/// Captured result of a finished job.
#[derive(Debug, Clone)]
pub struct JobOutput {
    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Exit code. A process killed without an exit code reports 1.
    pub code: i32,
}

/// A running external build process bound to exactly one session.
///
/// Exists only for the scheduling-run lifetime between start and harvest.
/// The argument file lives as long as the job and is deleted when the job
/// is joined (or dropped).
#[derive(Debug)]
pub struct Job {
    session: String,
    child: Child,
    _args_file: NamedTempFile,
}

impl Job {
    /// Spawns the build process asynchronously; never blocks the caller.
    ///
    /// The argument lines are written to a unique temporary file whose path
    /// is appended as the process's final argument. Uniqueness matters: the
    /// temp-file namespace is the only resource shared across concurrently
    /// running jobs.
    pub fn start(
        session: &str,
        program: &str,
        args: &[String],
        env: &[(String, String)],
        argument_lines: &[String],
    ) -> Result<Self, ExecError> {
        let mut args_file = tempfile::Builder::new()
            .prefix(&format!("strata-args-{session}-"))
            .tempfile()
            .map_err(|e| ExecError::ArgsFile {
                session: session.to_string(),
                source: e,
            })?;
        args_file
            .write_all(argument_lines.join("\n").as_bytes())
            .map_err(|e| ExecError::ArgsFile {
                session: session.to_string(),
                source: e,
            })?;

        let child = Command::new(program)
            .args(args)
            .arg(args_file.path())
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Spawn {
                program: program.to_string(),
                session: session.to_string(),
                source: e,
            })?;

        Ok(Self {
            session: session.to_string(),
            child,
            _args_file: args_file,
        })
    }

    /// The session this job is building.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Non-blocking completion poll.
    pub fn is_finished(&mut self) -> Result<bool, ExecError> {
        self.child
            .try_wait()
            .map(|status| status.is_some())
            .map_err(|e| ExecError::Wait {
                session: self.session.clone(),
                source: e,
            })
    }

    /// Joins the job, blocking until finished if it is still running.
    ///
    /// Consumes the job: captured output is read to completion and the
    /// argument file is deleted.
    pub fn join(self) -> Result<JobOutput, ExecError> {
        let session = self.session;
        let output = self
            .child
            .wait_with_output()
            .map_err(|e| ExecError::Wait {
                session: session.clone(),
                source: e,
            })?;
        Ok(JobOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(1),
        })
    }

    /// Best-effort interrupt of a running job.
    ///
    /// Used only for external cancellation of the whole run; normal
    /// completion never calls this.
    pub fn terminate(&mut self) {
        let _ = self.child.kill();
    }
}
