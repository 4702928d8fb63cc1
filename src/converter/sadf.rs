// Process runner for the real sadf binary.
//
// Output is drained while waiting for the child: a child writing more than the pipe capacity
// would otherwise block forever.

use std::ffi::OsString;
use std::io;
use std::time::Duration;
use subprocess::{Exec, NullFile, Redirection};

use super::{ToolOutput, ToolRunner};

pub struct SadfCommand {
    program: String,
    timeout: Option<Duration>,
}

impl SadfCommand {
    /// `timeout` bounds each run; `None` waits for the child however long it takes.
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl ToolRunner for SadfCommand {
    fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[OsString], env: &[(&str, &str)]) -> Result<ToolOutput, String> {
        let mut exec = Exec::cmd(&self.program)
            .args(args)
            .stdin(NullFile)
            .stdout(Redirection::Pipe)
            .stderr(Redirection::Pipe);
        for (key, value) in env {
            exec = exec.env(key, value);
        }
        let mut child = exec
            .popen()
            .map_err(|e| format!("cannot start {}: {}", self.program, e))?;

        let mut comm = child.communicate_start(None);
        if let Some(limit) = self.timeout {
            comm = comm.limit_time(limit);
        }
        let (stdout, stderr) = match comm.read() {
            Ok(captured) => captured,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(if e.error.kind() == io::ErrorKind::TimedOut {
                    format!(
                        "{} timed out after {}s",
                        self.program,
                        self.timeout.unwrap_or_default().as_secs()
                    )
                } else {
                    format!("reading output of {}: {}", self.program, e.error)
                });
            }
        };
        let status = child
            .wait()
            .map_err(|e| format!("waiting for {}: {}", self.program, e))?;

        Ok(ToolOutput {
            success: status.success(),
            stdout: String::from_utf8_lossy(&stdout.unwrap_or_default()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.unwrap_or_default()).into_owned(),
        })
    }
}
