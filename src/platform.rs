use anyhow::Result;
use std::io::{self, Write};
use std::process;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    /// The scan completed but nothing was read.
    NoData = 3,
    SignalPipe = 141, // 128 + SIGPIPE (13)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

fn is_broken_pipe(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::BrokenPipe
}

/// Stdout wrapper that exits quietly when the reader of a pipe goes away.
pub struct SafeStdout {
    stdout: io::Stdout,
}

impl SafeStdout {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    pub fn writeln(&mut self, data: &str) -> Result<()> {
        match writeln!(self.stdout, "{}", data).and_then(|_| self.stdout.flush()) {
            Ok(()) => Ok(()),
            Err(e) if is_broken_pipe(&e) => ExitCode::SignalPipe.exit(),
            Err(e) => Err(anyhow::anyhow!("Failed to write to stdout: {}", e)),
        }
    }
}

impl Default for SafeStdout {
    fn default() -> Self {
        Self::new()
    }
}

/// Stderr wrapper; write failures are swallowed since there is nowhere left to report them.
pub struct SafeStderr {
    stderr: io::Stderr,
}

impl SafeStderr {
    pub fn new() -> Self {
        Self {
            stderr: io::stderr(),
        }
    }

    pub fn writeln(&mut self, data: &str) {
        let _ = writeln!(self.stderr, "{}", data);
    }
}

impl Default for SafeStderr {
    fn default() -> Self {
        Self::new()
    }
}
