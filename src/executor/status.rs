use std::{fmt, io};

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// The single completion-status domain of the engine. Raw OS wait statuses
/// are converted here, at the one point they are obtained, and never leak to
/// callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Normal exit with a nonzero code.
    Failure(i32),
    /// Terminated by a signal; distinguishable from any normal exit.
    Signaled(Signal),
    /// The `exit` builtin: tells the interpreter loop to terminate with the
    /// given code. Distinct from `Success` so a successful command cannot be
    /// mistaken for a request to quit.
    Exit(i32),
}

impl Status {
    pub fn from_wait(wait: WaitStatus) -> Status {
        match wait {
            WaitStatus::Exited(_, 0) => Status::Success,
            WaitStatus::Exited(_, code) => Status::Failure(code),
            WaitStatus::Signaled(_, signal, _) => Status::Signaled(signal),
            // Stopped/continued children are not job-controlled here; treat
            // anything else as a plain failure.
            _ => Status::Failure(1),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    /// The shell-convention exit code: 0 on success, 128+signal for a
    /// signal death.
    pub fn code(&self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure(code) => *code,
            Status::Signaled(signal) => 128 + *signal as i32,
            Status::Exit(code) => *code,
        }
    }
}

pub type ExecStatus = Result<Status, ExecError>;

#[derive(Debug)]
pub enum ExecError {
    Io(io::Error),
    Sys(Errno),
    /// An argument that cannot cross the exec boundary (embedded NUL).
    BadArgument(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Io(e) => write!(f, "IO error: {}", e),
            ExecError::Sys(errno) => write!(f, "system error: {}", errno),
            ExecError::BadArgument(arg) => write!(f, "invalid argument: {:?}", arg),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        ExecError::Io(e)
    }
}

impl From<Errno> for ExecError {
    fn from(e: Errno) -> Self {
        ExecError::Sys(e)
    }
}
