use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};

use crate::ast::{AstNode, CommandKind, CommandNode, RedirectKind};
use crate::environment::Environment;

use super::builtins::BuiltinManager;
use super::status::{ExecError, ExecStatus, Status};

pub trait Executor {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus;
}

/// The process-orchestrating executor: forks, execs, pipes and waits.
///
/// Every `exec` call blocks until its subtree has completed, except for
/// `Background` nodes. Failures of the OS primitives are reported on stderr
/// and recovered into a failure `Status` at the node boundary; nothing here
/// terminates the interpreter except the `exit` builtin's `Status::Exit`.
pub struct Engine {
    builtins: BuiltinManager,
    background: Vec<Pid>,
    last_capture: Option<String>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            builtins: BuiltinManager::new(),
            background: Vec::new(),
            last_capture: None,
        }
    }

    /// Reap finished background children without blocking. Called by the
    /// REPL once per prompt so background processes never linger as zombies.
    pub fn reap_background(&mut self) {
        self.background.retain(|pid| {
            matches!(
                waitpid(*pid, Some(WaitPidFlag::WNOHANG)),
                Ok(WaitStatus::StillAlive)
            )
        });
    }

    pub fn background_count(&self) -> usize {
        self.background.len()
    }

    /// The text captured by the most recent `Substitution` node.
    pub fn last_capture(&self) -> Option<&str> {
        self.last_capture.as_deref()
    }

    /// Run a subtree with its stdout on a pipe this process reads, and
    /// return the produced text (trailing newlines trimmed) together with
    /// the subtree's status.
    pub fn capture(
        &mut self,
        node: &AstNode,
        env: &mut Environment,
    ) -> Result<(String, Status), ExecError> {
        let (read_end, write_end) = unistd::pipe()?;
        let child = match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                drop(read_end);
                if unistd::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO).is_err() {
                    process::exit(1);
                }
                drop(write_end);
                self.exit_with(node, env);
            }
            Ok(ForkResult::Parent { child }) => child,
            Err(errno) => return Err(ExecError::Sys(errno)),
        };
        // Close our copy of the write end or the read below never sees EOF.
        drop(write_end);
        let mut bytes = Vec::new();
        File::from(read_end).read_to_end(&mut bytes)?;
        let wait = waitpid(child, None)?;
        let output = String::from_utf8_lossy(&bytes)
            .trim_end_matches('\n')
            .to_string();
        Ok((output, Status::from_wait(wait)))
    }

    fn exec_command(&mut self, cmd: &CommandNode, env: &mut Environment) -> ExecStatus {
        match cmd.kind {
            CommandKind::Builtin => {
                // Never forked: cd/exit must affect this very process.
                let Some(name) = cmd.args.first() else {
                    return Ok(Status::Success);
                };
                Ok(self.builtins.execute(name, &cmd.args[1..], env))
            }
            CommandKind::External => self.exec_external(cmd),
        }
    }

    fn exec_external(&mut self, cmd: &CommandNode) -> ExecStatus {
        // A blank input line parses to an empty argv; nothing to do.
        if cmd.args.is_empty() {
            return Ok(Status::Success);
        }
        let argv = cstring_argv(&cmd.args)?;
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // Interrupts must reach the child, not this shell. The reset
                // has to happen before the image is replaced.
                unsafe {
                    let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
                }
                let errno = match unistd::execvp(&argv[0], &argv) {
                    Ok(_) => unreachable!("execvp returned on success"),
                    Err(errno) => errno,
                };
                // 127 for "no such command", 126 for a command that exists
                // but cannot be run (permissions, not executable).
                if errno == Errno::ENOENT {
                    eprintln!("minish: {}: command not found", cmd.args[0]);
                    process::exit(127);
                }
                eprintln!("minish: {}: {}", cmd.args[0], errno);
                process::exit(126);
            }
            Ok(ForkResult::Parent { child }) => self.wait_child(child),
            Err(errno) => {
                eprintln!("minish: fork: {}", errno);
                Ok(Status::Failure(1))
            }
        }
    }

    fn exec_pipeline(
        &mut self,
        left: &AstNode,
        right: &AstNode,
        env: &mut Environment,
    ) -> ExecStatus {
        let (read_end, write_end) = match unistd::pipe() {
            Ok(ends) => ends,
            Err(errno) => {
                eprintln!("minish: pipe: {}", errno);
                return Ok(Status::Failure(1));
            }
        };

        let left_pid = match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                drop(read_end);
                if unistd::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO).is_err() {
                    process::exit(1);
                }
                drop(write_end);
                self.exit_with(left, env);
            }
            Ok(ForkResult::Parent { child }) => child,
            Err(errno) => {
                eprintln!("minish: fork: {}", errno);
                return Ok(Status::Failure(1));
            }
        };

        let right_pid = match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                drop(write_end);
                if unistd::dup2(read_end.as_raw_fd(), libc::STDIN_FILENO).is_err() {
                    process::exit(1);
                }
                drop(read_end);
                self.exit_with(right, env);
            }
            Ok(ForkResult::Parent { child }) => child,
            Err(errno) => {
                eprintln!("minish: fork: {}", errno);
                drop(read_end);
                drop(write_end);
                let _ = waitpid(left_pid, None);
                return Ok(Status::Failure(1));
            }
        };

        // This process uses neither end. An open write end here would keep
        // the right child from ever seeing EOF.
        drop(read_end);
        drop(write_end);

        // Wait for both children, in a fixed order. The pipeline's status is
        // the last stage's, never whichever child happened to finish second.
        let _ = waitpid(left_pid, None);
        let wait = waitpid(right_pid, None)?;
        Ok(Status::from_wait(wait))
    }

    fn exec_redirect(
        &mut self,
        node: &AstNode,
        kind: RedirectKind,
        file: &str,
        env: &mut Environment,
    ) -> ExecStatus {
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                if let Err(e) = apply_redirect(kind, file) {
                    eprintln!("minish: {}: {}", file, e);
                    process::exit(1);
                }
                self.exit_with(node, env);
            }
            Ok(ForkResult::Parent { child }) => self.wait_child(child),
            Err(errno) => {
                eprintln!("minish: fork: {}", errno);
                Ok(Status::Failure(1))
            }
        }
    }

    fn exec_background(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus {
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => self.exit_with(node, env),
            Ok(ForkResult::Parent { child }) => {
                self.background.push(child);
                Ok(Status::Success)
            }
            Err(errno) => {
                eprintln!("minish: fork: {}", errno);
                Ok(Status::Failure(1))
            }
        }
    }

    fn exec_assignment(&mut self, name: &str, value: &str, env: &mut Environment) -> ExecStatus {
        if !valid_name(name) {
            eprintln!("minish: {}: not a valid identifier", name);
            return Ok(Status::Failure(1));
        }
        // Children inherit the process environment at fork time.
        env.set(name, value);
        Ok(Status::Success)
    }

    fn wait_child(&self, child: Pid) -> ExecStatus {
        let wait = waitpid(child, None)?;
        Ok(Status::from_wait(wait))
    }

    /// Child-side tail: run the subtree and exit the forked process with its
    /// code. Never returns to the interpreter loop.
    fn exit_with(&mut self, node: &AstNode, env: &mut Environment) -> ! {
        let code = match self.exec(node, env) {
            Ok(status) => status.code(),
            Err(e) => {
                eprintln!("minish: {}", e);
                1
            }
        };
        process::exit(code);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for Engine {
    fn exec(&mut self, node: &AstNode, env: &mut Environment) -> ExecStatus {
        match node {
            AstNode::Command(cmd) => self.exec_command(cmd, env),
            AstNode::Sequence(lhs, rhs) => {
                let left = self.exec(lhs, env)?;
                if let Status::Exit(_) = left {
                    return Ok(left);
                }
                // Right side runs unconditionally and its status wins.
                self.exec(rhs, env)
            }
            AstNode::And(lhs, rhs) => {
                let left = self.exec(lhs, env)?;
                match left {
                    Status::Exit(_) => Ok(left),
                    _ if left.is_success() => self.exec(rhs, env),
                    _ => Ok(left),
                }
            }
            AstNode::Or(lhs, rhs) => {
                let left = self.exec(lhs, env)?;
                match left {
                    Status::Exit(_) => Ok(left),
                    _ if left.is_success() => Ok(left),
                    _ => self.exec(rhs, env),
                }
            }
            AstNode::Pipeline(lhs, rhs) => self.exec_pipeline(lhs, rhs, env),
            AstNode::Redirect { node, kind, file } => self.exec_redirect(node, *kind, file, env),
            AstNode::Background(inner) => self.exec_background(inner, env),
            AstNode::Negate(inner) => {
                let status = self.exec(inner, env)?;
                Ok(match status {
                    Status::Exit(_) => status,
                    _ if status.is_success() => Status::Failure(1),
                    _ => Status::Success,
                })
            }
            AstNode::Assignment { name, value } => self.exec_assignment(name, value, env),
            AstNode::Substitution(inner) => {
                let (text, status) = self.capture(inner, env)?;
                self.last_capture = Some(text);
                Ok(status)
            }
        }
    }
}

fn cstring_argv(args: &[String]) -> Result<Vec<CString>, ExecError> {
    args.iter()
        .map(|arg| CString::new(arg.as_str()).map_err(|_| ExecError::BadArgument(arg.clone())))
        .collect()
}

fn apply_redirect(kind: RedirectKind, file: &str) -> io::Result<()> {
    use RedirectKind::*;

    let handle = match kind {
        In => File::open(file)?,
        Out | ErrOut | AllOut => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(file)?,
        Append | ErrAppend | AllAppend => {
            OpenOptions::new().append(true).create(true).open(file)?
        }
    };

    let targets: &[RawFd] = match kind {
        In => &[libc::STDIN_FILENO],
        Out | Append => &[libc::STDOUT_FILENO],
        ErrOut | ErrAppend => &[libc::STDERR_FILENO],
        AllOut | AllAppend => &[libc::STDOUT_FILENO, libc::STDERR_FILENO],
    };
    for &target in targets {
        unistd::dup2(handle.as_raw_fd(), target).map_err(io::Error::from)?;
    }
    // `handle` drops here; the duplicated descriptors stay open.
    Ok(())
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
