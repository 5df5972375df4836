//! Subprocess invocation.
//!
//! Every toolchain call goes through [`ToolRunner`], so build logic never
//! touches process-wide state: environment overrides, working directory and
//! timeout travel with each [`Invocation`].

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Result, ToolchainError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long captured pipes may stay open after the child is gone. Background
/// processes that inherited them would otherwise hold the run forever.
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Upper bound on version checks, listings and daemon pings.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// A single external command, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables added to the child's environment only.
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// Capture stdout/stderr instead of inheriting them.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            timeout: None,
            capture: false,
        }
    }

    /// A captured invocation bounded by [`QUERY_TIMEOUT`], used for version
    /// checks and listings.
    pub fn query<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(program)
            .args(args)
            .capture(true)
            .timeout(Some(QUERY_TIMEOUT))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Whether any argument equals `needle`.
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value:?} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited,
    TimedOut,
    Cancelled,
}

/// Result of running an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if killed or terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub termination: Termination,
}

impl ToolOutput {
    /// A normal exit with the given code and captured stdout.
    pub fn exited(code: i32, stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: String::new(),
            termination: Termination::Exited,
        }
    }

    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.exit_code == Some(0)
    }

    pub fn timed_out(&self) -> bool {
        self.termination == Termination::TimedOut
    }

    /// First non-empty line of stdout, falling back to stderr.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

/// Shared cancellation flag, checked between targets and while waiting on children.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes invocations and locates executables.
pub trait ToolRunner {
    /// Run the invocation to completion, timeout or cancellation.
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;

    /// Resolve `program` on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cancel: CancelToken,
}

impl SystemRunner {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "exec");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());
        command.envs(invocation.env.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        if invocation.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        // Own group, so a kill reaches the compilers and linkers cargo spawned.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ToolchainError::ToolMissing {
                    tool: invocation.program.clone(),
                }
            } else {
                ToolchainError::Spawn {
                    tool: invocation.program.clone(),
                    source,
                }
            }
        })?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let started = Instant::now();
        let (termination, exit_code) = loop {
            if let Some(status) = child.try_wait()? {
                break (Termination::Exited, status.code());
            }
            if self.cancel.is_cancelled() {
                warn!(program = %invocation.program, "cancelled, killing child");
                kill(&mut child);
                break (Termination::Cancelled, None);
            }
            if let Some(limit) = invocation.timeout {
                if started.elapsed() >= limit {
                    warn!(
                        program = %invocation.program,
                        timeout_secs = limit.as_secs(),
                        "timed out, killing child"
                    );
                    kill(&mut child);
                    break (Termination::TimedOut, None);
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        let deadline = Instant::now() + OUTPUT_GRACE;
        Ok(ToolOutput {
            exit_code,
            stdout: stdout.map(|r| drain(r, deadline)).unwrap_or_default(),
            stderr: stderr.map(|r| drain(r, deadline)).unwrap_or_default(),
            termination,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
    rx
}

/// Collect what a reader has sent, giving up at `deadline`.
fn drain(reader: Receiver<Vec<u8>>, deadline: Instant) -> String {
    let mut buf = Vec::new();
    loop {
        match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("output pipe still held open, keeping what was read");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn kill(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: signals the group created for this child at spawn.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
