//! Scripted [`ToolRunner`] for tests.
//!
//! Enabled inside this crate's tests and, for dependents, through the
//! `test-support` feature.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Result, ToolchainError};
use crate::runner::{Invocation, Termination, ToolOutput, ToolRunner};

/// What a scripted rule does when it matches.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Exit with `code`, printing `stdout`.
    Exit { code: i32, stdout: String },
    /// Write `contents` to `path`, then exit 0.
    Write { path: PathBuf, contents: Vec<u8> },
    /// Behave as if the timeout elapsed.
    TimeOut,
    /// Fail as if the program were not installed.
    Missing,
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    needle: Option<String>,
    response: FakeResponse,
}

/// Records every invocation and answers from a list of rules.
///
/// The first rule whose program matches, and whose needle (if any) equals
/// one of the arguments, decides the response. Unmatched invocations exit 0.
/// `locate` only finds programs registered with [`FakeRunner::with_tools`].
#[derive(Debug, Default)]
pub struct FakeRunner {
    tools: BTreeSet<String>,
    rules: Vec<Rule>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `locate` find these programs.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Answer invocations of `program` whose arguments contain `needle`.
    pub fn on(mut self, program: &str, needle: Option<&str>, response: FakeResponse) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            needle: needle.map(str::to_string),
            response,
        });
        self
    }

    /// Shorthand for an [`FakeResponse::Exit`] rule.
    pub fn exit(self, program: &str, needle: Option<&str>, code: i32, stdout: &str) -> Self {
        self.on(
            program,
            needle,
            FakeResponse::Exit {
                code,
                stdout: stdout.to_string(),
            },
        )
    }

    /// Every invocation seen so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Invocations of `program` seen so far.
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let rule = self.rules.iter().find(|r| {
            r.program == invocation.program
                && r.needle.as_deref().map_or(true, |n| invocation.has_arg(n))
        });

        match rule.map(|r| &r.response) {
            None => Ok(ToolOutput::exited(0, "")),
            Some(FakeResponse::Exit { code, stdout }) => Ok(ToolOutput::exited(*code, stdout.clone())),
            Some(FakeResponse::Write { path, contents }) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, contents)?;
                Ok(ToolOutput::exited(0, ""))
            }
            Some(FakeResponse::TimeOut) => Ok(ToolOutput {
                exit_code: None,
                stdout: String::new(),
                stderr: String::new(),
                termination: Termination::TimedOut,
            }),
            Some(FakeResponse::Missing) => Err(ToolchainError::ToolMissing {
                tool: invocation.program.clone(),
            }),
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools
            .contains(program)
            .then(|| PathBuf::from("/fake/bin").join(program))
    }
}
