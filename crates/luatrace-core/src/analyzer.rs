/*!
# Syntax Analyzer Boundary

The analyzer turns source bytes into a JSON syntax tree. It is the only
step of the pipeline that waits on anything: the default implementation
runs an external program (`luau-ast`) and reads its complete output.

Every acquisition failure (launch failure, non-zero exit, malformed JSON,
reported syntax errors) surfaces as [`TraceError::Parse`].
*/

use std::future::Future;
use std::io::Write;
use std::process::{Output, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::{Result, TraceError};

/// Trait for all syntax analyzers
pub trait SyntaxAnalyzer: Send + Sync {
    /// Analyze source bytes into a JSON syntax tree
    fn analyze(&self, source: &[u8]) -> impl Future<Output = Result<Value>> + Send;

    /// Get analyzer name for debugging
    fn name(&self) -> &'static str;
}

/// How the source reaches the analyzer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerInput {
    /// Pipe the source to the process on stdin.
    Stdin,
    /// Write the source to a temporary file and append its path to the
    /// arguments, as `luau-ast <file>` expects.
    #[default]
    TempFile,
}

/// External analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub input: AnalyzerInput,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            program: "luau-ast".to_string(),
            args: Vec::new(),
            input: AnalyzerInput::TempFile,
        }
    }
}

/// Runs an external analyzer process per invocation.
#[derive(Debug, Clone, Default)]
pub struct ProcessAnalyzer {
    config: AnalyzerConfig,
}

impl ProcessAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn failure(&self, what: &str, err: impl std::fmt::Display) -> TraceError {
        TraceError::Parse(format!("{} {what}: {err}", self.config.program))
    }

    async fn run(&self, source: &[u8]) -> Result<Output> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match self.config.input {
            AnalyzerInput::Stdin => {
                command.stdin(Stdio::piped());
                let mut child = command
                    .spawn()
                    .map_err(|e| self.failure("could not be started", e))?;
                let stdin = child.stdin.take();

                // Feed stdin while draining stdout so a chatty analyzer cannot stall.
                let feed = async move {
                    if let Some(mut stdin) = stdin {
                        stdin.write_all(source).await?;
                        stdin.shutdown().await?;
                    }
                    Ok::<_, std::io::Error>(())
                };
                let (fed, output) = tokio::join!(feed, child.wait_with_output());
                fed.map_err(|e| self.failure("did not accept the source", e))?;
                output.map_err(|e| self.failure("failed", e))
            }
            AnalyzerInput::TempFile => {
                let mut file = tempfile::Builder::new()
                    .prefix("luatrace-")
                    .suffix(".luau")
                    .tempfile()
                    .map_err(|e| self.failure("could not stage the source", e))?;
                file.write_all(source)
                    .and_then(|_| file.flush())
                    .map_err(|e| self.failure("could not stage the source", e))?;

                command.arg(file.path()).stdin(Stdio::null());
                let output = command
                    .output()
                    .await
                    .map_err(|e| self.failure("could not be started", e))?;
                drop(file);
                Ok(output)
            }
        }
    }
}

impl SyntaxAnalyzer for ProcessAnalyzer {
    async fn analyze(&self, source: &[u8]) -> Result<Value> {
        debug!(program = %self.config.program, bytes = source.len(), "running analyzer");
        let output = self.run(source).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(&format!("exited with {}", output.status), stderr.trim()));
        }

        let tree: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| self.failure("produced malformed output", e))?;
        check_reported_errors(tree)
    }

    fn name(&self) -> &'static str {
        "process"
    }
}

/// Returns a tree that was produced ahead of time.
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    tree: Value,
}

impl StaticAnalyzer {
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let tree = serde_json::from_str(json)
            .map_err(|e| TraceError::Parse(format!("malformed syntax tree: {e}")))?;
        Ok(Self::new(tree))
    }
}

impl SyntaxAnalyzer for StaticAnalyzer {
    async fn analyze(&self, _source: &[u8]) -> Result<Value> {
        check_reported_errors(self.tree.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Reject a tree whose top level carries a non-empty `"errors"` list.
pub fn check_reported_errors(tree: Value) -> Result<Value> {
    let Some(errors) = tree.get("errors").and_then(Value::as_array) else {
        return Ok(tree);
    };
    if errors.is_empty() {
        return Ok(tree);
    }

    let messages: Vec<String> = errors
        .iter()
        .map(|error| match error {
            Value::String(message) => message.clone(),
            other => match (
                other.get("location").and_then(Value::as_str),
                other.get("message").and_then(Value::as_str),
            ) {
                (Some(location), Some(message)) => format!("{location}: {message}"),
                (None, Some(message)) => message.to_string(),
                _ => other.to_string(),
            },
        })
        .collect();
    Err(TraceError::Parse(messages.join("; ")))
}
