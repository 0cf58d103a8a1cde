/*!
# FileTracer - File-based Instrumentation

Instruments every matching source file under a directory and writes the
results to a mirror tree. Files are processed concurrently; each one is
independent and gets its own hook variable.
*/

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analyzer::SyntaxAnalyzer;

use super::instrumenter::{InstrumentRequest, Instrumenter};

/// File-based instrumentation system
///
/// Reads source files, instruments them, and writes the instrumented code
/// next to a `<file>.breakpoints.json` listing.
pub struct FileTracer<A> {
    instrumenter: Arc<Instrumenter<A>>,
    hook_library: String,
    source_extensions: Vec<String>,
    preserve_structure: bool,
    write_breakpoints: bool,
}

impl<A: SyntaxAnalyzer + 'static> FileTracer<A> {
    pub fn new(instrumenter: Instrumenter<A>, hook_library: impl Into<String>) -> Self {
        Self {
            instrumenter: Arc::new(instrumenter),
            hook_library: hook_library.into(),
            source_extensions: vec!["lua".to_string(), "luau".to_string()],
            preserve_structure: true,
            write_breakpoints: true,
        }
    }

    /// Set the file extensions to process
    pub fn source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    /// Whether to preserve directory structure in output
    pub fn preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    /// Whether to write a breakpoint listing beside each output file
    pub fn write_breakpoints(mut self, write: bool) -> Self {
        self.write_breakpoints = write;
        self
    }

    /// Instrument all files in a directory
    pub async fn transform_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_dir: P,
        output_dir: Q,
    ) -> Result<FileTransformationSummary> {
        let source_path = source_dir.as_ref();
        let output_path = output_dir.as_ref();

        if !source_path.is_dir() {
            return Err(anyhow!("Source directory does not exist: {}", source_path.display()));
        }
        fs::create_dir_all(output_path)?;

        let mut files = Vec::new();
        self.collect_files(source_path, &mut files)?;
        info!(files = files.len(), source = %source_path.display(), "instrumenting directory");

        let mut targets: Vec<(PathBuf, PathBuf, String)> = Vec::with_capacity(files.len());
        for path in files {
            let relative = path.strip_prefix(source_path)?.to_path_buf();
            let output_file = if self.preserve_structure {
                output_path.join(&relative)
            } else {
                output_path.join(relative.file_name().unwrap_or(relative.as_os_str()))
            };
            let logical_path = relative.to_string_lossy().replace('\\', "/");
            targets.push((path, output_file, logical_path));
        }

        let mut summary = FileTransformationSummary::new();

        // Files that would land on the same output path are all skipped.
        let mut claims: HashMap<PathBuf, usize> = HashMap::new();
        for (_, output_file, _) in &targets {
            *claims.entry(output_file.clone()).or_default() += 1;
        }
        let (targets, colliding): (Vec<_>, Vec<_>) = targets
            .into_iter()
            .partition(|(_, output_file, _)| claims[output_file] == 1);
        for (path, output_file, _) in colliding {
            warn!(path = %path.display(), output = %output_file.display(), "output path collision");
            summary.merge(FileTransformationSummary::failed(
                &path,
                format!("output path {} is shared with another source file", output_file.display()),
            ));
        }

        let mut tasks = JoinSet::new();
        for (path, output_file, logical_path) in targets {
            let instrumenter = Arc::clone(&self.instrumenter);
            let hook_library = self.hook_library.clone();
            let write_breakpoints = self.write_breakpoints;
            tasks.spawn(async move {
                let result = instrument_file(
                    &instrumenter,
                    &hook_library,
                    &path,
                    &logical_path,
                    &output_file,
                    write_breakpoints,
                )
                .await;
                (path, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (path, result) = joined?;
            let file_summary = match result {
                Ok(breakpoints) => FileTransformationSummary::instrumented(breakpoints),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "instrumentation failed");
                    FileTransformationSummary::failed(&path, format!("{e:#}"))
                }
            };
            summary.merge(file_summary);
        }

        Ok(summary)
    }

    /// Instrument a single file
    pub async fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_file: P,
        output_file: Q,
    ) -> Result<FileTransformationSummary> {
        let source_path = source_file.as_ref();
        let logical_path = source_path.to_string_lossy().replace('\\', "/");

        let breakpoints = instrument_file(
            &self.instrumenter,
            &self.hook_library,
            source_path,
            &logical_path,
            output_file.as_ref(),
            self.write_breakpoints,
        )
        .await?;

        Ok(FileTransformationSummary::instrumented(breakpoints))
    }

    /// Recursively collect files to instrument, in a stable order
    fn collect_files(&self, current_dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let mut entries = fs::read_dir(current_dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.collect_files(&path, files)?;
            } else if self.should_process_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Check if a file should be processed based on its extension
    fn should_process_file(&self, path: &Path) -> bool {
        if let Some(extension) = path.extension() {
            let ext_str = extension.to_string_lossy().to_lowercase();
            self.source_extensions.iter().any(|ext| ext.to_lowercase() == ext_str)
        } else {
            false
        }
    }
}

/// Path of the breakpoint listing written beside `output`.
pub fn breakpoints_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".breakpoints.json");
    PathBuf::from(name)
}

/// Instrument one file; nothing is written unless instrumentation succeeds.
async fn instrument_file<A: SyntaxAnalyzer>(
    instrumenter: &Instrumenter<A>,
    hook_library: &str,
    source: &Path,
    logical_path: &str,
    output: &Path,
    write_breakpoints: bool,
) -> Result<usize> {
    let code = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("reading {}", source.display()))?;

    let request = InstrumentRequest::new(logical_path, code, hook_library);
    let instrumented = instrumenter.instrument(&request).await?;
    let listing = serde_json::to_string_pretty(&instrumented.breakpoints)?;

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &instrumented.source)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    if write_breakpoints {
        tokio::fs::write(breakpoints_path(output), listing).await?;
    }

    Ok(instrumented.breakpoints.len())
}

/// Summary of file instrumentation results
#[derive(Debug, Default)]
pub struct FileTransformationSummary {
    pub files_processed: u64,
    pub files_instrumented: u64,
    pub breakpoints: u64,
    pub errors: Vec<String>,
}

impl FileTransformationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// One file instrumented with `breakpoints` injections.
    pub fn instrumented(breakpoints: usize) -> Self {
        Self {
            files_processed: 1,
            files_instrumented: 1,
            breakpoints: breakpoints as u64,
            errors: Vec::new(),
        }
    }

    /// One file that produced no output.
    pub fn failed(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self {
            files_processed: 1,
            errors: vec![format!("Error processing {}: {reason}", path.display())],
            ..Self::default()
        }
    }

    pub fn merge(&mut self, other: FileTransformationSummary) {
        self.files_processed += other.files_processed;
        self.files_instrumented += other.files_instrumented;
        self.breakpoints += other.breakpoints;
        self.errors.extend(other.errors);
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            (self.files_instrumented as f64) / (self.files_processed as f64)
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}
