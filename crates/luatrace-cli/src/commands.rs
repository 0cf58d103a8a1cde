//! `instrument` and `batch` command implementations
//!
//! Both commands are generic over the analyzer so they can be driven by a
//! pre-built tree in tests.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use luatrace_core::tracer::file_tracer::breakpoints_path;
use luatrace_core::{
    FileTracer, FileTransformationSummary, InstrumentRequest, Instrumented, Instrumenter,
    SyntaxAnalyzer,
};
use tracing::info;

/// Arguments of `luatrace instrument`
#[derive(Debug, Clone)]
pub struct InstrumentArgs {
    pub input: PathBuf,
    pub hook_library: String,
    pub hook_variable: Option<String>,
    /// Logical path for `_register`; defaults to `input` as given
    pub source_path: Option<String>,
    /// Instrumented source destination; stdout when absent
    pub output: Option<PathBuf>,
    /// Breakpoint listing destination; beside `output` when absent
    pub breakpoints: Option<PathBuf>,
}

/// Instrument one file and write the source and breakpoint listing.
pub async fn instrument<A: SyntaxAnalyzer>(
    instrumenter: &Instrumenter<A>,
    args: &InstrumentArgs,
) -> Result<Instrumented> {
    let code = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;
    let source_path = args
        .source_path
        .clone()
        .unwrap_or_else(|| args.input.to_string_lossy().replace('\\', "/"));

    let mut request = InstrumentRequest::new(source_path, code, args.hook_library.as_str());
    if let Some(name) = &args.hook_variable {
        request = request.with_hook_variable(name.as_str());
    }
    let instrumented = instrumenter
        .instrument(&request)
        .await
        .with_context(|| format!("instrumenting {}", args.input.display()))?;

    match &args.output {
        Some(output) => write_file(output, instrumented.source.as_bytes()).await?,
        None => io::stdout().write_all(instrumented.source.as_bytes())?,
    }

    let listing_path = args
        .breakpoints
        .clone()
        .or_else(|| args.output.as_deref().map(breakpoints_path));
    if let Some(path) = listing_path {
        let listing = serde_json::to_string_pretty(&instrumented.breakpoints)?;
        write_file(&path, listing.as_bytes()).await?;
        info!(path = %path.display(), count = instrumented.breakpoints.len(), "wrote breakpoints");
    }

    Ok(instrumented)
}

/// Instrument every Luau file under `source_dir` into `output_dir`.
pub async fn batch<A: SyntaxAnalyzer + 'static>(
    instrumenter: Instrumenter<A>,
    hook_library: &str,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<FileTransformationSummary> {
    let tracer = FileTracer::new(instrumenter, hook_library);
    let summary = tracer.transform_directory(source_dir, output_dir).await?;

    info!(
        processed = summary.files_processed,
        instrumented = summary.files_instrumented,
        breakpoints = summary.breakpoints,
        "batch finished"
    );
    Ok(summary)
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
