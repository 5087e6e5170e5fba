//! Single-file wrapping: parse, transform, fix up imports, write.
//!
//! Everything in here runs on a worker thread and touches only the state of
//! the one file it was handed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{Mode, WrapConfig};
use crate::core::detect::{Detector, IgnoreIndex};
use crate::core::imports::{
    CLIENT_DIRECTIVE, ensure_directive, ensure_hook_namespace, ensure_named_import,
    explicit_namespace,
};
use crate::core::source::SourceFile;
use crate::core::transform::{TransformOptions, TransformedFunction, transform};
use crate::core::writer::Writer;
use crate::error::WrapError;

/// One unit of work handed to a worker.
#[derive(Debug, Clone)]
pub struct WrapTask {
    pub path: PathBuf,
    pub text: String,
    pub config: Arc<WrapConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapOutcome {
    /// Keys of every wrapped node, in source order.
    Modified { keys: Vec<String> },
    Unchanged,
    Error(WrapError),
}

impl WrapOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapOutcome::Modified { .. } => "modified",
            WrapOutcome::Unchanged => "unchanged",
            WrapOutcome::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WrapResult {
    pub path: PathBuf,
    pub outcome: WrapOutcome,
    pub elapsed: Duration,
    /// Worker that produced the result; `None` if the file never reached one.
    pub worker: Option<usize>,
    pub diagnostics: Vec<String>,
}

impl WrapResult {
    pub fn failed(path: PathBuf, error: WrapError) -> Self {
        Self {
            path,
            outcome: WrapOutcome::Error(error),
            elapsed: Duration::ZERO,
            worker: None,
            diagnostics: Vec::new(),
        }
    }

    /// A file left alone because it exceeds `maxFileBytes`.
    pub fn oversized(path: PathBuf, size: u64, max_bytes: u64) -> Self {
        Self {
            path,
            outcome: WrapOutcome::Unchanged,
            elapsed: Duration::ZERO,
            worker: None,
            diagnostics: vec![oversized_message(size, max_bytes)],
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.outcome, WrapOutcome::Modified { .. })
    }

    pub fn error(&self) -> Option<&WrapError> {
        match &self.outcome {
            WrapOutcome::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// In-memory result of rewriting one source text.
#[derive(Debug, Clone, Default)]
pub struct FileRewrite {
    /// New text, or `None` when nothing changed.
    pub output: Option<String>,
    pub keys: Vec<String>,
    pub functions: Vec<TransformedFunction>,
    pub diagnostics: Vec<String>,
}

/// Rewrite `text` without touching the filesystem.
pub fn wrap_source(path: &Path, text: String, config: &WrapConfig) -> Result<FileRewrite, WrapError> {
    let mut file = SourceFile::parse(path, text)?;
    let ignores = IgnoreIndex::build(&file.parsed, &file.text);

    // An explicit namespace already used in the file wins over inference.
    let namespace = match config.namespaces {
        Some(_) => explicit_namespace(&file, &config.hook_name).or_else(|| config.namespace_for(path)),
        None => None,
    };

    let typed_namespace = config.typed_namespace && is_typescript(path);
    let options = TransformOptions {
        mode: config.mode,
        translation_function: &config.translation_function,
        hook_name: &config.hook_name,
        server_translation_function: &config.server_translation_function,
        namespace: namespace.as_deref(),
        typed_namespace,
    };
    let detector = Detector::new(config.predicate.as_ref(), config.max_literal_length);
    let mut transformation = transform(&file, detector, &ignores, &options);

    if transformation.is_empty() {
        return Ok(FileRewrite::default());
    }

    file.extend_edits(std::mem::take(&mut transformation.edits));
    if transformation.injects_hook() {
        ensure_named_import(&mut file, &config.import_source, &config.hook_name);
    }
    if transformation.injects_server_accessor() {
        ensure_named_import(
            &mut file,
            &config.import_source,
            &config.server_translation_function,
        );
    }
    if config.mode == Mode::Client
        && config.framework.requires_client_directive()
        && transformation.touches_client_function()
    {
        ensure_directive(&mut file, CLIENT_DIRECTIVE);
    }
    if let Some(namespace) = &namespace {
        ensure_hook_namespace(&mut file, &config.hook_name, namespace, typed_namespace);
    }

    let rendered = file.render();
    let output = (rendered.text != file.text).then_some(rendered.text);
    Ok(FileRewrite {
        output,
        keys: transformation.keys(),
        functions: transformation.functions,
        diagnostics: rendered.violations,
    })
}

/// Process one task end to end. Never panics; every failure is reported as
/// an error outcome on the returned result.
pub fn process(task: WrapTask, worker: usize) -> WrapResult {
    let started = Instant::now();
    let WrapTask { path, text, config } = task;

    let (outcome, diagnostics) =
        match panic::catch_unwind(AssertUnwindSafe(|| run(&path, text, &config))) {
            Ok(Ok(done)) => done,
            Ok(Err(err)) => (WrapOutcome::Error(err), Vec::new()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                (
                    WrapOutcome::Error(WrapError::transform(&path, format!("panicked: {message}"))),
                    Vec::new(),
                )
            }
        };

    let elapsed = started.elapsed();
    match &outcome {
        WrapOutcome::Error(err) => warn!(worker, "{err}"),
        other => debug!(
            worker,
            path = %path.display(),
            outcome = other.as_str(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "processed file"
        ),
    }
    for diagnostic in &diagnostics {
        warn!(path = %path.display(), "{diagnostic}");
    }

    WrapResult {
        path,
        outcome,
        elapsed,
        worker: Some(worker),
        diagnostics,
    }
}

fn run(
    path: &Path,
    text: String,
    config: &WrapConfig,
) -> Result<(WrapOutcome, Vec<String>), WrapError> {
    let size = text.len() as u64;
    if size > config.max_file_bytes {
        return Ok((
            WrapOutcome::Unchanged,
            vec![oversized_message(size, config.max_file_bytes)],
        ));
    }

    let rewrite = wrap_source(path, text, config)?;
    let Some(output) = rewrite.output else {
        return Ok((WrapOutcome::Unchanged, rewrite.diagnostics));
    };

    Writer::new(config.dry_run).write(path, &output)?;
    Ok((
        WrapOutcome::Modified { keys: rewrite.keys },
        rewrite.diagnostics,
    ))
}

fn is_typescript(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("ts" | "tsx"))
}

fn oversized_message(size: u64, max_bytes: u64) -> String {
    format!("skipped: {size} bytes exceeds maxFileBytes ({max_bytes})")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
