//! Per-file state owned by a single worker.
//!
//! A [`SourceFile`] keeps the original text untouched and accumulates
//! byte-range [`Edit`]s. Rendering splices the edits into the text, so every
//! byte outside an edit (comments, formatting, quotes) survives exactly.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use swc_common::{BytePos, SourceMap};

use crate::core::parsers::jsx::{ParsedJSX, parse_jsx_source};
use crate::error::WrapError;

/// Ordering class for edits that share a start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditOrder {
    Directive,
    Import,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub order: EditOrder,
}

impl Edit {
    pub fn insert(at: usize, text: impl Into<String>, order: EditOrder) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
            order,
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            order: EditOrder::Body,
        }
    }

    fn is_insert(&self) -> bool {
        self.start == self.end
    }
}

/// An import declaration that does not exist in the file yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingImport {
    pub source: String,
    pub symbols: Vec<String>,
    pub at: usize,
    pub leading_newline: bool,
}

/// Output of [`SourceFile::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Edits dropped because they overlapped an earlier edit.
    pub violations: Vec<String>,
}

pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub parsed: ParsedJSX,
    edits: Vec<Edit>,
    pub(crate) pending_imports: Vec<PendingImport>,
    pub(crate) ensured_imports: HashSet<(String, String)>,
    pub(crate) directive_ensured: bool,
}

impl SourceFile {
    pub fn parse(path: &Path, text: String) -> Result<Self, WrapError> {
        let source_map = Arc::new(SourceMap::default());
        let parsed = parse_jsx_source(text.clone(), &path.to_string_lossy(), source_map)
            .map_err(|e| WrapError::parse(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
            parsed,
            edits: Vec::new(),
            pending_imports: Vec::new(),
            ensured_imports: HashSet::new(),
            directive_ensured: false,
        })
    }

    /// Byte offset of `pos` within `text`.
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.parsed.start_pos.0) as usize
    }

    /// 1-based line number of `pos`.
    pub fn line(&self, pos: BytePos) -> usize {
        self.parsed.source_map.lookup_char_pos(pos).line
    }

    pub fn slice(&self, lo: BytePos, hi: BytePos) -> &str {
        let start = self.offset(lo).min(self.text.len());
        let end = self.offset(hi).clamp(start, self.text.len());
        self.text.get(start..end).unwrap_or("")
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indent_at(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let rest = &self.text[line_start..];
        let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
        &rest[..width]
    }

    /// Start of the comment block sitting directly on top of `pos`, or
    /// `pos` when there is none.
    ///
    /// The block is the run of comments ending on `pos`'s line or the line
    /// before it, chained without blank lines. With `after`, only comments
    /// starting on a later line than `after` are taken. Inserting new code
    /// at the returned position keeps `i18n-ignore` markers next to the
    /// code they annotate.
    pub fn attached_comments_start(&self, after: Option<BytePos>, pos: BytePos) -> BytePos {
        let after_line = after.map(|a| self.line(a));
        let mut comments: Vec<_> = self
            .parsed
            .comments
            .iter()
            .filter(|c| c.span.hi <= pos && after.is_none_or(|a| c.span.lo >= a))
            .collect();
        comments.sort_by_key(|c| Reverse(c.span.lo));

        let mut start = pos;
        let mut start_line = self.line(pos);
        for comment in comments {
            let line = self.line(comment.span.lo);
            let last = BytePos(comment.span.hi.0.saturating_sub(1)).max(comment.span.lo);
            let end_line = self.line(last);
            if end_line + 1 < start_line || after_line.is_some_and(|l| line <= l) {
                break;
            }
            start = comment.span.lo;
            start_line = line;
        }
        start
    }

    pub fn push_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn extend_edits(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty() || !self.pending_imports.is_empty()
    }

    /// Apply all edits to the original text.
    ///
    /// Inserts sort before replacements at the same offset. An edit that
    /// starts inside an already applied range is dropped and reported.
    pub fn render(&self) -> Rendered {
        let mut edits: Vec<(usize, &Edit)> = self.edits.iter().enumerate().collect();
        let import_edits: Vec<Edit> = self
            .pending_imports
            .iter()
            .map(|pending| {
                let decl = format!(
                    "import {{ {} }} from {};",
                    pending.symbols.join(", "),
                    quote(&pending.source)
                );
                let text = if pending.leading_newline {
                    format!("\n{decl}")
                } else {
                    format!("{decl}\n")
                };
                Edit::insert(pending.at, text, EditOrder::Import)
            })
            .collect();
        let base = edits.len();
        edits.extend(import_edits.iter().enumerate().map(|(i, e)| (base + i, e)));

        edits.sort_by_key(|(seq, edit)| (edit.start, !edit.is_insert(), edit.order, *seq));

        let mut text = String::with_capacity(self.text.len() + 64 * edits.len());
        let mut violations = Vec::new();
        let mut cursor = 0;
        for (_, edit) in edits {
            if edit.start < cursor || edit.end > self.text.len() || edit.end < edit.start {
                violations.push(format!(
                    "skipped overlapping edit at bytes {}..{}",
                    edit.start, edit.end
                ));
                continue;
            }
            text.push_str(&self.text[cursor..edit.start]);
            text.push_str(&edit.text);
            cursor = edit.end;
        }
        text.push_str(&self.text[cursor..]);

        Rendered { text, violations }
    }
}

/// Render `value` as a double-quoted JS string literal.
pub fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
