//! `i18n-ignore` marker resolution.
//!
//! A marker comment suppresses the next code line. Consecutive comment lines
//! between the marker and the code are skipped over; a blank line breaks the
//! chain:
//!
//! ```tsx
//! {/* i18n-ignore */}
//! {/* decorative */}
//! <p>안녕하세요</p>   // <- ignored
//! ```
//!
//! A marker trailing code on the same line suppresses that line only.

use std::collections::HashSet;

use swc_common::BytePos;

use crate::core::parsers::jsx::ParsedJSX;

pub const IGNORE_MARKER: &str = "i18n-ignore";

/// Maximum number of consecutive comment lines to skip when looking for the
/// line a marker applies to.
pub const MAX_COMMENT_CHAIN_LINES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct IgnoreIndex {
    lines: HashSet<usize>,
}

impl IgnoreIndex {
    pub fn build(parsed: &ParsedJSX, text: &str) -> Self {
        let layout = CommentLayout::new(parsed, text);
        let mut lines = HashSet::new();

        for cmt in parsed.comments.iter() {
            if !cmt.text.contains(IGNORE_MARKER) {
                continue;
            }
            let lo = layout.offset(cmt.span.lo);
            let hi = layout.offset(cmt.span.hi);
            let start = layout.line_of(lo);
            let end = layout.line_of(hi.saturating_sub(1).max(lo));
            if layout.comment_only.contains(&start) {
                lines.insert(find_next_non_comment_line(end, &layout.comment_only));
            } else {
                lines.insert(start);
            }
        }

        Self { lines }
    }

    pub fn is_ignored(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Line geometry of a file plus the lines made up of comments only, taken
/// from the parser's comment spans.
struct CommentLayout {
    start_pos: BytePos,
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    /// 1-based numbers of lines holding comment text and nothing else but
    /// whitespace or the braces of a JSX comment container.
    comment_only: HashSet<usize>,
}

impl CommentLayout {
    fn new(parsed: &ParsedJSX, text: &str) -> Self {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        let mut covered = vec![false; text.len()];
        for cmt in parsed.comments.iter() {
            let lo = cmt.span.lo.0.saturating_sub(parsed.start_pos.0) as usize;
            let hi = cmt.span.hi.0.saturating_sub(parsed.start_pos.0) as usize;
            if let Some(range) = covered.get_mut(lo.min(text.len())..hi.min(text.len())) {
                range.fill(true);
            }
        }

        let bytes = text.as_bytes();
        let comment_only = line_starts
            .iter()
            .enumerate()
            .filter(|&(idx, &line_start)| {
                let line_end = line_starts.get(idx + 1).map_or(text.len(), |next| next - 1);
                let range = line_start..line_end;
                let filler = |i: usize| bytes[i].is_ascii_whitespace() || matches!(bytes[i], b'{' | b'}');
                range.clone().any(|i| covered[i]) && range.into_iter().all(|i| covered[i] || filler(i))
            })
            .map(|(idx, _)| idx + 1)
            .collect();

        Self {
            start_pos: parsed.start_pos,
            line_starts,
            comment_only,
        }
    }

    fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.start_pos.0) as usize
    }

    /// 1-based line containing byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

fn find_next_non_comment_line(line: usize, comment_lines: &HashSet<usize>) -> usize {
    let mut next = line + 1;
    let max_line = line + MAX_COMMENT_CHAIN_LINES;
    while comment_lines.contains(&next) && next < max_line {
        next += 1;
    }
    next
}
