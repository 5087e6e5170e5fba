use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use swc_common::{
    BytePos, FileName, Globals, SourceMap,
    comments::{Comment, SingleThreadedComments},
};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

/// Map of byte positions to comments.
pub type CommentMap = HashMap<BytePos, Vec<Comment>>;

/// Comments copied out of `SingleThreadedComments` so the parsed file can
/// move across threads.
#[derive(Debug, Clone, Default)]
pub struct ExtractedComments {
    pub leading: CommentMap,
    pub trailing: CommentMap,
}

impl ExtractedComments {
    /// Must be called before the `SingleThreadedComments` is dropped.
    pub fn from_swc(comments: &SingleThreadedComments) -> Self {
        let (leading, trailing) = comments.borrow_all();
        Self {
            leading: leading.iter().map(|(k, v)| (*k, v.clone())).collect(),
            trailing: trailing.iter().map(|(k, v)| (*k, v.clone())).collect(),
        }
    }

    /// Every comment in the file, leading and trailing.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.leading
            .values()
            .chain(self.trailing.values())
            .flat_map(|cmts| cmts.iter())
    }
}

pub struct ParsedJSX {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
    pub comments: ExtractedComments,
    /// Position of the first byte of this file inside `source_map`.
    pub start_pos: BytePos,
}

/// Parse JS/JSX/TS/TSX source into a module.
///
/// Every file gets its own `SourceMap` in the wrapping pipeline, so spans can
/// be turned into byte offsets by subtracting `start_pos`.
pub fn parse_jsx_source(
    code: String,
    file_path: &str,
    source_map: Arc<SourceMap>,
) -> Result<ParsedJSX> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_file = source_map.new_source_file(FileName::Real(file_path.into()).into(), code);

        // `.ts` files allow `<T>expr` casts, which conflict with JSX.
        let tsx = !file_path.ends_with(".ts");
        let syntax = Syntax::Typescript(TsSyntax {
            tsx,
            ..Default::default()
        });

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), Some(&comments));

        let module = parser
            .parse_module()
            .map_err(|e| anyhow!("{:?}", e.kind()))?;

        // Recoverable errors still produce a module, but rewriting a file the
        // parser had to guess about is unsafe.
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(anyhow!("{:?}", err.kind()));
        }

        let extracted_comments = ExtractedComments::from_swc(&comments);

        Ok(ParsedJSX {
            module,
            source_map,
            comments: extracted_comments,
            start_pos: source_file.start_pos,
        })
    })
}
