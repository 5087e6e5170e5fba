//! Import, directive and hook-argument maintenance.
//!
//! Every operation here is idempotent per file: ensuring the same import or
//! directive twice produces one edit.

use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{
    CallExpr, Callee, Expr, ExprStmt, ImportDecl, ImportSpecifier, Lit, ModuleDecl, ModuleItem,
    Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::source::{Edit, EditOrder, PendingImport, SourceFile, quote};

pub const CLIENT_DIRECTIVE: &str = "use client";
pub const SERVER_DIRECTIVE: &str = "use server";

/// The string value of a directive-shaped statement (`"use client";`).
pub fn directive_value(stmt: &Stmt) -> Option<&str> {
    match stmt {
        Stmt::Expr(ExprStmt { expr, .. }) => match &**expr {
            Expr::Lit(Lit::Str(s)) => s.value.as_str(),
            _ => None,
        },
        _ => None,
    }
}

fn leading_directives(file: &SourceFile) -> Vec<(&str, Span)> {
    file.parsed
        .module
        .body
        .iter()
        .map_while(|item| match item {
            ModuleItem::Stmt(stmt) => directive_value(stmt).map(|value| (value, stmt.span())),
            ModuleItem::ModuleDecl(_) => None,
        })
        .collect()
}

/// Make `symbol` importable from `source`.
///
/// Merges into an existing value import of `source` when there is one,
/// otherwise queues a new import declaration placed after any leading
/// directives. Returns whether anything changed.
pub fn ensure_named_import(file: &mut SourceFile, source: &str, symbol: &str) -> bool {
    if !file
        .ensured_imports
        .insert((source.to_string(), symbol.to_string()))
    {
        return false;
    }

    let mut merge = None;
    for item in &file.parsed.module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
            continue;
        };
        if import.type_only || import.src.value.as_str() != Some(source) {
            continue;
        }
        if imports_symbol(import, symbol) {
            return false;
        }
        if merge.is_none() {
            merge = merge_edit(file, import, symbol);
        }
    }

    if let Some(edit) = merge {
        file.push_edit(edit);
        return true;
    }

    if let Some(pending) = file
        .pending_imports
        .iter_mut()
        .find(|pending| pending.source == source)
    {
        if !pending.symbols.iter().any(|s| s == symbol) {
            pending.symbols.push(symbol.to_string());
        }
        return true;
    }

    let (at, leading_newline) = import_insertion_point(file);
    file.pending_imports.push(PendingImport {
        source: source.to_string(),
        symbols: vec![symbol.to_string()],
        at,
        leading_newline,
    });
    true
}

fn imports_symbol(import: &ImportDecl, symbol: &str) -> bool {
    import.specifiers.iter().any(|spec| match spec {
        ImportSpecifier::Named(named) => !named.is_type_only && named.local.sym == symbol,
        ImportSpecifier::Default(default) => default.local.sym == symbol,
        ImportSpecifier::Namespace(_) => false,
    })
}

fn merge_edit(file: &SourceFile, import: &ImportDecl, symbol: &str) -> Option<Edit> {
    if import
        .specifiers
        .iter()
        .any(|s| matches!(s, ImportSpecifier::Namespace(_)))
    {
        return None;
    }

    let last_named = import.specifiers.iter().rev().find_map(|s| match s {
        ImportSpecifier::Named(named) => Some(named.span),
        _ => None,
    });
    if let Some(span) = last_named {
        return Some(Edit::insert(
            file.offset(span.hi),
            format!(", {symbol}"),
            EditOrder::Import,
        ));
    }

    import.specifiers.iter().find_map(|s| match s {
        ImportSpecifier::Default(default) => Some(Edit::insert(
            file.offset(default.span.hi),
            format!(", {{ {symbol} }}"),
            EditOrder::Import,
        )),
        _ => None,
    })
}

/// After the last leading directive, or before the first statement.
fn import_insertion_point(file: &SourceFile) -> (usize, bool) {
    let directives = leading_directives(file);
    if let Some((_, span)) = directives.last() {
        return (file.offset(span.hi), true);
    }
    match file.parsed.module.body.first() {
        Some(item) => {
            let lo = file.attached_comments_start(None, item.span().lo);
            (file.offset(lo), false)
        }
        None => (0, false),
    }
}

/// Add `"<directive>";` at the top of the file.
///
/// Skipped when the file already carries the directive or is marked
/// `"use server"`. A shebang line stays first.
pub fn ensure_directive(file: &mut SourceFile, directive: &str) -> bool {
    if file.directive_ensured {
        return false;
    }
    let present = leading_directives(file)
        .iter()
        .any(|(value, _)| *value == directive || *value == SERVER_DIRECTIVE);
    if present {
        return false;
    }

    file.directive_ensured = true;
    let at = if file.text.starts_with("#!") {
        file.text.find('\n').map_or(file.text.len(), |idx| idx + 1)
    } else {
        0
    };
    file.push_edit(Edit::insert(
        at,
        format!("{};\n", quote(directive)),
        EditOrder::Directive,
    ));
    true
}

/// First non-empty string argument passed to `hook(...)` in the file.
pub fn explicit_namespace(file: &SourceFile, hook: &str) -> Option<String> {
    let mut calls = HookCalls {
        hook,
        calls: Vec::new(),
    };
    file.parsed.module.visit_with(&mut calls);
    calls
        .calls
        .into_iter()
        .find_map(|call| call.argument.filter(|arg| !arg.value.is_empty()))
        .map(|arg| arg.value)
}

/// Fill in the namespace on existing argument-less `hook()` calls. With
/// `typed`, calls without type arguments also get `<"namespace">`.
///
/// Returns the number of calls updated.
pub fn ensure_hook_namespace(
    file: &mut SourceFile,
    hook: &str,
    namespace: &str,
    typed: bool,
) -> usize {
    let mut calls = HookCalls {
        hook,
        calls: Vec::new(),
    };
    file.parsed.module.visit_with(&mut calls);

    let mut edits = Vec::new();
    let mut updated = 0;
    for call in calls.calls {
        let filled = match call.argument {
            None if call.arg_count == 0 => {
                let close = file.offset(call.span.hi).saturating_sub(1);
                Edit::insert(close, quote(namespace), EditOrder::Body)
            }
            Some(arg) if arg.value.is_empty() => Edit::replace(
                file.offset(arg.span.lo),
                file.offset(arg.span.hi),
                quote(namespace),
            ),
            _ => continue,
        };
        if typed && let Some(callee_end) = call.untyped_callee_end {
            edits.push(Edit::insert(
                file.offset(callee_end),
                format!("<{}>", quote(namespace)),
                EditOrder::Body,
            ));
        }
        edits.push(filled);
        updated += 1;
    }

    file.extend_edits(edits);
    updated
}

struct StringArgument {
    value: String,
    span: Span,
}

struct HookCall {
    span: Span,
    /// End of the callee when the call has no type arguments.
    untyped_callee_end: Option<BytePos>,
    arg_count: usize,
    argument: Option<StringArgument>,
}

struct HookCalls<'a> {
    hook: &'a str,
    calls: Vec<HookCall>,
}

impl Visit for HookCalls<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = &**callee
            && ident.sym == self.hook
        {
            let argument = node.args.first().and_then(|arg| match &*arg.expr {
                Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|value| StringArgument {
                    value: value.to_string(),
                    span: s.span,
                }),
                _ => None,
            });
            self.calls.push(HookCall {
                span: node.span,
                untyped_callee_end: node.type_args.is_none().then_some(ident.span.hi),
                arg_count: node.args.len(),
                argument,
            });
        }
        node.visit_children_with(self);
    }
}
