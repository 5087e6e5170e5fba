//! Rewrites translatable text into translation calls.
//!
//! The transformer walks the module once with a stack of function frames.
//! Each detected node is attributed to the innermost frame that can hold a
//! translation binding; plain helpers and anonymous callbacks defer to the
//! frame around them. When a frame ends and something inside it was
//! wrapped, its binding is injected according to its [`BindingPlan`].
//!
//! All output is expressed as byte-range [`Edit`]s against the original
//! text. Nodes are never revisited once replaced, so no node is wrapped twice.

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, DefaultDecl, ExportDefaultDecl,
    ExportDefaultExpr, Expr, FnDecl, FnExpr, Function, ImportDecl, JSXAttr, JSXAttrValue,
    JSXElement, JSXElementName, JSXText, Lit, MemberProp, Module, ModuleItem, Pat, PropName,
    PropOrSpread, Stmt, Str, TaggedTpl, Tpl, TsConstAssertion, TsType, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::config::Mode;
use crate::core::classify::{
    BindingPlan, ComponentContext, FunctionFacts, FunctionRole, arrow_binding, block_calls,
    body_calls, function_binding, module_declares,
};
use crate::core::detect::{CanonicalKey, Detector, IgnoreIndex, NodeKind, TranslatableNode};
use crate::core::imports::directive_value;
use crate::core::source::{Edit, EditOrder, SourceFile, quote};

/// JSX elements whose children are raw text, not UI copy.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

#[derive(Debug, Clone)]
pub struct TransformOptions<'a> {
    pub mode: Mode,
    pub translation_function: &'a str,
    pub hook_name: &'a str,
    pub server_translation_function: &'a str,
    pub namespace: Option<&'a str>,
    /// Emit the namespace as a type argument too (TypeScript only).
    pub typed_namespace: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedFunction {
    pub name: Option<String>,
    pub role: FunctionRole,
    pub plan: BindingPlan,
    pub wrapped: usize,
}

#[derive(Debug, Default)]
pub struct Transformation {
    pub edits: Vec<Edit>,
    pub nodes: Vec<TranslatableNode>,
    pub functions: Vec<TransformedFunction>,
}

impl Transformation {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn injects_hook(&self) -> bool {
        self.functions
            .iter()
            .any(|f| f.plan == BindingPlan::InjectHook)
    }

    pub fn injects_server_accessor(&self) -> bool {
        self.functions
            .iter()
            .any(|f| matches!(f.plan, BindingPlan::InjectServer { .. }))
    }

    /// Whether a component or hook was rewritten.
    pub fn touches_client_function(&self) -> bool {
        self.functions
            .iter()
            .any(|f| matches!(f.role, FunctionRole::Component | FunctionRole::Hook))
    }

    pub fn keys(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.key.text().to_string()).collect()
    }
}

/// Run the transformer over a parsed file.
pub fn transform(
    file: &SourceFile,
    detector: Detector<'_>,
    ignores: &IgnoreIndex,
    options: &TransformOptions<'_>,
) -> Transformation {
    let t = options.translation_function;
    let mut transformer = Transformer {
        file,
        detector,
        ignores,
        options,
        module_binding: module_declares(&file.parsed.module, t).then(|| t.to_string()),
        frames: Vec::new(),
        in_params: 0,
        out: Transformation::default(),
    };
    file.parsed.module.visit_with(&mut transformer);
    transformer.out
}

/// Where a new binding statement goes.
enum BindingAnchor {
    /// Before the first non-directive statement of a block body.
    Before {
        at: usize,
        inline: bool,
        indent: String,
    },
    /// Body holds no statements besides directives.
    Append { at: usize },
    /// Expression body; rewritten into a block with `return`.
    Concise {
        start: usize,
        end: usize,
        indent: String,
    },
}

struct Frame {
    context: ComponentContext,
    plan: BindingPlan,
    anchor: Option<BindingAnchor>,
    function_start: usize,
    wrapped: usize,
    /// Callee for translation calls when a binding already exists in this
    /// function or around it.
    existing: Option<String>,
}

struct Transformer<'a> {
    file: &'a SourceFile,
    detector: Detector<'a>,
    ignores: &'a IgnoreIndex,
    options: &'a TransformOptions<'a>,
    /// Set when the module imports or declares the translation function.
    module_binding: Option<String>,
    frames: Vec<Frame>,
    in_params: usize,
    out: Transformation,
}

impl<'a> Transformer<'a> {
    fn is_ignored_at(&self, pos: BytePos) -> bool {
        !self.ignores.is_empty() && self.ignores.is_ignored(self.file.line(pos))
    }

    /// Innermost frame able to hold a binding.
    fn owner(&self) -> Option<usize> {
        if self.in_params > 0 {
            return None;
        }
        self.frames.iter().rposition(|f| f.plan.is_available())
    }

    fn call_text(&self, owner: usize, key: &CanonicalKey) -> String {
        let t = self.frames[owner]
            .existing
            .as_deref()
            .unwrap_or(self.options.translation_function);
        match key {
            CanonicalKey::Text(text) => format!("{t}({})", quote(text)),
            CanonicalKey::Pattern { pattern, variables } => {
                let fields: Vec<String> = variables
                    .iter()
                    .map(|v| {
                        if v.name == v.source {
                            v.name.clone()
                        } else {
                            format!("{}: {}", v.name, v.source)
                        }
                    })
                    .collect();
                format!("{t}({}, {{ {} }})", quote(pattern), fields.join(", "))
            }
        }
    }

    fn record(&mut self, owner: usize, node: TranslatableNode, replacement: String) {
        self.frames[owner].wrapped += 1;
        self.out
            .edits
            .push(Edit::replace(node.start, node.end, replacement));
        self.out.nodes.push(node);
    }

    fn wrap_string(&mut self, s: &Str, kind: NodeKind) {
        let Some(value) = s.value.as_str() else {
            return;
        };
        let Some(key) = self.detector.literal_key(value) else {
            return;
        };
        if self.is_ignored_at(s.span.lo) {
            return;
        }
        let Some(owner) = self.owner() else {
            return;
        };

        let key = CanonicalKey::Text(key);
        let call = self.call_text(owner, &key);
        let replacement = match kind {
            NodeKind::JsxAttribute => format!("{{{call}}}"),
            _ => call,
        };
        let node = TranslatableNode {
            kind,
            start: self.file.offset(s.span.lo),
            end: self.file.offset(s.span.hi),
            raw: self.file.slice(s.span.lo, s.span.hi).to_string(),
            key,
        };
        self.record(owner, node, replacement);
    }

    /// Returns false when the template was left alone and its children
    /// still need visiting.
    fn wrap_template(&mut self, tpl: &Tpl) -> bool {
        let sources: Vec<String> = tpl
            .exprs
            .iter()
            .map(|e| {
                let span = e.span();
                self.file.slice(span.lo, span.hi).to_string()
            })
            .collect();
        let Some(key) = self.detector.template_key(tpl, &sources) else {
            return false;
        };
        if self.is_ignored_at(tpl.span.lo) {
            return true;
        }
        let Some(owner) = self.owner() else {
            return false;
        };

        let replacement = self.call_text(owner, &key);
        let node = TranslatableNode {
            kind: NodeKind::TemplateLiteral,
            start: self.file.offset(tpl.span.lo),
            end: self.file.offset(tpl.span.hi),
            raw: self.file.slice(tpl.span.lo, tpl.span.hi).to_string(),
            key,
        };
        self.record(owner, node, replacement);
        true
    }

    fn block_anchor(&self, block: &BlockStmt) -> BindingAnchor {
        let first = block.stmts.iter().position(|s| directive_value(s).is_none());
        match first.map(|i| (i, &block.stmts[i])) {
            Some((i, stmt)) => {
                // Go above the statement's own comments so an ignore marker
                // stays attached to the statement it annotates.
                let prev_hi = match i {
                    0 => block.span.lo,
                    _ => block.stmts[i - 1].span().hi,
                };
                let lo = self.file.attached_comments_start(Some(prev_hi), stmt.span().lo);
                let at = self.file.offset(lo);
                BindingAnchor::Before {
                    at,
                    inline: self.file.line(lo) == self.file.line(block.span.lo),
                    indent: self.file.indent_at(at).to_string(),
                }
            }
            None => match block.stmts.last() {
                Some(last) => BindingAnchor::Append {
                    at: self.file.offset(last.span().hi),
                },
                None => BindingAnchor::Append {
                    at: self.file.offset(block.span.lo) + 1,
                },
            },
        }
    }

    fn push_frame(
        &mut self,
        facts: FunctionFacts<'_>,
        own_binding: Option<String>,
        anchor: Option<BindingAnchor>,
        function_start: BytePos,
    ) {
        let inherited = match self.frames.last() {
            Some(parent) => parent.existing.clone(),
            None => self.module_binding.clone(),
        };
        let context = ComponentContext::new(facts, own_binding.is_some())
            .with_inherited_binding(inherited.is_some());
        let plan = context.plan(self.options.mode);
        self.frames.push(Frame {
            context,
            plan,
            anchor,
            function_start: self.file.offset(function_start),
            wrapped: 0,
            existing: own_binding.or(inherited),
        });
    }

    /// Names already known to call the translation function.
    fn is_translation_callee(&self, name: &str) -> bool {
        name == self.options.translation_function
            || self
                .frames
                .iter()
                .any(|f| f.existing.as_deref() == Some(name))
    }

    fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if frame.wrapped == 0 {
            return;
        }

        let t = self.options.translation_function;
        let namespace = self.options.namespace.map(quote).unwrap_or_default();
        let binding = match frame.plan {
            BindingPlan::Reuse | BindingPlan::Unavailable => None,
            BindingPlan::InjectHook => {
                let type_args = match self.options.namespace {
                    Some(ns) if self.options.typed_namespace => format!("<{}>", quote(ns)),
                    _ => String::new(),
                };
                Some(format!(
                    "const {{ {t} }} = {}{type_args}({namespace});",
                    self.options.hook_name
                ))
            }
            BindingPlan::InjectServer { .. } => Some(format!(
                "const {{ {t} }} = await {}({namespace});",
                self.options.server_translation_function
            )),
        };

        if let (Some(binding), Some(anchor)) = (binding, &frame.anchor) {
            match anchor {
                BindingAnchor::Before { at, inline, indent } => {
                    let text = if *inline {
                        format!("{binding} ")
                    } else {
                        format!("{binding}\n{indent}")
                    };
                    self.out.edits.push(Edit::insert(*at, text, EditOrder::Body));
                }
                BindingAnchor::Append { at } => {
                    self.out
                        .edits
                        .push(Edit::insert(*at, format!(" {binding} "), EditOrder::Body));
                }
                BindingAnchor::Concise { start, end, indent } => {
                    self.out.edits.push(Edit::insert(
                        *start,
                        format!("{{\n{indent}  {binding}\n{indent}  return "),
                        EditOrder::Body,
                    ));
                    self.out.edits.push(Edit::insert(
                        *end,
                        format!(";\n{indent}}}"),
                        EditOrder::Body,
                    ));
                }
            }
        }

        if let BindingPlan::InjectServer { make_async: true } = frame.plan {
            self.out.edits.push(Edit::insert(
                frame.function_start,
                "async ",
                EditOrder::Body,
            ));
        }

        self.out.functions.push(TransformedFunction {
            name: frame.context.name,
            role: frame.context.role,
            plan: frame.plan,
            wrapped: frame.wrapped,
        });
    }

    fn visit_params<T: VisitWith<Self>>(&mut self, params: &[T]) {
        self.in_params += 1;
        for param in params {
            param.visit_with(self);
        }
        self.in_params -= 1;
    }

    fn visit_function_like(&mut self, name: Option<&str>, default_export: bool, function: &Function) {
        let server = self.options.server_translation_function;
        let facts = FunctionFacts {
            name,
            default_export,
            is_async: function.is_async,
            calls_server_accessor: function
                .body
                .as_ref()
                .is_some_and(|body| block_calls(body, server)),
        };
        let own_binding =
            function_binding(function, self.options.translation_function, &self.accessors());
        let anchor = function.body.as_ref().map(|body| self.block_anchor(body));

        // `async` goes right before the `function` keyword, wherever the
        // span itself starts.
        let head_end = function.body.as_ref().map_or(function.span.hi, |b| b.span.lo);
        let keyword_start = self
            .file
            .slice(function.span.lo, head_end)
            .find("function")
            .map_or(function.span.lo, |idx| function.span.lo + BytePos(idx as u32));

        self.push_frame(facts, own_binding, anchor, keyword_start);
        self.visit_params(&function.params);
        if let Some(body) = &function.body {
            body.visit_with(self);
        }
        self.pop_frame();
    }

    fn visit_arrow_like(&mut self, name: Option<&str>, default_export: bool, arrow: &ArrowExpr) {
        let facts = FunctionFacts {
            name,
            default_export,
            is_async: arrow.is_async,
            calls_server_accessor: body_calls(&arrow.body, self.options.server_translation_function),
        };
        let own_binding =
            arrow_binding(arrow, self.options.translation_function, &self.accessors());
        let anchor = match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => self.block_anchor(block),
            BlockStmtOrExpr::Expr(expr) => {
                let span = expr.span();
                BindingAnchor::Concise {
                    start: self.file.offset(span.lo),
                    end: self.file.offset(span.hi),
                    indent: self
                        .file
                        .indent_at(self.file.offset(arrow.span.lo))
                        .to_string(),
                }
            }
        };

        self.push_frame(facts, own_binding, Some(anchor), arrow.span.lo);
        self.visit_params(&arrow.params);
        arrow.body.visit_with(self);
        self.pop_frame();
    }

    /// Handle `const Name = <function>` including wrapped forms such as
    /// `memo(() => ...)`. Returns false if `init` is not function-like.
    fn visit_named_init(&mut self, name: Option<&str>, default_export: bool, init: &Expr) -> bool {
        match init {
            Expr::Arrow(arrow) => {
                self.visit_arrow_like(name, default_export, arrow);
                true
            }
            Expr::Fn(fn_expr) => {
                let own_name = fn_expr.ident.as_ref().map(|i| i.sym.as_str());
                let name = own_name.or(name);
                self.visit_function_like(name, default_export && name.is_none(), &fn_expr.function);
                true
            }
            Expr::Paren(paren) => self.visit_named_init(name, default_export, &paren.expr),
            Expr::Call(call) if call.args.iter().any(|a| is_function_expr(&a.expr)) => {
                call.callee.visit_with(self);
                let mut named = false;
                for arg in &call.args {
                    if !named && is_function_expr(&arg.expr) {
                        named = self.visit_named_init(name, default_export, &arg.expr);
                    } else {
                        arg.visit_with(self);
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn accessors(&self) -> [&'a str; 2] {
        [self.options.hook_name, self.options.server_translation_function]
    }

    fn is_skipped_call(&self, call: &CallExpr) -> bool {
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let name = match &**callee {
            Expr::Ident(ident) => ident.sym.as_str(),
            Expr::Member(member) => match &member.prop {
                MemberProp::Ident(prop) => {
                    return prop.sym == self.options.translation_function;
                }
                _ => return false,
            },
            _ => return false,
        };
        self.is_translation_callee(name) || self.accessors().contains(&name)
    }
}

fn is_function_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Arrow(_) | Expr::Fn(_) => true,
        Expr::Paren(paren) => is_function_expr(&paren.expr),
        _ => false,
    }
}

fn is_raw_text_element(name: &JSXElementName) -> bool {
    matches!(name, JSXElementName::Ident(ident) if RAW_TEXT_ELEMENTS.contains(&ident.sym.as_str()))
}

impl Visit for Transformer<'_> {
    fn visit_module(&mut self, node: &Module) {
        for item in &node.body {
            item.visit_with(self);
        }
    }

    fn visit_module_item(&mut self, node: &ModuleItem) {
        if self.is_ignored_at(node.span().lo) {
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_stmt(&mut self, node: &Stmt) {
        if self.is_ignored_at(node.span().lo) {
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    fn visit_ts_type(&mut self, _: &TsType) {}

    fn visit_ts_const_assertion(&mut self, _: &TsConstAssertion) {}

    fn visit_prop_or_spread(&mut self, node: &PropOrSpread) {
        if self.is_ignored_at(node.span().lo) {
            return;
        }
        node.visit_children_with(self);
    }

    /// Object keys are identifiers, not copy.
    fn visit_prop_name(&mut self, _: &PropName) {}

    fn visit_member_prop(&mut self, node: &MemberProp) {
        if let MemberProp::Computed(computed) = node
            && !matches!(&*computed.expr, Expr::Lit(Lit::Str(_)))
        {
            computed.expr.visit_with(self);
        }
    }

    fn visit_expr(&mut self, node: &Expr) {
        match node {
            Expr::Lit(Lit::Str(s)) => self.wrap_string(s, NodeKind::StringLiteral),
            Expr::Tpl(tpl) => {
                if !self.wrap_template(tpl) {
                    tpl.visit_children_with(self);
                }
            }
            _ => node.visit_children_with(self),
        }
    }

    fn visit_tagged_tpl(&mut self, _: &TaggedTpl) {}

    fn visit_call_expr(&mut self, node: &CallExpr) {
        if self.is_skipped_call(node) {
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_jsx_element(&mut self, node: &JSXElement) {
        if self.is_ignored_at(node.span.lo) {
            return;
        }
        node.opening.visit_with(self);
        if is_raw_text_element(&node.opening.name) {
            return;
        }
        for child in &node.children {
            child.visit_with(self);
        }
    }

    fn visit_jsx_attr(&mut self, node: &JSXAttr) {
        if self.is_ignored_at(node.span.lo) {
            return;
        }
        match &node.value {
            Some(JSXAttrValue::Str(s)) => self.wrap_string(s, NodeKind::JsxAttribute),
            Some(value) => value.visit_with(self),
            None => {}
        }
    }

    fn visit_jsx_text(&mut self, node: &JSXText) {
        let raw = self.file.slice(node.span.lo, node.span.hi);
        let Some(key) = self.detector.jsx_text_key(raw) else {
            return;
        };

        let lead = raw.len() - raw.trim_start().len();
        let trail = raw.len() - raw.trim_end().len();
        let text_lo = node.span.lo + BytePos(lead as u32);
        if self.is_ignored_at(text_lo) {
            return;
        }
        let Some(owner) = self.owner() else {
            return;
        };

        let start = self.file.offset(node.span.lo) + lead;
        let end = self.file.offset(node.span.hi) - trail;
        let key = CanonicalKey::Text(key);
        let replacement = format!("{{{}}}", self.call_text(owner, &key));
        let node = TranslatableNode {
            kind: NodeKind::JsxText,
            start,
            end,
            raw: raw.trim().to_string(),
            key,
        };
        self.record(owner, node, replacement);
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.visit_function_like(Some(node.ident.sym.as_str()), false, &node.function);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        let name = node.ident.as_ref().map(|i| i.sym.as_str());
        self.visit_function_like(name, false, &node.function);
    }

    /// Methods, getters and other functions reached without a name.
    fn visit_function(&mut self, node: &Function) {
        self.visit_function_like(None, false, node);
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.visit_arrow_like(None, false, node);
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if let Pat::Ident(binding) = &node.name
            && let Some(init) = &node.init
            && self.visit_named_init(Some(binding.id.sym.as_str()), false, init)
        {
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_export_default_decl(&mut self, node: &ExportDefaultDecl) {
        if let DefaultDecl::Fn(fn_expr) = &node.decl {
            let name = fn_expr.ident.as_ref().map(|i| i.sym.as_str());
            self.visit_function_like(name, name.is_none(), &fn_expr.function);
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, node: &ExportDefaultExpr) {
        match &*node.expr {
            Expr::Arrow(arrow) => self.visit_arrow_like(None, true, arrow),
            Expr::Call(_) | Expr::Paren(_) if is_wrapped_function(&node.expr) => {
                // `export default memo(() => ...)`
                self.visit_named_init(None, true, &node.expr);
            }
            _ => node.visit_children_with(self),
        }
    }
}

fn is_wrapped_function(expr: &Expr) -> bool {
    match expr {
        Expr::Call(call) => call.args.iter().any(|a| is_function_expr(&a.expr)),
        Expr::Paren(paren) => is_function_expr(&paren.expr),
        _ => false,
    }
}
