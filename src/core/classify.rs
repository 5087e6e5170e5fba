//! Function role classification.
//!
//! The role of the nearest enclosing named function decides how a
//! translation binding can be made available inside it.

use swc_ecma_ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, CallExpr, Callee, Class, Decl, Expr, FnDecl, Function,
    ImportSpecifier, Module, ModuleDecl, ModuleItem, ObjectPatProp, Pat, PropName, Stmt,
    VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::config::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionRole {
    Component,
    Hook,
    ServerFunction,
    PlainFunction,
}

impl FunctionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionRole::Component => "component",
            FunctionRole::Hook => "hook",
            FunctionRole::ServerFunction => "server function",
            FunctionRole::PlainFunction => "function",
        }
    }
}

/// How a function gets access to the translation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingPlan {
    /// A binding already exists in scope.
    Reuse,
    /// Inject `const { t } = useTranslation();`.
    InjectHook,
    /// Inject `const { t } = await getServerTranslation();`.
    InjectServer { make_async: bool },
    /// No binding can be injected here; defer to the enclosing function.
    Unavailable,
}

impl BindingPlan {
    pub fn is_available(self) -> bool {
        !matches!(self, BindingPlan::Unavailable)
    }
}

/// Facts about a function gathered before classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionFacts<'a> {
    pub name: Option<&'a str>,
    /// Anonymous `export default` function or arrow.
    pub default_export: bool,
    pub is_async: bool,
    pub calls_server_accessor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentContext {
    pub name: Option<String>,
    pub role: FunctionRole,
    pub is_async: bool,
    /// The function itself declares the translation function.
    pub has_binding: bool,
    /// An enclosing scope already provides it.
    pub inherits_binding: bool,
}

impl ComponentContext {
    pub fn new(facts: FunctionFacts<'_>, has_binding: bool) -> Self {
        Self {
            name: facts.name.map(str::to_string),
            role: classify(facts),
            is_async: facts.is_async,
            has_binding,
            inherits_binding: false,
        }
    }

    pub fn with_inherited_binding(mut self, inherits_binding: bool) -> Self {
        self.inherits_binding = inherits_binding;
        self
    }

    /// Plain functions never own an inherited binding; their text goes to
    /// the enclosing function.
    pub fn plan(&self, mode: Mode) -> BindingPlan {
        if self.has_binding {
            return BindingPlan::Reuse;
        }
        if self.inherits_binding && self.role != FunctionRole::PlainFunction {
            return BindingPlan::Reuse;
        }
        match self.role {
            FunctionRole::Component => match mode {
                Mode::Client => BindingPlan::InjectHook,
                Mode::Server => BindingPlan::InjectServer {
                    make_async: !self.is_async,
                },
            },
            FunctionRole::Hook => BindingPlan::InjectHook,
            FunctionRole::ServerFunction => BindingPlan::InjectServer { make_async: false },
            FunctionRole::PlainFunction => BindingPlan::Unavailable,
        }
    }
}

pub fn classify(facts: FunctionFacts<'_>) -> FunctionRole {
    match facts.name {
        Some(name) if is_component_name(name) => FunctionRole::Component,
        Some(name) if is_hook_name(name) => FunctionRole::Hook,
        None if facts.default_export => FunctionRole::Component,
        _ if facts.is_async && facts.calls_server_accessor => FunctionRole::ServerFunction,
        _ => FunctionRole::PlainFunction,
    }
}

pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// `use` alone, or `use` followed by an uppercase letter.
pub fn is_hook_name(name: &str) -> bool {
    match name.strip_prefix("use") {
        Some(rest) => rest.chars().next().is_none_or(|c| c.is_ascii_uppercase()),
        None => false,
    }
}

/// Whether `name` is bound by the function's parameters or declared in its
/// body (not counting nested functions).
pub fn function_declares(function: &Function, name: &str) -> bool {
    function.params.iter().any(|p| pat_binds(&p.pat, name))
        || function
            .body
            .as_ref()
            .is_some_and(|body| block_declares(body, name))
}

pub fn arrow_declares(arrow: &ArrowExpr, name: &str) -> bool {
    arrow.params.iter().any(|p| pat_binds(p, name))
        || match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => block_declares(block, name),
            BlockStmtOrExpr::Expr(_) => false,
        }
}

fn block_declares(block: &BlockStmt, name: &str) -> bool {
    let mut finder = DeclarationFinder { name, found: false };
    block.visit_with(&mut finder);
    finder.found
}

/// The expression that calls the translation function inside `function`,
/// when the function already obtains it.
///
/// `t` itself when a parameter or declaration binds it, the alias for
/// `const { t: tr } = useTranslation()`, and `translation.t` for
/// `const translation = useTranslation()`. `accessors` are the hook and
/// server accessor names.
pub fn function_binding(function: &Function, t: &str, accessors: &[&str]) -> Option<String> {
    if function_declares(function, t) {
        return Some(t.to_string());
    }
    function
        .body
        .as_ref()
        .and_then(|body| block_accessor_binding(body, t, accessors))
}

pub fn arrow_binding(arrow: &ArrowExpr, t: &str, accessors: &[&str]) -> Option<String> {
    if arrow_declares(arrow, t) {
        return Some(t.to_string());
    }
    match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => block_accessor_binding(block, t, accessors),
        BlockStmtOrExpr::Expr(_) => None,
    }
}

/// Whether `t` is imported, or declared at the top level of the module.
pub fn module_declares(module: &Module, t: &str) -> bool {
    module.body.iter().any(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
            !import.type_only
                && import.specifiers.iter().any(|spec| match spec {
                    ImportSpecifier::Named(named) => named.local.sym == t,
                    ImportSpecifier::Default(default) => default.local.sym == t,
                    ImportSpecifier::Namespace(ns) => ns.local.sym == t,
                })
        }
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => decl_declares(&export.decl, t),
        ModuleItem::Stmt(Stmt::Decl(decl)) => decl_declares(decl, t),
        _ => false,
    })
}

fn decl_declares(decl: &Decl, t: &str) -> bool {
    match decl {
        Decl::Fn(fn_decl) => fn_decl.ident.sym == t,
        Decl::Var(var) => var.decls.iter().any(|d| pat_binds(&d.name, t)),
        _ => false,
    }
}

fn block_accessor_binding(block: &BlockStmt, t: &str, accessors: &[&str]) -> Option<String> {
    let mut finder = AccessorBindingFinder {
        t,
        accessors,
        found: None,
    };
    block.visit_with(&mut finder);
    finder.found
}

/// Whether the function body calls `callee(...)` directly.
pub fn body_calls(body: &BlockStmtOrExpr, callee: &str) -> bool {
    let mut finder = CallFinder {
        callee,
        found: false,
    };
    body.visit_with(&mut finder);
    finder.found
}

pub fn block_calls(block: &BlockStmt, callee: &str) -> bool {
    let mut finder = CallFinder {
        callee,
        found: false,
    };
    block.visit_with(&mut finder);
    finder.found
}

pub fn pat_binds(pat: &Pat, name: &str) -> bool {
    match pat {
        Pat::Ident(ident) => ident.id.sym == name,
        Pat::Array(array) => array.elems.iter().flatten().any(|p| pat_binds(p, name)),
        Pat::Object(object) => object.props.iter().any(|prop| match prop {
            ObjectPatProp::KeyValue(kv) => pat_binds(&kv.value, name),
            ObjectPatProp::Assign(assign) => assign.key.id.sym == name,
            ObjectPatProp::Rest(rest) => pat_binds(&rest.arg, name),
        }),
        Pat::Rest(rest) => pat_binds(&rest.arg, name),
        Pat::Assign(assign) => pat_binds(&assign.left, name),
        _ => false,
    }
}

struct DeclarationFinder<'a> {
    name: &'a str,
    found: bool,
}

impl Visit for DeclarationFinder<'_> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if pat_binds(&node.name, self.name) {
            self.found = true;
        }
        // Initializers may hold closures; they belong to another scope.
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        if node.ident.sym == self.name {
            self.found = true;
        }
    }

    fn visit_stmt(&mut self, node: &Stmt) {
        if !self.found {
            node.visit_children_with(self);
        }
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_class(&mut self, _: &Class) {}
}

struct AccessorBindingFinder<'a> {
    t: &'a str,
    accessors: &'a [&'a str],
    found: Option<String>,
}

impl AccessorBindingFinder<'_> {
    fn is_accessor_call(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Await(await_expr) => self.is_accessor_call(&await_expr.arg),
            Expr::Paren(paren) => self.is_accessor_call(&paren.expr),
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => match &**callee {
                    Expr::Ident(ident) => self.accessors.contains(&ident.sym.as_str()),
                    _ => false,
                },
                _ => false,
            },
            _ => false,
        }
    }

    fn binding_in(&self, pat: &Pat) -> Option<String> {
        match pat {
            Pat::Ident(ident) => Some(format!("{}.{}", ident.id.sym, self.t)),
            Pat::Object(object) => object.props.iter().find_map(|prop| match prop {
                ObjectPatProp::KeyValue(kv) => {
                    let key = match &kv.key {
                        PropName::Ident(ident) => ident.sym.as_str(),
                        PropName::Str(s) => s.value.as_str()?,
                        _ => return None,
                    };
                    match &*kv.value {
                        Pat::Ident(alias) if key == self.t => Some(alias.id.sym.to_string()),
                        _ => None,
                    }
                }
                _ => None,
            }),
            _ => None,
        }
    }
}

impl Visit for AccessorBindingFinder<'_> {
    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if self.found.is_none()
            && let Some(init) = &node.init
            && self.is_accessor_call(init)
        {
            self.found = self.binding_in(&node.name);
        }
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_class(&mut self, _: &Class) {}
}

struct CallFinder<'a> {
    callee: &'a str,
    found: bool,
}

impl Visit for CallFinder<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(expr) = &node.callee
            && let Expr::Ident(ident) = &**expr
            && ident.sym == self.callee
        {
            self.found = true;
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_class(&mut self, _: &Class) {}
}

#[cfg(test)]
mod tests {
    use crate::core::classify::*;
    use crate::core::parsers::jsx::parse_jsx_source;
    use std::sync::Arc;
    use swc_common::SourceMap;

    const ACCESSORS: &[&str] = &["useTranslation", "getServerTranslation"];

    fn module(source: &str) -> Module {
        parse_jsx_source(source.to_string(), "test.tsx", Arc::new(SourceMap::default()))
            .unwrap()
            .module
    }

    fn first_function(source: &str) -> Function {
        match &module(source).body[0] {
            ModuleItem::Stmt(Stmt::Decl(Decl::Fn(fn_decl))) => (*fn_decl.function).clone(),
            _ => panic!("expected function declaration"),
        }
    }

    fn facts(name: &str) -> FunctionFacts<'_> {
        FunctionFacts {
            name: Some(name),
            ..Default::default()
        }
    }

    #[test]
    fn test_component_and_hook_names() {
        assert_eq!(classify(facts("Greeting")), FunctionRole::Component);
        assert_eq!(classify(facts("useProfile")), FunctionRole::Hook);
        assert_eq!(classify(facts("use")), FunctionRole::Hook);
        assert_eq!(classify(facts("user")), FunctionRole::PlainFunction);
        assert_eq!(classify(facts("formatDate")), FunctionRole::PlainFunction);
    }

    #[test]
    fn test_server_function_requires_async_and_accessor() {
        let server = FunctionFacts {
            name: Some("generateMetadata"),
            is_async: true,
            calls_server_accessor: true,
            ..Default::default()
        };
        assert_eq!(classify(server), FunctionRole::ServerFunction);

        let not_async = FunctionFacts {
            is_async: false,
            ..server
        };
        assert_eq!(classify(not_async), FunctionRole::PlainFunction);
    }

    #[test]
    fn test_anonymous_default_export_is_component() {
        let anonymous = FunctionFacts {
            default_export: true,
            ..Default::default()
        };
        assert_eq!(classify(anonymous), FunctionRole::Component);
        assert_eq!(classify(FunctionFacts::default()), FunctionRole::PlainFunction);
    }

    #[test]
    fn test_binding_plans() {
        let component = ComponentContext::new(facts("Page"), false);
        assert_eq!(component.plan(Mode::Client), BindingPlan::InjectHook);
        assert_eq!(
            component.plan(Mode::Server),
            BindingPlan::InjectServer { make_async: true }
        );

        let existing = ComponentContext::new(facts("Page"), true);
        assert_eq!(existing.plan(Mode::Server), BindingPlan::Reuse);

        let hook = ComponentContext::new(facts("useLabels"), false);
        assert_eq!(hook.plan(Mode::Server), BindingPlan::InjectHook);

        let plain = ComponentContext::new(facts("helper"), false);
        assert_eq!(plain.plan(Mode::Client), BindingPlan::Unavailable);

        let inherited = ComponentContext::new(facts("Inner"), false).with_inherited_binding(true);
        assert_eq!(inherited.plan(Mode::Server), BindingPlan::Reuse);
        let plain_inherited =
            ComponentContext::new(facts("helper"), false).with_inherited_binding(true);
        assert_eq!(plain_inherited.plan(Mode::Client), BindingPlan::Unavailable);
    }

    #[test]
    fn test_function_binding_aliases() {
        let aliased = first_function(
            "function A() { const { t: tr, i18n } = useTranslation(); return tr('x'); }",
        );
        assert_eq!(function_binding(&aliased, "t", ACCESSORS).as_deref(), Some("tr"));

        let whole = first_function(
            "async function A() { const translation = await getServerTranslation(); }",
        );
        assert_eq!(
            function_binding(&whole, "t", ACCESSORS).as_deref(),
            Some("translation.t")
        );

        let other_keys = first_function("function A() { const { i18n } = useTranslation(); }");
        assert_eq!(function_binding(&other_keys, "t", ACCESSORS), None);

        let declared = first_function("function A() { const { t } = useTranslation(); }");
        assert_eq!(function_binding(&declared, "t", ACCESSORS).as_deref(), Some("t"));
    }

    #[test]
    fn test_module_declares() {
        assert!(module_declares(&module("import { t } from \"i18next\";"), "t"));
        assert!(module_declares(&module("import { translate as t } from \"./i18n\";"), "t"));
        assert!(module_declares(&module("export const t = (k) => k;"), "t"));
        assert!(!module_declares(&module("import type { t } from \"./i18n\";"), "t"));
        assert!(!module_declares(&module("function A() { const t = 1; }"), "t"));
    }

    #[test]
    fn test_function_declares_binding() {
        let with_binding =
            first_function("function A() { const { t } = useTranslation(); return t('x'); }");
        assert!(function_declares(&with_binding, "t"));

        let with_param = first_function("function A({ t }) { return t('x'); }");
        assert!(function_declares(&with_param, "t"));

        let nested_only =
            first_function("function A() { const f = () => { const t = 1; }; return f; }");
        assert!(!function_declares(&nested_only, "t"));
    }

    #[test]
    fn test_body_calls_accessor() {
        let function = first_function(
            "async function load() { const { t } = await getServerTranslation(); return t; }",
        );
        let body = BlockStmtOrExpr::BlockStmt(function.body.unwrap());
        assert!(body_calls(&body, "getServerTranslation"));
        assert!(!body_calls(&body, "useTranslation"));
    }
}
