use std::fmt::Debug;
use std::sync::LazyLock;

use regex::Regex;
use swc_ecma_ast::{Expr, MemberProp, OptChainBase, Tpl};

use crate::utils::{collapse_jsx_text, contains_alphabetic, decode_jsx_entities};

/// Default "needs translation" script.
pub const DEFAULT_TRANSLATABLE_PATTERN: &str = r"\p{Hangul}";

/// Default cap on the length of a single translatable text, in characters.
pub const DEFAULT_MAX_LITERAL_LENGTH: usize = 500;

static HANGUL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TRANSLATABLE_PATTERN).unwrap());

/// Decides whether a piece of text is written in a script that needs
/// translating.
pub trait TextPredicate: Debug + Send + Sync {
    fn needs_translation(&self, text: &str) -> bool;
}

/// Regex-backed [`TextPredicate`].
#[derive(Debug, Clone)]
pub struct ScriptPredicate {
    regex: Regex,
}

impl ScriptPredicate {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn hangul() -> Self {
        Self {
            regex: HANGUL_REGEX.clone(),
        }
    }
}

impl TextPredicate for ScriptPredicate {
    fn needs_translation(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    StringLiteral,
    JsxAttribute,
    JsxText,
    TemplateLiteral,
}

/// One interpolated value of a template key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// Source text of the interpolated expression.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalKey {
    Text(String),
    Pattern {
        pattern: String,
        variables: Vec<Placeholder>,
    },
}

impl CanonicalKey {
    /// The string used as the translation key.
    pub fn text(&self) -> &str {
        match self {
            CanonicalKey::Text(text) => text,
            CanonicalKey::Pattern { pattern, .. } => pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatableNode {
    pub kind: NodeKind,
    /// Byte range in the original text that gets replaced.
    pub start: usize,
    pub end: usize,
    pub raw: String,
    pub key: CanonicalKey,
}

#[derive(Debug, Clone, Copy)]
pub struct Detector<'a> {
    predicate: &'a dyn TextPredicate,
    max_len: usize,
}

impl<'a> Detector<'a> {
    pub fn new(predicate: &'a dyn TextPredicate, max_len: usize) -> Self {
        Self { predicate, max_len }
    }

    /// Key for a plain string literal or an expression-free template.
    pub fn literal_key(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        self.accepts(trimmed).then(|| trimmed.to_string())
    }

    /// Key for JSX text, normalized the way JSX renders it: each line is
    /// trimmed, empty lines dropped, the rest joined by a single space, and
    /// entities decoded. Text with an entity that cannot be decoded is
    /// skipped.
    pub fn jsx_text_key(&self, raw: &str) -> Option<String> {
        let normalized = decode_jsx_entities(&collapse_jsx_text(raw))?;
        self.accepts(&normalized).then_some(normalized)
    }

    /// Key for a template literal with interpolations.
    ///
    /// `sources` holds the source text of each expression in `tpl.exprs`.
    pub fn template_key(&self, tpl: &Tpl, sources: &[String]) -> Option<CanonicalKey> {
        let mut cooked = Vec::with_capacity(tpl.quasis.len());
        for quasi in &tpl.quasis {
            cooked.push(quasi.cooked.as_ref()?.as_str()?.to_string());
        }

        if tpl.exprs.is_empty() {
            return self.literal_key(&cooked.concat()).map(CanonicalKey::Text);
        }

        if !self.accepts(cooked.concat().trim()) {
            return None;
        }

        let mut names = PlaceholderNames::default();
        let mut pattern = String::new();
        for (idx, text) in cooked.iter().enumerate() {
            pattern.push_str(text);
            if let (Some(expr), Some(source)) = (tpl.exprs.get(idx), sources.get(idx)) {
                let name = names.assign(expr, source);
                pattern.push_str("{{");
                pattern.push_str(&name);
                pattern.push_str("}}");
            }
        }

        let pattern = pattern.trim().to_string();
        if pattern.chars().count() > self.max_len {
            return None;
        }
        Some(CanonicalKey::Pattern {
            pattern,
            variables: names.into_variables(),
        })
    }

    fn accepts(&self, text: &str) -> bool {
        !text.is_empty()
            && text.chars().count() <= self.max_len
            && self.predicate.needs_translation(text)
            && contains_alphabetic(text)
    }
}

#[derive(Default)]
struct PlaceholderNames {
    variables: Vec<Placeholder>,
    anonymous: usize,
}

impl PlaceholderNames {
    fn assign(&mut self, expr: &Expr, source: &str) -> String {
        // A bare comma expression would split into two object properties.
        let source = match expr {
            Expr::Seq(_) => format!("({})", source.trim()),
            _ => source.trim().to_string(),
        };
        if let Some(existing) = self.variables.iter().find(|v| v.source == source) {
            return existing.name.clone();
        }

        let base = match placeholder_name(expr) {
            Some(name) => name,
            None => {
                let name = format!("expr{}", self.anonymous);
                self.anonymous += 1;
                name
            }
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while self.variables.iter().any(|v| v.name == name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }

        self.variables.push(Placeholder {
            name: name.clone(),
            source,
        });
        name
    }

    fn into_variables(self) -> Vec<Placeholder> {
        self.variables
    }
}

/// Readable placeholder name for identifiers and member chains.
///
/// `user.profile.name` and `user?.profile.name` become `user_profile_name`.
pub fn placeholder_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::This(_) => Some("this".to_string()),
        Expr::Paren(paren) => placeholder_name(&paren.expr),
        Expr::Member(member) => {
            let object = placeholder_name(&member.obj)?;
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            Some(format!("{object}_{}", prop.sym))
        }
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => {
                let object = placeholder_name(&member.obj)?;
                let MemberProp::Ident(prop) = &member.prop else {
                    return None;
                };
                Some(format!("{object}_{}", prop.sym))
            }
            OptChainBase::Call(_) => None,
        },
        _ => None,
    }
}
