//! Translatable text detection.
//!
//! - `detector`: script predicate, canonical keys, placeholder naming
//! - `ignore`: `i18n-ignore` marker resolution

pub mod detector;
pub mod ignore;

pub use detector::{
    CanonicalKey, DEFAULT_MAX_LITERAL_LENGTH, DEFAULT_TRANSLATABLE_PATTERN, Detector, NodeKind,
    Placeholder, ScriptPredicate, TextPredicate, TranslatableNode,
};
pub use ignore::{IGNORE_MARKER, IgnoreIndex};
