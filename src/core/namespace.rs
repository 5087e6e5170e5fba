//! Path-based namespace inference.
//!
//! Files under the routing base path get a namespace from their route
//! folder, after routing-only segments (route groups, dynamic segments,
//! private folders) are removed. Everything else falls back to the default
//! namespace.

use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Maps a source file to the translation namespace its binding should use.
pub trait NamespaceResolver: Debug + Send + Sync {
    fn resolve(&self, path: &Path) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingConvention {
    #[default]
    NextjsApp,
    NextjsPages,
    TanstackFile,
    TanstackFolder,
    ReactRouter,
    Remix,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceStrategy {
    #[default]
    FirstFolder,
    FullPath,
    LastFolder,
}

const SPECIAL_FILE_NAMES: &[&str] = &["index", "page", "layout", "template"];

#[derive(Debug, Clone)]
pub struct RoutingNamespaceResolver {
    base_path: PathBuf,
    default_namespace: String,
    convention: RoutingConvention,
    strategy: NamespaceStrategy,
}

impl RoutingNamespaceResolver {
    pub fn new(
        base_path: impl Into<PathBuf>,
        default_namespace: impl Into<String>,
        convention: RoutingConvention,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            default_namespace: default_namespace.into(),
            convention,
            strategy: NamespaceStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: NamespaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn infer(&self, path: &Path) -> String {
        let Ok(relative) = path.strip_prefix(&self.base_path) else {
            return self.default_namespace.clone();
        };
        let segments: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        if self.convention == RoutingConvention::TanstackFile
            && let Some(file_name) = segments.last()
        {
            let first = file_name.split('.').next().unwrap_or_default();
            if !first.is_empty() && first != "index" {
                return first.to_string();
            }
        }

        let mut parts: Vec<String> = segments
            .iter()
            .filter_map(|segment| self.clean_segment(segment))
            .collect();

        if let Some(last) = parts.last()
            && (last.contains('.') || is_special_name(last))
        {
            parts.pop();
        }

        match parts.first() {
            None => self.default_namespace.clone(),
            Some(first) if is_special_name(first) => self.default_namespace.clone(),
            Some(first) => match self.strategy {
                NamespaceStrategy::FirstFolder => first.clone(),
                NamespaceStrategy::FullPath => parts.join("-"),
                NamespaceStrategy::LastFolder => parts.last().unwrap_or(first).clone(),
            },
        }
    }

    /// Strip routing-only syntax from one path segment; `None` drops it.
    fn clean_segment(&self, segment: &str) -> Option<String> {
        let is_group = segment.starts_with('(') && segment.ends_with(')');
        let is_dynamic = segment.starts_with('[') && segment.ends_with(']');
        let is_private = segment.starts_with('_');

        let kept = match self.convention {
            RoutingConvention::NextjsApp => {
                if is_group || is_dynamic || is_private {
                    return None;
                }
                segment
            }
            RoutingConvention::NextjsPages => {
                if is_dynamic {
                    return None;
                }
                segment
            }
            RoutingConvention::TanstackFolder => {
                if is_private {
                    return None;
                }
                strip_param(segment)
            }
            RoutingConvention::Remix => strip_param(segment),
            RoutingConvention::TanstackFile
            | RoutingConvention::ReactRouter
            | RoutingConvention::Other => segment,
        };

        (!kept.is_empty()).then(|| kept.to_string())
    }
}

impl NamespaceResolver for RoutingNamespaceResolver {
    fn resolve(&self, path: &Path) -> Option<String> {
        Some(self.infer(path))
    }
}

/// `$id` route params run to the end of the segment.
fn strip_param(segment: &str) -> &str {
    match segment.find('$') {
        Some(idx) => &segment[..idx],
        None => segment,
    }
}

fn is_special_name(name: &str) -> bool {
    SPECIAL_FILE_NAMES.contains(&name.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use crate::core::namespace::*;

    fn resolver(convention: RoutingConvention) -> RoutingNamespaceResolver {
        RoutingNamespaceResolver::new("/project/src/app", "common", convention)
    }

    fn infer(convention: RoutingConvention, path: &str) -> String {
        resolver(convention).infer(Path::new(path))
    }

    #[test]
    fn test_first_folder() {
        assert_eq!(
            infer(RoutingConvention::NextjsApp, "/project/src/app/dashboard/settings/page.tsx"),
            "dashboard"
        );
    }

    #[test]
    fn test_app_router_strips_groups_and_dynamic_segments() {
        assert_eq!(
            infer(RoutingConvention::NextjsApp, "/project/src/app/(marketing)/[locale]/about/page.tsx"),
            "about"
        );
        assert_eq!(
            infer(RoutingConvention::NextjsApp, "/project/src/app/_components/shop/Cart.tsx"),
            "shop"
        );
    }

    #[test]
    fn test_root_files_use_default() {
        assert_eq!(infer(RoutingConvention::NextjsApp, "/project/src/app/page.tsx"), "common");
        assert_eq!(infer(RoutingConvention::NextjsApp, "/project/src/app/(group)/layout.tsx"), "common");
    }

    #[test]
    fn test_outside_base_path_uses_default() {
        assert_eq!(infer(RoutingConvention::NextjsApp, "/project/src/components/Button.tsx"), "common");
    }

    #[test]
    fn test_pages_router() {
        assert_eq!(
            infer(RoutingConvention::NextjsPages, "/project/src/app/blog/[slug].tsx"),
            "blog"
        );
    }

    #[test]
    fn test_tanstack_file_uses_first_dot_part() {
        assert_eq!(
            infer(RoutingConvention::TanstackFile, "/project/src/app/dashboard.about.tsx"),
            "dashboard"
        );
        assert_eq!(infer(RoutingConvention::TanstackFile, "/project/src/app/index.tsx"), "common");
    }

    #[test]
    fn test_tanstack_folder_and_remix_strip_params() {
        assert_eq!(
            infer(RoutingConvention::TanstackFolder, "/project/src/app/_layout/posts/$id/index.tsx"),
            "posts"
        );
        assert_eq!(
            infer(RoutingConvention::Remix, "/project/src/app/$lang/users/route.tsx"),
            "users"
        );
    }

    #[test]
    fn test_strategies() {
        let path = Path::new("/project/src/app/gallery/folder/page.tsx");
        let full = resolver(RoutingConvention::NextjsApp).with_strategy(NamespaceStrategy::FullPath);
        assert_eq!(full.infer(path), "gallery-folder");
        let last = resolver(RoutingConvention::NextjsApp).with_strategy(NamespaceStrategy::LastFolder);
        assert_eq!(last.infer(path), "folder");
    }
}
