use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{TEST_FILE_PATTERNS, WrapConfig};
use crate::error::WrapError;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", ".next", "dist", "build"];

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Expand `{a,b}` alternatives, which `glob::Pattern` does not support.
///
/// `src/**/*.{ts,tsx}` becomes `src/**/*.ts` and `src/**/*.tsx`. Groups
/// may nest; unbalanced braces are kept literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0;
    let mut close = None;
    let mut splits = Vec::new();
    for (idx, ch) in pattern[open..].char_indices() {
        let idx = open + idx;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(idx);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(idx),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(&splits);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let alternative = &pattern[w[0] + 1..w[1]];
            expand_braces(&format!("{prefix}{alternative}{suffix}"))
        })
        .collect()
}

/// Result of scanning files.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Sorted, de-duplicated absolute paths.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

/// Enumerates the source files a run will process.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    includes: Vec<Pattern>,
    literal_ignores: Vec<PathBuf>,
    ignores: Vec<Pattern>,
}

impl Scanner {
    pub fn new(config: &WrapConfig) -> Result<Self, WrapError> {
        let includes = expand_braces(&config.source_pattern)
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                WrapError::Configuration(format!(
                    "invalid glob pattern in 'sourcePattern': \"{}\": {}",
                    config.source_pattern, e
                ))
            })?;

        let mut literal_ignores = Vec::new();
        let mut ignores = Vec::new();
        for p in &config.ignores {
            if is_glob_pattern(p) {
                let pattern = Pattern::new(p).map_err(|e| {
                    WrapError::Configuration(format!(
                        "invalid glob pattern in 'ignores': \"{p}\": {e}"
                    ))
                })?;
                ignores.push(pattern);
            } else {
                literal_ignores.push(config.root.join(p));
            }
        }

        if config.ignore_test_files {
            ignores.extend(TEST_FILE_PATTERNS.iter().filter_map(|p| Pattern::new(p).ok()));
        }

        Ok(Self {
            root: config.root.clone(),
            includes,
            literal_ignores,
            ignores,
        })
    }

    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let walker = WalkDir::new(&self.root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    result.skipped_count += 1;
                    warn!("cannot access path: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !is_scannable_file(path) {
                continue;
            }
            if self.accepts(path) {
                result.files.push(path.to_path_buf());
            }
        }

        result.files.sort();
        result.files.dedup();
        debug!(
            files = result.files.len(),
            skipped = result.skipped_count,
            "scan finished"
        );
        result
    }

    fn accepts(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");

        if !self.includes.iter().any(|p| p.matches(&relative)) {
            return false;
        }
        if self
            .literal_ignores
            .iter()
            .any(|ignore_path| path.starts_with(ignore_path))
        {
            return false;
        }
        !self.ignores.iter().any(|p| p.matches(&relative))
    }

    /// Read a scanned file as UTF-8, unless its size on disk exceeds
    /// `max_bytes`. Oversized files are never read into memory.
    pub fn load(path: &Path, max_bytes: u64) -> Result<LoadedFile, WrapError> {
        let size = fs::metadata(path).map_err(|e| WrapError::read(path, e))?.len();
        if size > max_bytes {
            return Ok(LoadedFile::Oversized(size));
        }
        fs::read_to_string(path)
            .map(LoadedFile::Text)
            .map_err(|e| WrapError::read(path, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedFile {
    Text(String),
    /// Size in bytes of a file that was left unread.
    Oversized(u64),
}

fn is_scannable_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "ts" | "jsx" | "js")
    )
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::config::Config;
    use crate::core::scanner::*;

    fn scan(root: &Path, config: Config) -> Vec<String> {
        let config = config.resolve(root).unwrap();
        let scanner = Scanner::new(&config).unwrap();
        scanner
            .scan()
            .files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(
            expand_braces("src/**/*.{js,jsx,ts,tsx}"),
            vec!["src/**/*.js", "src/**/*.jsx", "src/**/*.ts", "src/**/*.tsx"]
        );
        assert_eq!(
            expand_braces("{app,lib/{a,b}}/*.ts"),
            vec!["app/*.ts", "lib/a/*.ts", "lib/b/*.ts"]
        );
        assert_eq!(expand_braces("src/**/*.tsx"), vec!["src/**/*.tsx"]);
        assert_eq!(expand_braces("src/{oops"), vec!["src/{oops"]);
    }

    #[test]
    fn test_scan_default_pattern() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/app.tsx");
        touch(dir.path(), "src/components/Button.jsx");
        touch(dir.path(), "src/style.css");
        touch(dir.path(), "lib/outside.ts");

        let files = scan(dir.path(), Config::default());
        assert_eq!(files, vec!["src/app.tsx", "src/components/Button.jsx"]);
    }

    #[test]
    fn test_scan_skips_node_modules_and_test_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/app.tsx");
        touch(dir.path(), "src/app.test.tsx");
        touch(dir.path(), "src/__tests__/helper.ts");
        touch(dir.path(), "src/node_modules/lib/index.js");

        let files = scan(dir.path(), Config::default());
        assert_eq!(files, vec!["src/app.tsx"]);

        let with_tests = Config {
            ignore_test_files: false,
            ..Config::default()
        };
        let files = scan(dir.path(), with_tests);
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_scan_ignores_literal_and_glob_patterns() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/components/Button.tsx");
        touch(dir.path(), "src/components/Button.stories.tsx");
        touch(dir.path(), "src/generated/types.ts");

        let config = Config {
            ignores: vec!["src/generated".to_owned(), "**/*.stories.tsx".to_owned()],
            ..Config::default()
        };
        let files = scan(dir.path(), config);
        assert_eq!(files, vec!["src/components/Button.tsx"]);
    }

    #[test]
    fn test_scan_bracket_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/app/[locale]/page.tsx");

        let files = scan(dir.path(), Config::default());
        assert_eq!(files, vec!["src/app/[locale]/page.tsx"]);
    }

    #[test]
    fn test_load_reports_read_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.tsx");
        let err = Scanner::load(&missing, 1024).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Read);
    }

    #[test]
    fn test_load_leaves_oversized_file_unread() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.tsx");
        fs::write(&path, "export const A = () => <p>안녕하세요</p>;\n").unwrap();

        assert_eq!(Scanner::load(&path, 8).unwrap(), LoadedFile::Oversized(47));
        assert!(matches!(Scanner::load(&path, 1024).unwrap(), LoadedFile::Text(_)));
    }

    #[test]
    fn test_is_scannable_file() {
        assert!(is_scannable_file(Path::new("app.tsx")));
        assert!(is_scannable_file(Path::new("app.js")));
        assert!(!is_scannable_file(Path::new("style.css")));
        assert!(!is_scannable_file(Path::new("data.json")));
    }
}
