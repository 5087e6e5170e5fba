use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::detect::{
    DEFAULT_MAX_LITERAL_LENGTH, DEFAULT_TRANSLATABLE_PATTERN, ScriptPredicate, TextPredicate,
};
use crate::core::namespace::{
    NamespaceResolver, NamespaceStrategy, RoutingConvention, RoutingNamespaceResolver,
};
use crate::error::WrapError;

pub const CONFIG_FILE_NAME: &str = ".twraprc.json";

pub const TEST_FILE_PATTERNS: &[&str] = &[
    "**/*.test.tsx",
    "**/*.test.ts",
    "**/*.test.jsx",
    "**/*.test.js",
    "**/*.spec.tsx",
    "**/*.spec.ts",
    "**/*.spec.jsx",
    "**/*.spec.js",
    "**/__tests__/**",
];

/// Which binding components receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Client,
    Server,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Client => write!(f, "client"),
            Mode::Server => write!(f, "server"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Nextjs,
    React,
}

impl Framework {
    /// Whether client files need a leading `"use client"` directive.
    pub fn requires_client_directive(self) -> bool {
        matches!(self, Framework::Nextjs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacingConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default)]
    pub routing: RoutingConvention,
    #[serde(default)]
    pub strategy: NamespaceStrategy,
    /// Also pass the namespace as a type argument in TypeScript files:
    /// `useTranslation<"dashboard">("dashboard")`.
    #[serde(default)]
    pub typed_namespace: bool,
}

impl Default for NamespacingConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            default_namespace: default_namespace(),
            routing: RoutingConvention::default(),
            strategy: NamespaceStrategy::default(),
            typed_namespace: false,
        }
    }
}

fn default_base_path() -> String {
    "src/app".to_string()
}

fn default_namespace() -> String {
    "common".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_source_pattern")]
    pub source_pattern: String,
    #[serde(default)]
    pub ignores: Vec<String>,
    #[serde(default = "default_ignore_test_files")]
    pub ignore_test_files: bool,
    #[serde(default = "default_translation_import_source")]
    pub translation_import_source: String,
    #[serde(default = "default_translation_function")]
    pub translation_function: String,
    #[serde(default = "default_hook_name")]
    pub hook_name: String,
    #[serde(default = "default_server_translation_function")]
    pub server_translation_function: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default = "default_translatable_pattern")]
    pub translatable_pattern: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_literal_length")]
    pub max_literal_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespacing: Option<NamespacingConfig>,
}

fn default_source_pattern() -> String {
    "src/**/*.{js,jsx,ts,tsx}".to_string()
}

fn default_ignore_test_files() -> bool {
    true
}

fn default_translation_import_source() -> String {
    "i18nexus".to_string()
}

fn default_translation_function() -> String {
    "t".to_string()
}

fn default_hook_name() -> String {
    "useTranslation".to_string()
}

fn default_server_translation_function() -> String {
    "getServerTranslation".to_string()
}

fn default_translatable_pattern() -> String {
    DEFAULT_TRANSLATABLE_PATTERN.to_string()
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_max_literal_length() -> usize {
    DEFAULT_MAX_LITERAL_LENGTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_pattern: default_source_pattern(),
            ignores: Vec::new(),
            ignore_test_files: default_ignore_test_files(),
            translation_import_source: default_translation_import_source(),
            translation_function: default_translation_function(),
            hook_name: default_hook_name(),
            server_translation_function: default_server_translation_function(),
            mode: Mode::default(),
            framework: Framework::default(),
            dry_run: false,
            workers: None,
            translatable_pattern: default_translatable_pattern(),
            max_file_bytes: default_max_file_bytes(),
            max_literal_length: default_max_literal_length(),
            namespacing: None,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error for invalid glob patterns, an invalid translatable
    /// pattern, empty identifiers or a zero worker count.
    pub fn validate(&self) -> Result<(), WrapError> {
        if self.source_pattern.trim().is_empty() {
            return Err(WrapError::Configuration(
                "'sourcePattern' must not be empty".to_string(),
            ));
        }
        for pattern in crate::core::scanner::expand_braces(&self.source_pattern) {
            Pattern::new(&pattern).map_err(|e| {
                WrapError::Configuration(format!(
                    "invalid glob pattern in 'sourcePattern': \"{}\": {}",
                    self.source_pattern, e
                ))
            })?;
        }

        for pattern in &self.ignores {
            Pattern::new(pattern).map_err(|e| {
                WrapError::Configuration(format!(
                    "invalid glob pattern in 'ignores': \"{}\": {}",
                    pattern, e
                ))
            })?;
        }

        for (field, value) in [
            ("translationFunction", &self.translation_function),
            ("hookName", &self.hook_name),
            ("serverTranslationFunction", &self.server_translation_function),
            ("translationImportSource", &self.translation_import_source),
        ] {
            if value.trim().is_empty() {
                return Err(WrapError::Configuration(format!(
                    "'{field}' must not be empty"
                )));
            }
        }

        ScriptPredicate::new(&self.translatable_pattern).map_err(|e| {
            WrapError::Configuration(format!(
                "invalid regex in 'translatablePattern': \"{}\": {}",
                self.translatable_pattern, e
            ))
        })?;

        if self.workers == Some(0) {
            return Err(WrapError::Configuration(
                "'workers' must be at least 1".to_string(),
            ));
        }
        if self.max_literal_length == 0 {
            return Err(WrapError::Configuration(
                "'maxLiteralLength' must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate and turn the file configuration into the value passed to
    /// every wrapping call.
    pub fn resolve(&self, root: &Path) -> Result<WrapConfig, WrapError> {
        self.validate()?;

        let predicate = ScriptPredicate::new(&self.translatable_pattern)
            .map_err(|e| WrapError::Configuration(e.to_string()))?;
        let namespaces = self.namespacing.as_ref().map(|ns| {
            Arc::new(
                RoutingNamespaceResolver::new(
                    root.join(&ns.base_path),
                    ns.default_namespace.clone(),
                    ns.routing,
                )
                .with_strategy(ns.strategy),
            ) as Arc<dyn NamespaceResolver>
        });

        Ok(WrapConfig {
            root: root.to_path_buf(),
            source_pattern: self.source_pattern.clone(),
            ignores: self.ignores.clone(),
            ignore_test_files: self.ignore_test_files,
            import_source: self.translation_import_source.clone(),
            translation_function: self.translation_function.clone(),
            hook_name: self.hook_name.clone(),
            server_translation_function: self.server_translation_function.clone(),
            mode: self.mode,
            framework: self.framework,
            dry_run: self.dry_run,
            workers: self.workers.unwrap_or_else(num_cpus::get).max(1),
            max_file_bytes: self.max_file_bytes,
            max_literal_length: self.max_literal_length,
            predicate: Arc::new(predicate),
            typed_namespace: self.namespacing.as_ref().is_some_and(|ns| ns.typed_namespace),
            namespaces,
        })
    }
}

/// Resolved configuration shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct WrapConfig {
    pub root: PathBuf,
    pub source_pattern: String,
    pub ignores: Vec<String>,
    pub ignore_test_files: bool,
    pub import_source: String,
    pub translation_function: String,
    pub hook_name: String,
    pub server_translation_function: String,
    pub mode: Mode,
    pub framework: Framework,
    pub dry_run: bool,
    pub workers: usize,
    pub max_file_bytes: u64,
    pub max_literal_length: usize,
    pub predicate: Arc<dyn TextPredicate>,
    pub namespaces: Option<Arc<dyn NamespaceResolver>>,
    pub typed_namespace: bool,
}

impl WrapConfig {
    /// Defaults rooted at `root`.
    pub fn new(root: &Path) -> Result<Self, WrapError> {
        Config::default().resolve(root)
    }

    pub fn with_predicate(mut self, predicate: Arc<dyn TextPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_namespaces(mut self, resolver: Arc<dyn NamespaceResolver>) -> Self {
        self.namespaces = Some(resolver);
        self
    }

    pub fn namespace_for(&self, path: &Path) -> Option<String> {
        self.namespaces.as_ref().and_then(|ns| ns.resolve(path))
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
