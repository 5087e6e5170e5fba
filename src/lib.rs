//! twrap - wraps hardcoded UI text in translation calls
//!
//! twrap is a CLI tool and library that rewrites React and Next.js sources
//! so that user-visible text goes through a translation function. It finds
//! translatable literals, JSX text and template literals, replaces them with
//! `t(...)` calls, injects the binding each component needs and keeps the
//! imports and `"use client"` directive in order. Files are processed in
//! parallel on a fixed worker pool.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and resolution
//! - `core`: Wrapping engine (detection, transformation, workers)
//! - `error`: Per-file and configuration error types
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

pub use config::{Config, WrapConfig};
pub use crate::core::orchestrator::{RunSummary, run};
pub use crate::core::pipeline::{FileRewrite, WrapOutcome, WrapResult, wrap_source};
pub use error::WrapError;
