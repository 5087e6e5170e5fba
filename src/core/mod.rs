//! Wrapping engine.
//!
//! Per file, in order:
//! - `parsers` / `source`: parse once, keep the original text for span edits
//! - `detect`: find translatable text, honor `i18n-ignore` markers
//! - `classify`: decide which function owns each node and how it binds `t`
//! - `transform`: produce the replacement and binding edits
//! - `imports`: add imports, the `"use client"` directive and namespaces
//! - `writer`: persist atomically
//!
//! Across files, `scanner` enumerates inputs, `pool` runs `pipeline::process`
//! on a fixed set of workers and `stats` folds the results for `orchestrator`.

pub mod classify;
pub mod detect;
pub mod imports;
pub mod namespace;
pub mod orchestrator;
pub mod parsers;
pub mod pipeline;
pub mod pool;
pub mod scanner;
pub mod source;
pub mod stats;
pub mod transform;
pub mod writer;
