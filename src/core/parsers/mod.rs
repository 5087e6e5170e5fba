//! Source file parsing.
//!
//! - `jsx`: JS/TS/JSX/TSX parser (uses swc for AST generation)

pub mod jsx;
