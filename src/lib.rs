//! # Theme Compiler
//!
//! Compiles SCSS theme sources into a stylesheet, a minified stylesheet, a
//! JSON tree of the theme's variables, a TypeScript declaration for that
//! JSON, and a documentation copy of the JSON.
//!
//! ## Features
//!
//! - Parallel compilation using Rayon, one isolated task per source file
//! - Stylesheet and variables from a single Sass render
//! - Vendor prefixing and minification with lightningcss
//! - Progress tracking with atomic counters
//!
//! ## Usage
//!
//! ```ignore
//! use theme_compiler::orchestrator::{compile_file, prepare_family};
//! use theme_compiler::theme::ThemeFamily;
//!
//! for descriptor in prepare_family(ThemeFamily::Named, &config)? {
//!     compile_file(&descriptor, &config.pipelines, &config.load_paths)?;
//! }
//! ```

/// Single-pass SCSS rendering
pub mod compiler;

/// CLI configuration and argument parsing
pub mod config;

/// Global variable declarations in SCSS sources
pub mod declarations;

/// Error types for compilation
pub mod error;

/// Parallel compilation and result collection
pub mod orchestrator;

/// CSS prefixing and minification pipelines
pub mod postprocess;

/// Source discovery
pub mod scanner;

/// Theme families, theme names, and input descriptors
pub mod theme;

/// TypeScript declarations for variable JSON
pub mod types;

/// Variable value trees and their JSON form
pub mod variables;

/// Artifact writing
pub mod writer;
