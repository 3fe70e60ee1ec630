//! Global variable declarations of an SCSS entry file and its imports.
//!
//! Only top-level `$name: value` statements are collected; declarations
//! nested in rules, mixins, functions or control directives are local.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Collect global variable names in declaration order.
///
/// `@import`ed SCSS partials are followed recursively. Imports that cannot
/// be resolved are skipped here; the renderer reports them.
pub fn collect_variable_names(
    entry: &Path,
    load_paths: &[PathBuf],
) -> Result<Vec<String>, BuildError> {
    let mut collector = Collector {
        load_paths,
        visited: HashSet::new(),
        seen: HashSet::new(),
        names: Vec::new(),
    };
    collector.visit(entry, true)?;
    Ok(collector.names)
}

struct Collector<'a> {
    load_paths: &'a [PathBuf],
    visited: HashSet<PathBuf>,
    /// Normalized names (`-` and `_` are equivalent in Sass)
    seen: HashSet<String>,
    names: Vec<String>,
}

impl Collector<'_> {
    fn visit(&mut self, path: &Path, is_entry: bool) -> Result<(), BuildError> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.visited.insert(key) {
            return Ok(());
        }

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(source) if is_entry => {
                return Err(BuildError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(_) => return Ok(()),
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for statement in scan_top_level(&source) {
            match statement {
                Statement::Variable(name) => {
                    if self.seen.insert(name.replace('_', "-")) {
                        self.names.push(name);
                    }
                }
                Statement::Import(target) => {
                    if let Some(resolved) = resolve_import(&target, base_dir, self.load_paths) {
                        self.visit(&resolved, false)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    Variable(String),
    Import(String),
}

/// Top-level variable declarations and import targets, in source order
fn scan_top_level(source: &str) -> Vec<Statement> {
    let bytes = source.as_bytes();
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut parens = 0usize;
    // Paren depth of an open unquoted `url(`
    let mut url_depth: Option<usize> = None;
    let mut at_statement_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            // `//` inside an unquoted url is part of the url
            b'/' if url_depth.is_none() && bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                at_statement_start = false;
                continue;
            }
            b'#' if bytes.get(i + 1) == Some(&b'{') => {
                i = skip_interpolation(bytes, i + 1);
                at_statement_start = false;
                continue;
            }
            b'{' => {
                depth += 1;
                at_statement_start = true;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                at_statement_start = true;
            }
            b'(' => {
                parens += 1;
                if url_depth.is_none() && is_url_call(bytes, i) {
                    url_depth = Some(parens);
                }
                at_statement_start = false;
            }
            b')' => {
                if url_depth == Some(parens) {
                    url_depth = None;
                }
                parens = parens.saturating_sub(1);
            }
            b';' => at_statement_start = true,
            b if b.is_ascii_whitespace() => {}
            b'$' if depth == 0 && at_statement_start => {
                let name_end = scan_identifier(bytes, i + 1);
                let mut j = name_end;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if name_end > i + 1 && bytes.get(j) == Some(&b':') {
                    statements.push(Statement::Variable(source[i + 1..name_end].to_string()));
                }
                at_statement_start = false;
                i = name_end;
                continue;
            }
            b'@' if depth == 0 && at_statement_start && source[i..].starts_with("@import") => {
                let end = statement_end(bytes, i);
                statements.extend(
                    import_targets(&source[i + "@import".len()..end])
                        .into_iter()
                        .map(Statement::Import),
                );
                i = end;
                continue;
            }
            _ => at_statement_start = false,
        }
        i += 1;
    }

    statements
}

/// Whether the `(` at `open` starts a `url(` call
fn is_url_call(bytes: &[u8], open: usize) -> bool {
    if open < 3 || !bytes[open - 3..open].eq_ignore_ascii_case(b"url") {
        return false;
    }
    match open.checked_sub(4).map(|i| bytes[i]) {
        Some(b) => !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_')),
        None => true,
    }
}

fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len()
        && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'-' | b'_') || bytes[end] >= 0x80)
    {
        end += 1;
    }
    end
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// `start` points at the `{` of `#{`
fn skip_interpolation(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Index of the terminating `;` (or end of input), honoring quotes and parens
fn statement_end(bytes: &[u8], start: usize) -> usize {
    let mut parens = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b';' | b'{' | b'}' if parens == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Quoted SCSS targets of an `@import` argument list.
///
/// Plain CSS imports (`url(...)`, `.css`, remote URLs, media queries) are
/// not Sass sources and are dropped.
fn import_targets(args: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let bytes = args.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'"' | b'\'') {
            let end = skip_string(bytes, i);
            let inner_end = if end > i + 1 && bytes[end - 1] == bytes[i] {
                end - 1
            } else {
                end
            };
            let inner = &args[i + 1..inner_end];
            let after = args[end..].trim_start();
            let is_plain_css = inner.ends_with(".css")
                || inner.starts_with("http://")
                || inner.starts_with("https://")
                || inner.starts_with("//")
                || !(after.is_empty() || after.starts_with(','));
            if !is_plain_css {
                targets.push(inner.to_string());
            }
            i = end;
            continue;
        }
        i += 1;
    }
    targets
}

/// Resolve an import target the way Sass does for `.scss` partials
fn resolve_import(target: &str, base_dir: &Path, load_paths: &[PathBuf]) -> Option<PathBuf> {
    std::iter::once(base_dir)
        .chain(load_paths.iter().map(PathBuf::as_path))
        .find_map(|dir| resolve_in(&dir.join(target)))
}

fn resolve_in(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?.to_str()?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let candidates = if file_name.ends_with(".scss") {
        vec![path.to_path_buf(), parent.join(format!("_{file_name}"))]
    } else {
        vec![
            parent.join(format!("{file_name}.scss")),
            parent.join(format!("_{file_name}.scss")),
            path.join("_index.scss"),
            path.join("index.scss"),
        ]
    };

    candidates.into_iter().find(|candidate| candidate.is_file())
}
