//! Single-pass SCSS rendering.
//!
//! The stylesheet and its variable tree come out of one `grass` render: an
//! extraction rule listing every global variable is appended to the source,
//! rendered along with it, and split off the output again.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::declarations::collect_variable_names;
use crate::error::BuildError;
use crate::variables::{parse_value, Scalar, VariableTree};

/// Selector of the appended extraction rule
const EXTRACT_SELECTOR: &str = ".__theme-compiler-variables__";

/// Custom property prefix, suffixed with the variable's index
const EXTRACT_PROPERTY: &str = "--theme-compiler-var-";

/// Marks the start of an extracted value so empty values survive rendering
const VALUE_MARKER: char = '=';

/// Output of one render
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Rendered CSS without the extraction rule
    pub css: String,
    /// Every global variable, keyed by name without `$`
    pub variables: VariableTree,
}

/// Render `source_path` once, returning its CSS and variable tree
pub fn compile(source_path: &Path, load_paths: &[PathBuf]) -> Result<Compiled, BuildError> {
    let names = collect_variable_names(source_path, load_paths)?;
    debug!(
        "{}: extracting {} variable(s)",
        source_path.display(),
        names.len()
    );

    let source = fs::read_to_string(source_path).map_err(|e| BuildError::ReadFailed {
        path: source_path.to_path_buf(),
        source: e,
    })?;
    let input = with_extraction_rule(&source, &names);

    let mut options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .quiet(true);
    if let Some(dir) = source_path.parent() {
        options = options.load_path(dir);
    }
    for path in load_paths {
        options = options.load_path(path);
    }

    let output = grass::from_string(input, &options).map_err(|e| BuildError::Render {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;

    split_output(&output, &names).map_err(|message| BuildError::Render {
        path: source_path.to_path_buf(),
        message,
    })
}

/// Append a rule emitting `inspect($name)` for every variable
fn with_extraction_rule(source: &str, names: &[String]) -> String {
    let mut input = String::with_capacity(source.len() + names.len() * 96);
    input.push_str(source);
    if names.is_empty() {
        return input;
    }

    let _ = write!(input, "\n{EXTRACT_SELECTOR} {{\n");
    for (index, name) in names.iter().enumerate() {
        let _ = writeln!(
            input,
            "  @if global-variable-exists(\"{name}\") {{ {EXTRACT_PROPERTY}{index}: {VALUE_MARKER}#{{inspect(${name})}}; }}"
        );
    }
    input.push_str("}\n");
    input
}

/// Separate the stylesheet from the extraction rule and parse the values
fn split_output(output: &str, names: &[String]) -> Result<Compiled, String> {
    let mut css_lines = Vec::new();
    let mut variables = IndexMap::new();
    let mut in_rule = false;

    for line in output.lines() {
        if !in_rule {
            if line.trim_end() == format!("{EXTRACT_SELECTOR} {{") {
                in_rule = true;
            } else {
                css_lines.push(line);
            }
            continue;
        }

        if line.trim_end() == "}" {
            in_rule = false;
            continue;
        }

        let declaration = line.trim();
        let Some(rest) = declaration.strip_prefix(EXTRACT_PROPERTY) else {
            return Err(format!("unexpected line in variable extraction: {declaration}"));
        };
        let Some((index, value)) = rest.split_once(':') else {
            return Err(format!("malformed variable declaration: {declaration}"));
        };
        let name = index
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| names.get(i))
            .ok_or_else(|| format!("unknown variable index in: {declaration}"))?;
        let value = value.trim().trim_end_matches(';').trim_end();
        let value = value.strip_prefix(VALUE_MARKER).unwrap_or(value);
        let tree = parse_value(value).unwrap_or_else(|e| {
            warn!("${name}: {e} in '{value}', exported as text");
            VariableTree::Scalar(Scalar::String(value.trim().to_string()))
        });
        variables.insert(name.clone(), tree);
    }

    let css = css_lines.join("\n");
    let css = css.trim_end();
    Ok(Compiled {
        css: if css.is_empty() {
            String::new()
        } else {
            format!("{css}\n")
        },
        variables: VariableTree::Map(variables),
    })
}
