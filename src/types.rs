//! TypeScript declarations for variable JSON artifacts.
//!
//! Derivation runs in two passes: the tree is first reduced to a structural
//! [`TsType`], which is what list homogeneity is decided on, and then
//! rendered with one named interface per object.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

use crate::variables::{Scalar, VariableTree};

/// Type derivation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A scalar JSON cannot represent faithfully, e.g. NaN
    #[error("value at '{path}' has no JSON type")]
    UnrenderableScalar { path: String },
}

/// Structural type of a tree node
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    String,
    Number,
    Boolean,
    Null,
    /// Element type of an empty list
    Never,
    Array(Box<TsType>),
    Tuple(Vec<TsType>),
    Object(Vec<(String, TsType)>),
}

/// Reduce a tree to its structural type
pub fn derive_shape(tree: &VariableTree) -> Result<TsType, TypeError> {
    shape_at(tree, "")
}

fn shape_at(tree: &VariableTree, path: &str) -> Result<TsType, TypeError> {
    match tree {
        VariableTree::Scalar(scalar) => scalar_type(scalar, path),
        VariableTree::Map(entries) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), shape_at(value, &join_path(path, key))?)))
            .collect::<Result<Vec<_>, _>>()
            .map(TsType::Object),
        VariableTree::List(items) => {
            let types = items
                .iter()
                .enumerate()
                .map(|(i, item)| shape_at(item, &join_path(path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()?;

            match types.split_first() {
                None => Ok(TsType::Array(Box::new(TsType::Never))),
                Some((first, rest)) if rest.iter().all(|t| t == first) => {
                    Ok(TsType::Array(Box::new(first.clone())))
                }
                Some(_) => Ok(TsType::Tuple(types)),
            }
        }
    }
}

fn scalar_type(scalar: &Scalar, path: &str) -> Result<TsType, TypeError> {
    match scalar {
        Scalar::String(_) | Scalar::Color(_) => Ok(TsType::String),
        Scalar::Number { unit: Some(_), .. } => Ok(TsType::String),
        Scalar::Number { value, unit: None } if value.is_finite() => Ok(TsType::Number),
        Scalar::Number { .. } => Err(TypeError::UnrenderableScalar {
            path: path.to_string(),
        }),
        Scalar::Boolean(_) => Ok(TsType::Boolean),
        Scalar::Null => Ok(TsType::Null),
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Derive the declaration for the JSON module at `json_module_path`
pub fn derive_types(tree: &VariableTree, json_module_path: &str) -> Result<String, TypeError> {
    let shape = derive_shape(tree)?;

    let root_name = root_interface_name(json_module_path);
    let mut renderer = Renderer::default();
    let root = renderer.render_type(&shape, &root_name);

    let mut out = String::new();
    let _ = writeln!(out, "declare module '{}' {{", escape_single_quoted(json_module_path));
    for interface in &renderer.interfaces {
        out.push_str(interface);
        out.push('\n');
    }
    let _ = writeln!(out, "  const value: {root};");
    out.push_str("  export default value;\n");
    out.push_str("}\n");
    Ok(out)
}

/// Interfaces are named after the JSON file (`eui_theme_light.json` becomes
/// `EuiThemeLight`)
fn root_interface_name(json_module_path: &str) -> String {
    let file = Path::new(json_module_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let name = pascal_case(file);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Json{name}")
    } else {
        name
    }
}

#[derive(Default)]
struct Renderer {
    /// Rendered interface blocks, children before parents
    interfaces: Vec<String>,
    used_names: HashSet<String>,
}

impl Renderer {
    fn render_type(&mut self, ty: &TsType, name_hint: &str) -> String {
        match ty {
            TsType::String => "string".to_string(),
            TsType::Number => "number".to_string(),
            TsType::Boolean => "boolean".to_string(),
            TsType::Null => "null".to_string(),
            TsType::Never => "never".to_string(),
            TsType::Array(element) => {
                let inner = self.render_type(element, &format!("{name_hint}Item"));
                format!("{inner}[]")
            }
            TsType::Tuple(elements) => {
                let rendered: Vec<_> = elements
                    .iter()
                    .enumerate()
                    .map(|(i, t)| self.render_type(t, &format!("{name_hint}Item{i}")))
                    .collect();
                format!("[{}]", rendered.join(", "))
            }
            TsType::Object(fields) => self.render_interface(fields, name_hint),
        }
    }

    fn render_interface(&mut self, fields: &[(String, TsType)], name_hint: &str) -> String {
        let name = self.unique_name(name_hint);

        let members: Vec<String> = fields
            .iter()
            .map(|(key, ty)| {
                let rendered = self.render_type(ty, &format!("{name}{}", pascal_case(key)));
                format!("    {}: {};", property_name(key), rendered)
            })
            .collect();

        let mut block = format!("  interface {name} {{\n");
        for member in members {
            block.push_str(&member);
            block.push('\n');
        }
        block.push_str("  }\n");
        self.interfaces.push(block);
        name
    }

    fn unique_name(&mut self, hint: &str) -> String {
        let mut name = hint.to_string();
        let mut suffix = 2;
        while !self.used_names.insert(name.clone()) {
            name = format!("{hint}{suffix}");
            suffix += 1;
        }
        name
    }
}

fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn property_name(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        key.to_string()
    } else {
        format!("'{}'", escape_single_quoted(key))
    }
}

fn escape_single_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
