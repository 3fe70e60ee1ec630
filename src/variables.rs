//! Variable tree extracted from a rendered stylesheet.
//!
//! Values arrive as the text Sass `inspect()` produces for them (e.g.
//! `(primary: #000000, sizes: (s: 4px, m: 8px))`) and are parsed into a
//! [`VariableTree`]. The tree serializes to the JSON artifact with key order
//! preserved.

use indexmap::IndexMap;
use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    /// `unit` is `None` for unitless numbers
    Number { value: f64, unit: Option<String> },
    Boolean(bool),
    /// Color literal as written (`#000`, `rgba(0, 0, 0, 0.5)`, `white`)
    Color(String),
    Null,
}

/// Nested structure of every variable of one stylesheet
#[derive(Debug, Clone, PartialEq)]
pub enum VariableTree {
    Scalar(Scalar),
    List(Vec<VariableTree>),
    Map(IndexMap<String, VariableTree>),
}

impl VariableTree {
    pub fn empty_map() -> Self {
        VariableTree::Map(IndexMap::new())
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, VariableTree>> {
        match self {
            VariableTree::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) | Scalar::Color(s) => serializer.serialize_str(s),
            Scalar::Number {
                value,
                unit: Some(unit),
            } => serializer.serialize_str(&format!("{}{}", format_number(*value), unit)),
            Scalar::Number { value, unit: None } => {
                if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
            Scalar::Null => serializer.serialize_unit(),
        }
    }
}

impl Serialize for VariableTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VariableTree::Scalar(scalar) => scalar.serialize(serializer),
            VariableTree::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            VariableTree::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

/// Serialize a tree as pretty-printed JSON with two-space indentation
pub fn to_json(tree: &VariableTree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Error parsing an inspected Sass value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unexpected end of value")]
    UnexpectedEnd,
    #[error("unexpected '{found}' at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("duplicate map key '{0}'")]
    DuplicateKey(String),
}

/// Parse the `inspect()` text of a Sass value into a tree
pub fn parse_value(input: &str) -> Result<VariableTree, ValueError> {
    // Empty unquoted string, e.g. `unquote("")`
    if input.trim().is_empty() {
        return Ok(VariableTree::Scalar(Scalar::String(String::new())));
    }

    let mut parser = ValueParser {
        src: input,
        pos: 0,
        colon_ends_token: false,
    };
    parser.skip_ws();
    let value = parser.parse_comma_list(None)?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some(c) => Err(ValueError::Unexpected {
            found: c,
            offset: parser.pos,
        }),
    }
}

struct ValueParser<'a> {
    src: &'a str,
    pos: usize,
    /// Set while a map key may be read; elsewhere `:` is part of a token
    /// (`progid:DX...`, `a:hover`)
    colon_ends_token: bool,
}

impl<'a> ValueParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ValueError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(ValueError::Unexpected {
                found: c,
                offset: self.pos - c.len_utf8(),
            }),
            None => Err(ValueError::UnexpectedEnd),
        }
    }

    /// `a, b, c` up to `close` (or end of input). A single item without a
    /// trailing comma is returned unwrapped.
    fn parse_comma_list(&mut self, close: Option<char>) -> Result<VariableTree, ValueError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.peek().is_none() || self.peek() == close {
                break;
            }
            items.push(self.parse_space_list(close)?);
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
                trailing_comma = true;
            } else {
                trailing_comma = false;
                break;
            }
        }

        if items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(VariableTree::List(items))
    }

    /// Space-separated values are kept as their CSS text (`1px solid #000`).
    fn parse_space_list(&mut self, close: Option<char>) -> Result<VariableTree, ValueError> {
        let start = self.pos;
        let first = self.parse_atom()?;
        let mut count = 1;
        loop {
            let before = self.pos;
            self.skip_ws();
            match self.peek() {
                None | Some(',') => {
                    self.pos = before;
                    break;
                }
                Some(':') if self.colon_ends_token => {
                    self.pos = before;
                    break;
                }
                Some(c) if Some(c) == close => {
                    self.pos = before;
                    break;
                }
                _ => {
                    self.parse_atom()?;
                    count += 1;
                }
            }
        }

        if count == 1 {
            Ok(first)
        } else {
            let text = self.src[start..self.pos].trim().to_string();
            Ok(VariableTree::Scalar(Scalar::String(text)))
        }
    }

    fn parse_atom(&mut self) -> Result<VariableTree, ValueError> {
        match self.peek() {
            None => Err(ValueError::UnexpectedEnd),
            Some('(') => self.parse_parenthesized(),
            Some('[') => {
                self.pos += 1;
                let outer = std::mem::replace(&mut self.colon_ends_token, false);
                let inner = self.parse_comma_list(Some(']'))?;
                self.colon_ends_token = outer;
                self.skip_ws();
                self.expect(']')?;
                Ok(match inner {
                    VariableTree::List(items) => VariableTree::List(items),
                    single => VariableTree::List(vec![single]),
                })
            }
            Some(q @ ('"' | '\'')) => {
                let s = self.parse_quoted(q)?;
                Ok(VariableTree::Scalar(Scalar::String(s)))
            }
            Some(c) if c == ',' || c == ')' || c == ']' || (c == ':' && self.colon_ends_token) => {
                Err(ValueError::Unexpected {
                    found: c,
                    offset: self.pos,
                })
            }
            Some(_) => {
                let token = self.parse_token()?;
                Ok(VariableTree::Scalar(classify(token)))
            }
        }
    }

    /// `(k: v, ...)` map, `(a, b)` list, `()` empty list or `(x)` grouping
    fn parse_parenthesized(&mut self) -> Result<VariableTree, ValueError> {
        self.expect('(')?;
        self.skip_ws();
        if self.peek() == Some(')') {
            self.pos += 1;
            return Ok(VariableTree::List(Vec::new()));
        }

        let outer = self.colon_ends_token;
        let result = self.parse_parenthesized_body();
        self.colon_ends_token = outer;
        result
    }

    fn parse_parenthesized_body(&mut self) -> Result<VariableTree, ValueError> {
        let checkpoint = self.pos;
        self.colon_ends_token = true;
        let first = self.parse_space_list(Some(')'))?;
        self.skip_ws();
        if self.peek() == Some(':') {
            let key_text = self.src[checkpoint..self.pos].trim();
            return self.parse_map_rest(key_text, first);
        }

        self.pos = checkpoint;
        self.colon_ends_token = false;
        let inner = self.parse_comma_list(Some(')'))?;
        self.skip_ws();
        self.expect(')')?;
        Ok(inner)
    }

    fn parse_map_rest(
        &mut self,
        first_key_text: &str,
        first_key: VariableTree,
    ) -> Result<VariableTree, ValueError> {
        let mut map = IndexMap::new();
        let mut key = map_key(first_key_text, &first_key);
        loop {
            self.expect(':')?;
            self.colon_ends_token = false;
            let value = self.parse_entry_value()?;
            self.colon_ends_token = true;
            if map.insert(key.clone(), value).is_some() {
                return Err(ValueError::DuplicateKey(key));
            }

            self.skip_ws();
            match self.bump() {
                Some(')') => break,
                Some(',') => {
                    self.skip_ws();
                    if self.peek() == Some(')') {
                        self.pos += 1;
                        break;
                    }
                    let start = self.pos;
                    let next = self.parse_space_list(Some(')'))?;
                    key = map_key(self.src[start..self.pos].trim(), &next);
                    self.skip_ws();
                }
                Some(c) => {
                    return Err(ValueError::Unexpected {
                        found: c,
                        offset: self.pos - c.len_utf8(),
                    })
                }
                None => return Err(ValueError::UnexpectedEnd),
            }
        }
        Ok(VariableTree::Map(map))
    }

    /// A map value ends at the next top-level `,` or `)`; comma lists used
    /// as map values are always parenthesized by `inspect()`.
    fn parse_entry_value(&mut self) -> Result<VariableTree, ValueError> {
        self.skip_ws();
        self.parse_space_list(Some(')'))
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, ValueError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ValueError::UnterminatedString(start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let mut hex = String::new();
                    while hex.len() < 6 && matches!(self.peek(), Some(h) if h.is_ascii_hexdigit())
                    {
                        if let Some(h) = self.bump() {
                            hex.push(h);
                        }
                    }
                    if hex.is_empty() {
                        match self.bump() {
                            Some(c) => out.push(c),
                            None => return Err(ValueError::UnterminatedString(start)),
                        }
                    } else {
                        if self.peek() == Some(' ') {
                            self.pos += 1;
                        }
                        let ch = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or(char::REPLACEMENT_CHARACTER);
                        out.push(ch);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// An unquoted token; function calls such as `rgba(0, 0, 0, 0.5)` are
    /// kept whole.
    fn parse_token(&mut self) -> Result<&'a str, ValueError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ')' | ']') {
                break;
            }
            if c == ':' && self.colon_ends_token {
                break;
            }
            if c == '(' {
                self.skip_balanced()?;
                continue;
            }
            if c == '"' || c == '\'' {
                self.parse_quoted(c)?;
                continue;
            }
            self.pos += c.len_utf8();
        }
        Ok(&self.src[start..self.pos])
    }

    fn skip_balanced(&mut self) -> Result<(), ValueError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                '"' | '\'' => {
                    self.parse_quoted(c)?;
                    continue;
                }
                _ => {}
            }
            self.pos += c.len_utf8();
        }
        Err(ValueError::UnexpectedEnd)
    }
}

fn map_key(text: &str, key: &VariableTree) -> String {
    match key {
        VariableTree::Scalar(Scalar::String(s)) if text.starts_with(['"', '\'']) => s.clone(),
        _ => text.to_string(),
    }
}

fn classify(token: &str) -> Scalar {
    match token {
        "true" => return Scalar::Boolean(true),
        "false" => return Scalar::Boolean(false),
        "null" => return Scalar::Null,
        _ => {}
    }

    if let Some((value, unit)) = split_number(token) {
        return Scalar::Number {
            value,
            unit: (!unit.is_empty()).then(|| unit.to_string()),
        };
    }

    if is_color(token) {
        return Scalar::Color(token.to_string());
    }

    Scalar::String(token.to_string())
}

/// Split `12.5px` into `(12.5, "px")`
fn split_number(token: &str) -> Option<(f64, &str)> {
    let bytes = token.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &token[..end];
    if !number[digits_start..].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let unit = &token[end..];
    let unit_ok = unit == "%"
        || unit
            .bytes()
            .all(|b| b.is_ascii_alphabetic());
    if !unit_ok {
        return None;
    }
    number.parse::<f64>().ok().map(|v| (v, unit))
}

fn is_color(token: &str) -> bool {
    if let Some(hex) = token.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    let lower = token.to_ascii_lowercase();
    if ["rgb(", "rgba(", "hsl(", "hsla("]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return true;
    }
    token.bytes().all(|b| b.is_ascii_alphabetic()) && CssColor::parse_string(token).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> VariableTree {
        VariableTree::Scalar(Scalar::String(s.to_string()))
    }

    fn number(v: f64) -> VariableTree {
        VariableTree::Scalar(Scalar::Number {
            value: v,
            unit: None,
        })
    }

    // ==================== scalar parsing tests ====================

    #[test]
    fn test_parse_unitless_number() {
        assert_eq!(parse_value("8").unwrap(), number(8.0));
        assert_eq!(parse_value("-0.5").unwrap(), number(-0.5));
        assert_eq!(parse_value(".75").unwrap(), number(0.75));
    }

    #[test]
    fn test_parse_number_with_unit() {
        assert_eq!(
            parse_value("16px").unwrap(),
            VariableTree::Scalar(Scalar::Number {
                value: 16.0,
                unit: Some("px".to_string())
            })
        );
        assert!(matches!(
            parse_value("50%").unwrap(),
            VariableTree::Scalar(Scalar::Number { unit: Some(ref u), .. }) if u == "%"
        ));
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_value("true").unwrap(),
            VariableTree::Scalar(Scalar::Boolean(true))
        );
        assert_eq!(
            parse_value("false").unwrap(),
            VariableTree::Scalar(Scalar::Boolean(false))
        );
        assert_eq!(parse_value("null").unwrap(), VariableTree::Scalar(Scalar::Null));
    }

    #[test]
    fn test_parse_colors() {
        for input in ["#000", "#1a2B3c", "#00000080", "rgba(0, 0, 0, 0.5)", "hsl(0, 0%, 0%)", "white"] {
            assert_eq!(
                parse_value(input).unwrap(),
                VariableTree::Scalar(Scalar::Color(input.to_string())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parse_value("\"Inter UI\"").unwrap(), string("Inter UI"));
        assert_eq!(parse_value("'it\\'s'").unwrap(), string("it's"));
        assert_eq!(parse_value("\"\\201C\"").unwrap(), string("\u{201C}"));
        assert_eq!(parse_value("bold").unwrap(), string("bold"));
        assert_eq!(parse_value("#{notacolor}").unwrap(), string("#{notacolor}"));
    }

    #[test]
    fn test_parse_function_call_kept_whole() {
        assert_eq!(
            parse_value("calc(100% - 16px)").unwrap(),
            string("calc(100% - 16px)")
        );
    }

    #[test]
    fn test_parse_colon_inside_value() {
        assert_eq!(
            parse_value("progid:DXImageTransform.Microsoft.gradient(enabled=false)").unwrap(),
            string("progid:DXImageTransform.Microsoft.gradient(enabled=false)")
        );
        assert_eq!(parse_value("a:hover").unwrap(), string("a:hover"));
        assert_eq!(
            parse_value("a:hover, b:focus").unwrap(),
            VariableTree::List(vec![string("a:hover"), string("b:focus")])
        );
    }

    #[test]
    fn test_parse_colon_inside_map_value() {
        let tree = parse_value("(hover: a:hover, list: [x:y])").unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["hover"], string("a:hover"));
        assert_eq!(map["list"], VariableTree::List(vec![string("x:y")]));
    }

    #[test]
    fn test_parse_empty_unquoted_string() {
        assert_eq!(parse_value("").unwrap(), string(""));
        assert_eq!(parse_value("  ").unwrap(), string(""));
    }

    // ==================== list parsing tests ====================

    #[test]
    fn test_parse_space_list_as_text() {
        assert_eq!(parse_value("1px solid #D3DAE6").unwrap(), string("1px solid #D3DAE6"));
    }

    #[test]
    fn test_parse_comma_list() {
        assert_eq!(
            parse_value("\"Inter\", Helvetica, sans-serif").unwrap(),
            VariableTree::List(vec![string("Inter"), string("Helvetica"), string("sans-serif")])
        );
    }

    #[test]
    fn test_parse_empty_and_single_lists() {
        assert_eq!(parse_value("()").unwrap(), VariableTree::List(vec![]));
        assert_eq!(parse_value("(1,)").unwrap(), VariableTree::List(vec![number(1.0)]));
        assert_eq!(parse_value("[a]").unwrap(), VariableTree::List(vec![string("a")]));
    }

    #[test]
    fn test_parse_bracketed_list() {
        assert_eq!(
            parse_value("[1, 2]").unwrap(),
            VariableTree::List(vec![number(1.0), number(2.0)])
        );
    }

    #[test]
    fn test_parse_nested_lists() {
        assert_eq!(
            parse_value("(1, 2), (3, 4)").unwrap(),
            VariableTree::List(vec![
                VariableTree::List(vec![number(1.0), number(2.0)]),
                VariableTree::List(vec![number(3.0), number(4.0)]),
            ])
        );
    }

    // ==================== map parsing tests ====================

    #[test]
    fn test_parse_map_preserves_order() {
        let tree = parse_value("(xl: 1200px, l: 992px, m: 768px, s: 575px, xs: 0)").unwrap();
        let map = tree.as_map().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["xl", "l", "m", "s", "xs"]);
        assert_eq!(map["xs"], number(0.0));
    }

    #[test]
    fn test_parse_nested_map() {
        let tree = parse_value("(colors: (primary: #006BB4, ghost: #FFF), base: 16px)").unwrap();
        let map = tree.as_map().unwrap();
        let colors = map["colors"].as_map().unwrap();
        assert_eq!(
            colors["primary"],
            VariableTree::Scalar(Scalar::Color("#006BB4".to_string()))
        );
    }

    #[test]
    fn test_parse_map_with_quoted_keys_and_list_values() {
        let tree = parse_value("(\"font-family\": (\"Inter\", sans-serif), weight: 400,)").unwrap();
        let map = tree.as_map().unwrap();
        assert!(map.contains_key("font-family"));
        assert_eq!(
            map["font-family"],
            VariableTree::List(vec![string("Inter"), string("sans-serif")])
        );
    }

    #[test]
    fn test_parse_map_duplicate_key() {
        assert_eq!(
            parse_value("(a: 1, a: 2)"),
            Err(ValueError::DuplicateKey("a".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_value("(a: 1").is_err());
        assert!(parse_value("\"open").is_err());
        assert!(parse_value("a)").is_err());
    }

    // ==================== serialization tests ====================

    #[test]
    fn test_json_example_shape() {
        let tree = parse_value("(colors: (primary: #000000), spacing: (base: 8))").unwrap();
        let compact = serde_json::to_string(&tree).unwrap();
        assert_eq!(compact, r##"{"colors":{"primary":"#000000"},"spacing":{"base":8}}"##);
    }

    #[test]
    fn test_json_numbers_and_units() {
        let tree = parse_value("(a: 1.5, b: 16px, c: 0.5em, d: null, e: true)").unwrap();
        let compact = serde_json::to_string(&tree).unwrap();
        assert_eq!(compact, r#"{"a":1.5,"b":"16px","c":"0.5em","d":null,"e":true}"#);
    }

    #[test]
    fn test_to_json_pretty() {
        let tree = parse_value("(base: 8)").unwrap();
        assert_eq!(to_json(&tree).unwrap(), "{\n  \"base\": 8\n}");
    }

    #[test]
    fn test_to_json_empty_map() {
        assert_eq!(to_json(&VariableTree::empty_map()).unwrap(), "{}");
    }
}
