//! Reading and writing of Source Engine material (`.vmt`) files.
//!
//! A VMT file is a single named block of key-value pairs. Values are kept as
//! [`RawValue`]s and only interpreted by the parameter model.

use std::fmt;

use thiserror::Error;
use tracing::debug;
use uncased::{Uncased, UncasedStr};

mod parser;
mod writer;

pub use parser::parse;
pub use writer::write;

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    String(String),
    Number(f32),
    Vector([f32; 3]),
    Block(RawMaterialBlock),
}

impl RawValue {
    /// Classifies the text of a scalar value.
    ///
    /// `[a b c]` is a vector, `{r g b}` is a 0-255 color normalized to 0-1,
    /// plain decimal text is a number, anything else stays a string.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();

        if let Some(number) = parse_number(trimmed) {
            Self::Number(number)
        } else if let Some(vector) = parse_triple(trimmed) {
            Self::Vector(vector)
        } else {
            Self::String(text.to_owned())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Vector(_) => "vector",
            Self::Block(_) => "block",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Vector([x, y, z]) => write!(f, "[{x} {y} {z}]"),
            Self::Block(block) => write!(f, "{{{} entries}}", block.len()),
        }
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f32> {
    let numeric = text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));

    if numeric {
        text.parse().ok().filter(|n: &f32| n.is_finite())
    } else {
        None
    }
}

pub(crate) fn parse_triple(text: &str) -> Option<[f32; 3]> {
    let (inner, scale) = if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        (inner, 1.0)
    } else if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        (inner, 255.0)
    } else {
        return None;
    };

    let mut components = inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(parse_number);

    let x = components.next()??;
    let y = components.next()??;
    let z = components.next()??;

    if components.next().is_some() {
        return None;
    }

    Some([x / scale, y / scale, z / scale])
}

/// Named, ordered key-value block. Keys compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMaterialBlock {
    name: String,
    entries: Vec<(Uncased<'static>, RawValue)>,
}

impl RawMaterialBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Shader name for a top-level block, key for a nested one.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a value. A duplicate key, with or without the `$` prefix,
    /// replaces the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();

        if let Some(index) = self.position(&key) {
            debug!("duplicate key `{}`, keeping the later value", key);
            self.entries[index].1 = value;
        } else {
            self.entries.push((Uncased::from(key), value));
        }
    }

    /// Looks up a key, accepting it both with and without the `$` prefix.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        let index = self.position(key)?;
        Some(&self.entries[index].1)
    }

    pub fn block(&self, key: &str) -> Option<&RawMaterialBlock> {
        match self.get(key) {
            Some(RawValue::Block(block)) => Some(block),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = unprefixed(key);
        self.entries
            .iter()
            .position(|(k, _)| unprefixed(k.as_str()) == key)
    }
}

fn unprefixed(key: &str) -> &UncasedStr {
    UncasedStr::new(key.strip_prefix('$').unwrap_or(key))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated bracketed value")]
    UnterminatedBracket,
    #[error("missing shader name")]
    MissingShaderName,
    #[error("expected `{{` after shader name")]
    ExpectedBlock,
    #[error("key has no value")]
    MissingValue,
    #[error("value is empty")]
    EmptyValue,
    #[error("block has no key")]
    UnnamedBlock,
    #[error("unbalanced `}}`")]
    UnbalancedClose,
    #[error("unexpected content after the material block")]
    TrailingContent,
    #[error("{0}")]
    Syntax(String),
}

/// Fatal syntax error with the 1-based position of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}{}", token_suffix(.token))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub token: String,
}

fn token_suffix(token: &str) -> String {
    if token.is_empty() {
        String::new()
    } else {
        format!(" (near `{token}`)")
    }
}

impl ParseError {
    /// Renders the offending source line with a caret under the error column.
    pub fn highlight(&self, source: &str) -> Option<String> {
        let line_text = source.lines().nth(self.line.checked_sub(1)?)?;
        let pointer: String = line_text
            .chars()
            .take(self.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();

        Some(format!("{line_text}\n{pointer}^"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_values() {
        assert_eq!(RawValue::from_text("1"), RawValue::Number(1.0));
        assert_eq!(RawValue::from_text(" .5 "), RawValue::Number(0.5));
        assert_eq!(
            RawValue::from_text("[0 .5 1]"),
            RawValue::Vector([0.0, 0.5, 1.0])
        );
        assert_eq!(
            RawValue::from_text("{255 0 51}"),
            RawValue::Vector([1.0, 0.0, 0.2])
        );
        assert_eq!(
            RawValue::from_text("[abc]"),
            RawValue::String("[abc]".to_owned())
        );
        assert_eq!(
            RawValue::from_text("[1 1]"),
            RawValue::String("[1 1]".to_owned())
        );
        assert_eq!(
            RawValue::from_text("1e39"),
            RawValue::String("1e39".to_owned())
        );
        assert_eq!(
            RawValue::from_text("models/metal"),
            RawValue::String("models/metal".to_owned())
        );
    }

    #[test]
    fn lookup_is_case_and_prefix_insensitive() {
        let mut block = RawMaterialBlock::new("VertexLitGeneric");
        block.insert("$BaseTexture", RawValue::from_text("a"));
        block.insert("phong", RawValue::from_text("1"));

        assert_eq!(block.get("$basetexture"), Some(&RawValue::String("a".into())));
        assert_eq!(block.get("basetexture"), Some(&RawValue::String("a".into())));
        assert_eq!(block.get("$PHONG"), Some(&RawValue::Number(1.0)));
        assert_eq!(block.get("$bumpmap"), None);
    }

    #[test]
    fn duplicate_keys_keep_later_value_in_place() {
        let mut block = RawMaterialBlock::new("VertexLitGeneric");
        block.insert("$a", RawValue::from_text("1"));
        block.insert("$b", RawValue::from_text("2"));
        block.insert("$A", RawValue::from_text("3"));

        let entries: Vec<_> = block.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, &RawValue::Number(3.0));
    }

    #[test]
    fn prefix_does_not_split_duplicates() {
        let mut block = RawMaterialBlock::new("VertexLitGeneric");
        block.insert("$phong", RawValue::from_text("0"));
        block.insert("PHONG", RawValue::from_text("1"));

        assert_eq!(block.len(), 1);
        assert_eq!(block.iter().next(), Some(("$phong", &RawValue::Number(1.0))));
    }

    #[test]
    fn overflowing_numbers_are_not_numbers() {
        assert_eq!(parse_number("1e39"), None);
        assert_eq!(parse_number("-1e39"), None);
        assert_eq!(parse_number("1e30"), Some(1e30));
        assert_eq!(parse_triple("[1e39 0 0]"), None);
    }

    #[test]
    fn highlight_points_at_column() {
        let error = ParseError {
            kind: ParseErrorKind::MissingValue,
            line: 2,
            column: 3,
            token: "}".to_owned(),
        };

        assert_eq!(
            error.highlight("\"x\"\n{ }").as_deref(),
            Some("{ }\n  ^")
        );
    }
}
