use std::{fmt, iter::Peekable, str::Chars};

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use super::{ParseError, ParseErrorKind, RawMaterialBlock, RawValue};

// stand-ins so the reader never sees escapes of its own
const QUOTE: char = '\u{e000}';
const BACKSLASH: char = '\u{e001}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Quoted,
    Bare,
    Open,
    Close,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    text: String,
    line: usize,
    column: usize,
}

impl Token {
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            line: self.line,
            column: self.column,
            token: self.text.clone(),
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self.kind, TokenKind::Quoted | TokenKind::Bare)
    }
}

/// Position-tracking scanner for the checks the key-value reader doesn't do
/// with source positions: unbalanced braces, keys without values, empty
/// values and content after the material block.
struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;

        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(c)
    }

    fn at_comment(&self) -> bool {
        let mut lookahead = self.chars.clone();
        lookahead.next() == Some('/') && lookahead.next() == Some('/')
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if self.at_comment() {
                while self.chars.peek().map_or(false, |&c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn eof_error(&self) -> ParseError {
        ParseError {
            kind: ParseErrorKind::UnexpectedEof,
            line: self.line,
            column: self.column,
            token: String::new(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let token = |kind, text| Token {
            kind,
            text,
            line,
            column,
        };

        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        match c {
            '{' => {
                self.bump();
                Ok(Some(token(TokenKind::Open, "{".to_owned())))
            }
            '}' => {
                self.bump();
                Ok(Some(token(TokenKind::Close, "}".to_owned())))
            }
            '"' => {
                self.bump();
                let mut text = String::new();

                loop {
                    match self.bump() {
                        Some('"') => break,
                        Some('\\') if self.chars.peek() == Some(&'"') => {
                            self.bump();
                            text.push('"');
                        }
                        Some(c) => text.push(c),
                        None => {
                            return Err(token(TokenKind::Quoted, text)
                                .error(ParseErrorKind::UnterminatedString))
                        }
                    }
                }

                Ok(Some(token(TokenKind::Quoted, text)))
            }
            '[' => {
                let mut text = String::new();

                loop {
                    match self.bump() {
                        Some(']') => {
                            text.push(']');
                            break;
                        }
                        Some(c) => text.push(c),
                        None => {
                            return Err(token(TokenKind::Bare, text)
                                .error(ParseErrorKind::UnterminatedBracket))
                        }
                    }
                }

                Ok(Some(token(TokenKind::Bare, text)))
            }
            _ => {
                let mut text = String::new();

                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || matches!(c, '"' | '{' | '}' | ',') || self.at_comment()
                    {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }

                Ok(Some(token(TokenKind::Bare, text)))
            }
        }
    }
}

/// Checks the structure of `text` and rewrites it with every scalar quoted and
/// comments, commas and the byte order mark removed.
///
/// Returns the rewritten text and the shader name token.
fn normalize(text: &str) -> Result<(String, Token), ParseError> {
    let mut lexer = Lexer::new(text);
    let mut normalized = String::with_capacity(text.len());

    let name = match lexer.next_token()? {
        Some(token) if token.is_scalar() => token,
        Some(token) if token.kind == TokenKind::Close => {
            return Err(token.error(ParseErrorKind::UnbalancedClose))
        }
        Some(token) => return Err(token.error(ParseErrorKind::MissingShaderName)),
        None => return Err(lexer.eof_error()),
    };

    match lexer.next_token()? {
        Some(token) if token.kind == TokenKind::Open => {}
        Some(token) => return Err(token.error(ParseErrorKind::ExpectedBlock)),
        None => return Err(lexer.eof_error()),
    }

    push_scalar(&mut normalized, &name.text);
    normalized.push_str(" {\n");
    normalize_entries(&mut lexer, &mut normalized)?;

    match lexer.next_token()? {
        None => Ok((normalized, name)),
        Some(token) if token.kind == TokenKind::Close => {
            Err(token.error(ParseErrorKind::UnbalancedClose))
        }
        Some(token) => Err(token.error(ParseErrorKind::TrailingContent)),
    }
}

fn normalize_entries(lexer: &mut Lexer, normalized: &mut String) -> Result<(), ParseError> {
    loop {
        let key = match lexer.next_token()? {
            None => return Err(lexer.eof_error()),
            Some(token) => match token.kind {
                TokenKind::Close => {
                    normalized.push_str("}\n");
                    return Ok(());
                }
                TokenKind::Open => return Err(token.error(ParseErrorKind::UnnamedBlock)),
                TokenKind::Quoted | TokenKind::Bare => token,
            },
        };

        let value = match lexer.next_token()? {
            None => return Err(key.error(ParseErrorKind::MissingValue)),
            Some(token) => token,
        };

        match value.kind {
            TokenKind::Close => return Err(key.error(ParseErrorKind::MissingValue)),
            TokenKind::Open => {
                push_scalar(normalized, &key.text);
                normalized.push_str(" {\n");
                normalize_entries(lexer, normalized)?;
            }
            TokenKind::Quoted | TokenKind::Bare => {
                if value.text.trim().is_empty() {
                    return Err(value.error(ParseErrorKind::EmptyValue));
                }

                push_scalar(normalized, &key.text);
                normalized.push(' ');
                push_scalar(normalized, &value.text);
                normalized.push('\n');
            }
        }
    }
}

fn push_scalar(normalized: &mut String, text: &str) {
    normalized.push('"');
    normalized.extend(text.chars().map(|c| match c {
        '"' => QUOTE,
        '\\' => BACKSLASH,
        c => c,
    }));
    normalized.push('"');
}

fn restore(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            QUOTE => '"',
            BACKSLASH => '\\',
            c => c,
        })
        .collect()
}

/// The top-level `"Shader" { ... }` pair.
struct Document(RawMaterialBlock);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a named material block")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let (name, Node(value)) = map
            .next_entry::<String, Node>()?
            .ok_or_else(|| de::Error::custom("missing material block"))?;

        match value {
            RawValue::Block(block) => Ok(Document(RawMaterialBlock {
                name: restore(&name),
                ..block
            })),
            other => Err(de::Error::invalid_type(
                de::Unexpected::Other(other.kind()),
                &self,
            )),
        }
    }
}

/// Any value inside the material block.
struct Node(RawValue);

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl NodeVisitor {
    fn text(text: &str) -> Node {
        Node(RawValue::from_text(&restore(text)))
    }
}

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a material value or block")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Node(RawValue::Number(if v { 1.0 } else { 0.0 })))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Self::text(&v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Self::text(&v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Self::text(&v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Self::text(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Self::text(&v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Node(RawValue::Block(RawMaterialBlock::default())))
    }

    // repeated keys may arrive grouped; the last one wins
    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut last = None;

        while let Some(Node(value)) = seq.next_element()? {
            last = Some(value);
        }

        Ok(Node(
            last.unwrap_or_else(|| RawValue::Block(RawMaterialBlock::default())),
        ))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut block = RawMaterialBlock::default();

        while let Some((key, Node(value))) = map.next_entry::<String, Node>()? {
            let key = restore(&key);
            let value = match value {
                RawValue::Block(nested) => RawValue::Block(RawMaterialBlock {
                    name: key.clone(),
                    ..nested
                }),
                value => value,
            };

            block.insert(key, value);
        }

        Ok(Node(RawValue::Block(block)))
    }
}

/// Parses VMT text into its top-level block.
///
/// # Errors
///
/// Returns `Err` on the first syntax error, such as an unterminated string,
/// a key without a value or unbalanced braces.
pub fn parse(text: &str) -> Result<RawMaterialBlock, ParseError> {
    let (normalized, name) = normalize(text)?;

    let Document(block) = vdf_reader::from_str::<Document>(&normalized)
        .map_err(|e| name.error(ParseErrorKind::Syntax(e.to_string())))?;

    Ok(block)
}
