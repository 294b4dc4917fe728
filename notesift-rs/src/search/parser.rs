//! Tokenizer and parser for query strings.
//!
//! Grammar:
//! ```text
//! query    = atom*
//! atom     = chip | value
//! chip     = FIELD ":" value
//!          | "line:" "(" value* ")"
//!          | ("prop:" | "property:") KEY ["=" value]
//! value    = WORD | "\"" QUOTED "\"" | "/" REGEX "/" FLAGS
//! ```
//!
//! Fields are `file` (or `name`), `path`, `tag`, `content`, `line`,
//! `heading` (or `headings`) and `prop` (or `property`). Atoms without a field
//! join the free-text query.

use crate::error::{Result, VaultError};
use crate::search::query::{PropertyValue, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Path,
    Tag,
    Content,
    Line,
    Heading,
    Property,
}

impl Field {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_lowercase().as_str() {
            "file" | "name" => Some(Self::File),
            "path" => Some(Self::Path),
            "tag" => Some(Self::Tag),
            "content" => Some(Self::Content),
            "line" => Some(Self::Line),
            "heading" | "headings" => Some(Self::Heading),
            "prop" | "property" => Some(Self::Property),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Path => "path",
            Self::Tag => "tag",
            Self::Content => "content",
            Self::Line => "line",
            Self::Heading => "heading",
            Self::Property => "prop",
        }
    }
}

/// A value as written: bare word, quoted string or regex literal.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Word(String),
    Quoted(String),
    /// Full literal including slashes and flags.
    Regex(String),
}

impl Value {
    fn into_text(self) -> String {
        match self {
            Self::Word(s) | Self::Quoted(s) | Self::Regex(s) => s,
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Consume `field:` if the input continues with a known field prefix.
    fn field_prefix(&mut self) -> Option<Field> {
        let start = self.pos;
        let mut end = start;
        while end < self.chars.len() && self.chars[end].is_ascii_alphabetic() {
            end += 1;
        }
        if end == start || self.chars.get(end) != Some(&':') {
            return None;
        }
        let prefix: String = self.chars[start..end].iter().collect();
        let field = Field::from_prefix(&prefix)?;
        self.pos = end + 1;
        Some(field)
    }

    /// Read one value. `stop` lists extra characters that end a bare word.
    fn value(&mut self, stop: &[char]) -> Result<Option<Value>> {
        match self.peek() {
            None => Ok(None),
            Some(c) if c.is_whitespace() => Ok(None),
            Some('"') => self.quoted().map(|s| Some(Value::Quoted(s))),
            Some('/') => Ok(Some(self.regex_or_word(stop))),
            Some(_) => {
                let word = self.word(stop);
                Ok((!word.is_empty()).then_some(Value::Word(word)))
            }
        }
    }

    fn quoted(&mut self) -> Result<String> {
        let open = self.pos;
        self.pos += 1;
        let mut s = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '"' => return Ok(s),
                '\\' if self.peek().is_some() => {
                    s.push(self.chars[self.pos]);
                    self.pos += 1;
                }
                other => s.push(other),
            }
        }
        Err(VaultError::InvalidQuery(format!(
            "unterminated quote starting at position {}",
            open + 1
        )))
    }

    /// A `/body/flags` literal, or a plain word when no closing slash follows
    /// or the literal does not end the atom.
    fn regex_or_word(&mut self, stop: &[char]) -> Value {
        let start = self.pos;
        let mut i = start + 1;
        let mut escaped = false;

        while i < self.chars.len() {
            let c = self.chars[i];
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '/' {
                break;
            }
            i += 1;
        }

        if i >= self.chars.len() || i == start + 1 {
            return Value::Word(self.word(stop));
        }

        // Closing slash at `i`; flags follow.
        let mut end = i + 1;
        while end < self.chars.len() && self.chars[end].is_ascii_alphabetic() {
            end += 1;
        }
        // `/a/b/c` is a path, not a regex followed by more text.
        if let Some(&c) = self.chars.get(end) {
            if !(c.is_whitespace() || c == '"' || stop.contains(&c)) {
                return Value::Word(self.word(stop));
            }
        }
        let literal: String = self.chars[start..end].iter().collect();
        self.pos = end;
        Value::Regex(literal)
    }

    fn word(&mut self, stop: &[char]) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '"' || stop.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn chip(&mut self, field: Field, builder: QueryBuilder) -> Result<QueryBuilder> {
        match field {
            Field::Property => self.property(builder),
            Field::Line if self.peek() == Some('(') => self.line_group(builder),
            _ => {
                let value = self.required_value(field)?.into_text();
                Ok(match field {
                    Field::File => builder.with_file_pattern(&value),
                    Field::Path => builder.with_path_pattern(&value),
                    Field::Tag => builder.with_tag(&value),
                    Field::Content => builder.with_content_pattern(&value),
                    Field::Line => builder.with_line_term(&value),
                    Field::Heading => builder.with_heading_pattern(&value),
                    Field::Property => builder.with_property(&value, PropertyValue::Exists),
                })
            }
        }
    }

    fn required_value(&mut self, field: Field) -> Result<Value> {
        self.value(&[])?.ok_or_else(|| {
            VaultError::InvalidQuery(format!("missing value after '{}:'", field.name()))
        })
    }

    fn line_group(&mut self, mut builder: QueryBuilder) -> Result<QueryBuilder> {
        self.pos += 1; // '('
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(VaultError::InvalidQuery(
                        "unterminated group after 'line:('".to_string(),
                    ));
                }
                Some(')') => {
                    self.pos += 1;
                    return Ok(builder);
                }
                Some(_) => {
                    if let Some(value) = self.value(&[')'])? {
                        builder = builder.with_line_term(&value.into_text());
                    }
                }
            }
        }
    }

    fn property(&mut self, builder: QueryBuilder) -> Result<QueryBuilder> {
        let key = self.word(&['=']);
        if key.is_empty() {
            return Err(VaultError::InvalidQuery(
                "missing property name after 'prop:'".to_string(),
            ));
        }

        if self.peek() != Some('=') {
            return Ok(builder.with_property(&key, PropertyValue::Exists));
        }
        self.pos += 1;

        let value = match self.value(&[])? {
            Some(Value::Regex(literal)) => PropertyValue::parse(&literal),
            Some(other) => PropertyValue::Equals(other.into_text()),
            None => {
                return Err(VaultError::InvalidQuery(format!(
                    "missing value after 'prop:{}='",
                    key
                )));
            }
        };
        Ok(builder.with_property(&key, value))
    }
}

/// Parse a query string into a builder. The caller still sets the case rule
/// and calls [`QueryBuilder::build`].
pub fn parse_query(input: &str) -> Result<QueryBuilder> {
    let mut parser = Parser::new(input);
    let mut builder = QueryBuilder::new();

    loop {
        parser.skip_whitespace();
        if parser.at_end() {
            break;
        }

        if let Some(field) = parser.field_prefix() {
            builder = parser.chip(field, builder)?;
            continue;
        }

        match parser.value(&[])? {
            Some(value) => builder = builder.with_global_term(&value.into_text()),
            // A lone quote is handled by `value`; anything else is one char.
            None => parser.pos += 1,
        }
    }

    Ok(builder)
}
