//! Key-value pair parser
//!
//! Reads the line-oriented `key = value` format used by `.macros` and
//! `.session` files into an ordered [`KeyValueMap`].
//!
//! # Format
//!
//! ```text
//! # comment lines start with the comment prefix
//! f1 = "ls -la\r"
//! command = /bin/zsh -l
//! ```
//!
//! - Blank lines and comment lines are skipped.
//! - Each remaining line is split on the first separator; key and value are
//!   trimmed.
//! - A value wrapped in double quotes loses the outer quotes. Nothing inside
//!   is unescaped.
//! - A repeated key keeps its first position and takes the last value.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::error::FormatError;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Line-level grammar for key-value files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Separator between key and value; lines split on its first occurrence
    pub separator: char,
    /// Prefixes that mark a whole line as a comment
    pub comment_prefixes: Vec<String>,
    /// Remove one pair of surrounding double quotes from values
    pub strip_quotes: bool,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            separator: '=',
            comment_prefixes: vec!["#".to_string()],
            strip_quotes: true,
        }
    }
}

impl Grammar {
    /// Parse a single line. `Ok(None)` means the line carries no pair.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Option<(String, String)>, FormatError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || self.is_comment(trimmed) {
            return Ok(None);
        }

        let (key, value) = trimmed
            .split_once(self.separator)
            .ok_or(FormatError::MissingSeparator {
                line: line_no,
                separator: self.separator,
            })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(FormatError::EmptyKey { line: line_no });
        }

        let mut value = value.trim();
        if self.strip_quotes {
            value = unquote(value);
        }

        Ok(Some((key.to_string(), value.to_string())))
    }

    fn is_comment(&self, trimmed: &str) -> bool {
        self.comment_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && trimmed.starts_with(prefix.as_str()))
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Ordered mapping produced by one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueMap {
    entries: Vec<(String, String)>,
}

impl KeyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. A key seen before keeps its position and takes the new value.
    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Key-value parser bound to a grammar
#[derive(Debug, Clone, Default)]
pub struct Parser {
    grammar: Grammar,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// Parse every line from a reader
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<KeyValueMap, ParseError> {
        self.parse_lines(reader.lines().map(|line| line.map_err(ParseError::from)))
    }

    pub fn parse_str(&self, text: &str) -> Result<KeyValueMap, FormatError> {
        self.parse_lines(text.lines().map(Ok))
    }

    fn parse_lines<I, S, E>(&self, lines: I) -> Result<KeyValueMap, E>
    where
        I: IntoIterator<Item = Result<S, E>>,
        S: AsRef<str>,
        E: From<FormatError>,
    {
        let mut map = KeyValueMap::new();
        for (index, line) in lines.into_iter().enumerate() {
            if let Some((key, value)) = self.grammar.parse_line(line?.as_ref(), index + 1)? {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    /// Parse a file. The handle is closed before returning, on success or failure.
    pub fn parse_file(&self, path: &Path) -> Result<KeyValueMap, ParseError> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }
}
