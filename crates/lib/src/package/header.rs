//! Source header scanning.
//!
//! Only the package clause and the import declarations at the top of a file
//! are read; everything after them belongs to the translator.
//!
//! ```text
//! // comment
//! package shapes
//!
//! import "geo/point"
//! import (
//!     "fmt"
//!     m "math"
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct HeaderError {
  pub line: usize,
  pub message: String,
}

impl HeaderError {
  fn new(line: usize, message: impl Into<String>) -> Self {
    Self {
      line,
      message: message.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
  pub name: String,
  /// Imported identities in declaration order, duplicates removed.
  pub imports: Vec<String>,
}

enum State {
  Package,
  Imports,
  ImportBlock { opened_at: usize },
}

pub fn scan(source: &str) -> Result<Header, HeaderError> {
  let mut state = State::Package;
  let mut name = String::new();
  let mut imports: Vec<String> = Vec::new();
  let mut last_line = 0;

  for (idx, raw) in source.lines().enumerate() {
    let line_no = idx + 1;
    last_line = line_no;
    let line = strip_comment(raw).trim();
    if line.is_empty() {
      continue;
    }

    match state {
      State::Package => {
        let Some(rest) = keyword(line, "package") else {
          return Err(HeaderError::new(line_no, "expected package clause"));
        };
        if !is_identifier(rest) {
          return Err(HeaderError::new(line_no, format!("invalid package name '{}'", rest)));
        }
        name = rest.to_string();
        state = State::Imports;
      }
      State::Imports => {
        let Some(rest) = keyword(line, "import") else {
          break;
        };
        if rest == "(" {
          state = State::ImportBlock { opened_at: line_no };
        } else {
          push_unique(&mut imports, parse_spec(rest, line_no)?);
        }
      }
      State::ImportBlock { .. } => {
        if line == ")" {
          state = State::Imports;
        } else {
          push_unique(&mut imports, parse_spec(line, line_no)?);
        }
      }
    }
  }

  match state {
    State::Package => Err(HeaderError::new(last_line.max(1), "expected package clause")),
    State::ImportBlock { opened_at } => Err(HeaderError::new(opened_at, "unterminated import block")),
    State::Imports => Ok(Header { name, imports }),
  }
}

fn strip_comment(line: &str) -> &str {
  match line.find("//") {
    Some(idx) => &line[..idx],
    None => line,
  }
}

/// `line` without the leading keyword, if it starts with it as a whole word.
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
  let rest = line.strip_prefix(word)?;
  if rest.is_empty() {
    return Some(rest);
  }
  if !rest.starts_with(char::is_whitespace) && !rest.starts_with('(') {
    return None;
  }
  Some(rest.trim_start())
}

/// Parse `"path"` or `alias "path"`.
fn parse_spec(spec: &str, line_no: usize) -> Result<String, HeaderError> {
  let spec = spec.trim_end_matches(';').trim();
  let quoted = match spec.split_once(char::is_whitespace) {
    Some((alias, rest)) if !alias.starts_with('"') => {
      if !(alias == "_" || alias == "." || is_identifier(alias)) {
        return Err(HeaderError::new(line_no, format!("invalid import alias '{}'", alias)));
      }
      rest.trim()
    }
    _ => spec,
  };

  let path = quoted
    .strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .ok_or_else(|| HeaderError::new(line_no, format!("malformed import '{}'", spec)))?;

  if path.is_empty() || path.contains('"') {
    return Err(HeaderError::new(line_no, format!("malformed import '{}'", spec)));
  }
  Ok(path.to_string())
}

fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
    _ => false,
  }
}

fn push_unique(imports: &mut Vec<String>, path: String) {
  if !imports.contains(&path) {
    imports.push(path);
  }
}
