//! @module "Annotation"
//! @summary "Single annotation phrase parsing"
//! @layer parser
//!
//! Single annotation phrases: `@name [{type}] [value...]`.

use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use regex::Regex;

use crate::error::{MetaError, Result};

/// Regex for one annotation phrase, tolerating leftover comment decoration.
/// Groups: 1=name, 2=everything after the name
static PHRASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:/\*+|\*+)?\s*@(\w[\w-]*)(.*)$").unwrap()
});

/// A parsed `@name {type} value` tag.
///
/// Empty type and value parts are stored as `None`, so
/// `@test` and `@test {}` both carry only a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    r#type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl Annotation {
    /// Parse one annotation line.
    ///
    /// The type is recognized only when a `{` directly follows the name
    /// (blanks aside) and is closed by a balancing `}`. An unbalanced brace
    /// is treated as part of the value.
    pub fn parse(phrase: &str) -> Result<Self> {
        let caps = PHRASE_PATTERN
            .captures(phrase.lines().next().unwrap_or_default())
            .ok_or_else(|| MetaError::MalformedAnnotation(phrase.trim().to_string()))?;

        let name = caps[1].to_string();
        let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
        let rest = rest.strip_suffix("*/").unwrap_or(rest).trim();

        let (r#type, value) = match split_type(rest) {
            Some((ty, after)) => (non_empty(ty), non_empty(after)),
            None => (None, non_empty(rest)),
        };

        Ok(Self { name, r#type, value })
    }

    /// Build an annotation from its parts instead of from a phrase.
    pub fn from_values(name: impl Into<String>, r#type: Option<&str>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.and_then(non_empty),
            value: value.and_then(non_empty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text between the braces, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.r#type.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if let Some(ty) = &self.r#type {
            write!(f, " {{{}}}", ty)?;
        }
        if let Some(value) = &self.value {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Annotation {
    type Err = MetaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split `{type} rest` at the brace balancing the leading `{`.
fn split_type(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((text[1..i].trim(), text[i + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    None
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
