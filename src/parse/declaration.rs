//! @module "Declaration"
//! @summary "Lexical classification of documented declarations"
//! @layer parser
//!
//! Declaration classification for the text that follows a doc comment.
//!
//! This is a lexical heuristic, not a grammar. It understands one-line (or
//! simply wrapped) signatures of the forms
//!
//! - `class Name [extends Other] {`, optionally assigned
//!   (`module.exports = class Name {`)
//! - `[static] get|set name(...) {`
//! - `[static|async] [*]name(...) {`
//!
//! Parameter lists may span lines and contain nested parentheses or
//! destructuring braces. String literals containing parentheses, comments
//! between the doc block and the signature, and computed member names are
//! not understood and classify as [`Declaration::None`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Regex for class signatures, as a statement or as the value of an
/// assignment (`module.exports = class Name {`, `const A = class Name {`)
/// Groups: 1=class name, 2=extended class (optional)
static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:export\s+(?:default\s+)?)?(?:(?:const|let|var)\s+)?(?:[A-Za-z_$][\w$.]*\s*=\s*)?class\s+([A-Za-z_$][\w$]*)(?:\s+extends\s+([A-Za-z_$][\w$.]*))?\s*\{$",
    )
    .unwrap()
});

/// Regex for the part of a member signature up to the opening parenthesis
/// Groups: 1=accessor keyword (optional), 2=generator star (optional), 3=member name
static MEMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:static|async)\s+)*(?:(get|set)\s+)?(\*\s*)?([A-Za-z_$][\w$]*)\s*\(")
        .unwrap()
});

/// Words that open a statement block and never name a method.
const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "function",
];

/// Accessor keyword of a property declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessor {
    Get,
    Set,
}

/// Kind tag of a [`Declaration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Method,
    Property,
    None,
}

/// What a doc comment documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Declaration {
    Class {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        extends: Option<String>,
    },
    Method {
        name: String,
    },
    Property {
        name: String,
        accessor: Accessor,
    },
    #[default]
    None,
}

impl Declaration {
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Class { .. } => DeclarationKind::Class,
            Declaration::Method { .. } => DeclarationKind::Method,
            Declaration::Property { .. } => DeclarationKind::Property,
            Declaration::None => DeclarationKind::None,
        }
    }

    /// Name of the declared class, method or property
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Class { name, .. }
            | Declaration::Method { name }
            | Declaration::Property { name, .. } => Some(name),
            Declaration::None => None,
        }
    }

    /// Extended class, for class declarations only
    pub fn super_type_name(&self) -> Option<&str> {
        match self {
            Declaration::Class { extends, .. } => extends.as_deref(),
            _ => None,
        }
    }

    /// True for `get` accessors
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Declaration::Property {
                accessor: Accessor::Get,
                ..
            }
        )
    }
}

/// Find the end of the declaration head starting at `from`: the byte index
/// just past the first `{` that is not inside parentheses.
///
/// Returns `None` when the text ends before such a brace.
pub fn declaration_head(text: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.get(from..)?.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '{' if depth == 0 => return Some(from + i + 1),
            _ => {}
        }
    }
    None
}

/// Classify a declaration head (text after a comment, ending with `{`).
pub fn classify(head: &str) -> Declaration {
    if let Some(caps) = CLASS_PATTERN.captures(head) {
        return Declaration::Class {
            name: caps[1].to_string(),
            extends: caps.get(2).map(|m| m.as_str().to_string()),
        };
    }

    let Some(caps) = MEMBER_PATTERN.captures(head) else {
        return Declaration::None;
    };
    let open = caps.get(0).map_or(0, |m| m.end() - 1);
    if !is_signature_tail(&head[open..]) {
        return Declaration::None;
    }

    let name = caps[3].to_string();
    match (caps.get(1).map(|m| m.as_str()), caps.get(2)) {
        (Some("get"), None) => Declaration::Property {
            name,
            accessor: Accessor::Get,
        },
        (Some("set"), None) => Declaration::Property {
            name,
            accessor: Accessor::Set,
        },
        (Some(_), _) => Declaration::None,
        (None, _) if STATEMENT_KEYWORDS.contains(&name.as_str()) => Declaration::None,
        (None, _) => Declaration::Method { name },
    }
}

/// `(params) {` with balanced parentheses and no statement separator.
fn is_signature_tail(tail: &str) -> bool {
    let mut depth = 0usize;
    for (i, ch) in tail.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return tail[i + 1..].trim() == "{";
                }
            }
            ';' => return false,
            _ => {}
        }
    }
    false
}
