//! @module "Comment Block"
//! @summary "Doc comment blocks and their annotation groups"
//! @layer parser
//!
//! Doc comment blocks (`/** ... */`) and the annotations inside them.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use super::annotation::Annotation;
use super::declaration::{Declaration, DeclarationKind};
use crate::error::{MetaError, Result};

/// Opening marker of a doc comment
pub const COMMENT_OPEN: &str = "/**";
/// Closing marker of a doc comment
pub const COMMENT_CLOSE: &str = "*/";

/// Regex for annotation lines inside a comment: `* @name ...` at line start
static ANNOTATION_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:/\*\*|\*)[ \t]*@\w.*$").unwrap()
});

/// One doc comment, its annotations grouped by name, and the declaration
/// it documents.
///
/// The comment text is fixed at construction. Groups keep the order in which
/// their names first appeared; annotations within a group keep source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentBlock {
    raw: String,
    annotations: IndexMap<String, Vec<Annotation>>,
    #[serde(skip_serializing_if = "is_undeclared")]
    declaration: Declaration,
}

fn is_undeclared(declaration: &Declaration) -> bool {
    matches!(declaration, Declaration::None)
}

/// A comment block located inside a larger text.
#[derive(Debug, Clone)]
pub struct CommentSpan {
    pub block: CommentBlock,
    /// Byte index of the opening `/**`
    pub start: usize,
    /// Byte index just past the closing `*/`
    pub end: usize,
}

impl CommentBlock {
    /// Build a block from the full comment text, extracting its annotations.
    pub fn parse(comment: impl Into<String>) -> Self {
        let raw = comment.into();
        let mut block = Self::default();

        for line in ANNOTATION_LINE_PATTERN.find_iter(&raw) {
            match Annotation::parse(line.as_str()) {
                Ok(annotation) => block.add_annotation(annotation),
                Err(err) => tracing::warn!(error = %err, "skipping annotation phrase"),
            }
        }

        block.raw = raw;
        block
    }

    /// Locate the next comment at or after `start` in `text`.
    ///
    /// `Ok(None)` means no comment remains. An opener without a closer is
    /// [`MetaError::UnterminatedComment`].
    pub fn from_span(text: &str, start: usize) -> Result<Option<CommentSpan>> {
        let Some(rest) = text.get(start..) else {
            return Ok(None);
        };
        let Some(found) = rest.find(COMMENT_OPEN) else {
            return Ok(None);
        };
        let open = start + found;

        // "/**/" closes on the opener's second star
        let close = text[open + 2..]
            .find(COMMENT_CLOSE)
            .map(|i| open + 2 + i + COMMENT_CLOSE.len())
            .ok_or_else(|| MetaError::UnterminatedComment {
                offset: open,
                line: line_of(text, open),
            })?;

        Ok(Some(CommentSpan {
            block: Self::parse(&text[open..close]),
            start: open,
            end: close,
        }))
    }

    /// Attach the declaration this comment documents.
    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declaration = declaration;
        self
    }

    /// Full comment text, markers included
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn kind(&self) -> DeclarationKind {
        self.declaration.kind()
    }

    pub fn declaration_name(&self) -> Option<&str> {
        self.declaration.name()
    }

    pub fn super_type_name(&self) -> Option<&str> {
        self.declaration.super_type_name()
    }

    pub fn is_read_only(&self) -> bool {
        self.declaration.is_read_only()
    }

    /// Whether the block carries any annotation at all.
    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    /// All annotations with the given name; empty when there are none.
    pub fn annotations(&self, name: &str) -> &[Annotation] {
        self.annotations
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Value of the first annotation with the given name.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.annotations(name).first().and_then(Annotation::value)
    }

    /// Annotation names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.annotations.keys().map(String::as_str)
    }

    /// Every annotation, group by group.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values().flatten()
    }

    /// Total number of annotations across all groups
    pub fn len(&self) -> usize {
        self.annotations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Record an annotation the comment text does not contain, such as
    /// system data derived elsewhere. It joins the group of its name.
    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations
            .entry(annotation.name().to_string())
            .or_default()
            .push(annotation);
    }
}

impl<'a> IntoIterator for &'a CommentBlock {
    type Item = &'a Annotation;
    type IntoIter = Box<dyn Iterator<Item = &'a Annotation> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// 1-based line number of a byte offset
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PHRASE_A: &str = "/**
 *
 * @param {module.Mock} a
 * @param {string} b
 * @foo bar
 */";

    #[test]
    fn test_groups_annotations_by_name() {
        let block = CommentBlock::parse(PHRASE_A);
        assert_eq!(block.raw().len(), PHRASE_A.len());
        assert!(block.has_annotation("param"));

        let params = block.annotations("param");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].type_name(), Some("module.Mock"));
        assert_eq!(params[0].value(), Some("a"));
        assert_eq!(params[1].type_name(), Some("string"));
        assert_eq!(params[1].value(), Some("b"));

        assert!(block.annotations("type").is_empty());
        assert_eq!(block.annotations("foo").len(), 1);
        assert_eq!(block.first_value("foo"), Some("bar"));
        assert_eq!(block.first_value("type"), None);
    }

    #[test]
    fn test_iteration_order() {
        let block = CommentBlock::parse(PHRASE_A);
        let seen: Vec<String> = block.iter().map(|a| a.to_string()).collect();
        assert_eq!(
            seen,
            vec!["@param {module.Mock} a", "@param {string} b", "@foo bar"]
        );

        // restartable
        assert_eq!((&block).into_iter().count(), 3);
        assert_eq!(block.len(), 3);
        assert_eq!(block.names().collect::<Vec<_>>(), vec!["param", "foo"]);
    }

    #[test]
    fn test_group_order_follows_first_occurrence() {
        let block = CommentBlock::parse("/**\n * @a 1\n * @b 2\n * @a 3\n */");
        let values: Vec<_> = block.iter().filter_map(Annotation::value).collect();
        assert_eq!(values, vec!["1", "3", "2"]);
    }

    #[test]
    fn test_no_annotations() {
        for text in ["/** plain text */", "/**\n * This will be skipped\n *\n */", "/**/"] {
            let block = CommentBlock::parse(text);
            assert!(!block.has_annotations(), "{:?}", text);
            assert!(block.is_empty());
        }
        // an email address mid-line is not an annotation
        assert!(!CommentBlock::parse("/**\n * mail me at a@b.c\n */").has_annotations());
    }

    #[test]
    fn test_single_line_comment() {
        let block = CommentBlock::parse("/** @test foo */");
        assert_eq!(block.first_value("test"), Some("foo"));
    }

    #[test]
    fn test_add_annotation_joins_group() {
        let mut block = CommentBlock::parse(PHRASE_A);
        block.add_annotation(Annotation::from_values("param", None, Some("c")));
        block.add_annotation(Annotation::from_values("column", None, None));

        assert_eq!(block.annotations("param").len(), 3);
        assert!(block.has_annotation("column"));
        assert_eq!(block.raw(), PHRASE_A);
    }

    #[test]
    fn test_comment_text_is_fixed_at_construction() {
        let block = CommentBlock::parse("/** @first */");
        let block = block.with_declaration(Declaration::Method {
            name: "m".to_string(),
        });
        assert_eq!(block.raw(), "/** @first */");
        assert!(block.has_annotation("first"));
        assert_eq!(block.kind(), DeclarationKind::Method);
    }

    #[test]
    fn test_from_span() {
        let text = "let a;\n/** @x 1 */\nfoo() {}\n/** @y */";
        let first = CommentBlock::from_span(text, 0).unwrap().unwrap();
        assert_eq!(first.start, 7);
        assert_eq!(&text[first.start..first.end], "/** @x 1 */");
        assert_eq!(first.block.first_value("x"), Some("1"));

        let second = CommentBlock::from_span(text, first.end).unwrap().unwrap();
        assert!(second.block.has_annotation("y"));
        assert_eq!(second.end, text.len());

        assert!(CommentBlock::from_span(text, second.end).unwrap().is_none());
        assert!(CommentBlock::from_span(text, text.len() + 5).unwrap().is_none());
    }

    #[test]
    fn test_unterminated_span() {
        let text = "/** @ok */\n\n/**\n * @broken\n";
        let err = CommentBlock::from_span(text, 10).unwrap_err();
        assert!(matches!(
            err,
            MetaError::UnterminatedComment { offset: 12, line: 3 }
        ));
    }
}
