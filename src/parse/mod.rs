//! @module "Parser"
//! @summary "Doc comment and annotation parsing"
//! @layer parser
//!
//! Comment and annotation parsing.
//!
//! Parses doc comments (`/** ... */`) into [`CommentBlock`]s holding
//! [`Annotation`]s, and classifies the declaration that follows a comment.
//! Currently uses regex-based lexical matching; there is no syntax tree.
//!
//! ```
//! use docmeta::parse::{Annotation, CommentBlock};
//!
//! let block = CommentBlock::parse("/**\n * @param {string} name\n * @test\n */");
//! assert_eq!(block.annotations("param")[0].type_name(), Some("string"));
//! assert!(block.has_annotation("test"));
//!
//! let ann: Annotation = "@see path/to/other".parse().unwrap();
//! assert_eq!(ann.value(), Some("path/to/other"));
//! ```

pub mod annotation;
pub mod declaration;
pub mod docblock;

pub use annotation::Annotation;
pub use declaration::{classify, declaration_head, Accessor, Declaration, DeclarationKind};
pub use docblock::{CommentBlock, CommentSpan, COMMENT_CLOSE, COMMENT_OPEN};
