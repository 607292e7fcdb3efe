//! @module "Metadata Types"
//! @summary "Per-file metadata records"
//! @layer model
//!
//! Per-file metadata assembled from documented declarations.

use indexmap::IndexMap;
use serde::Serialize;

use crate::parse::{Accessor, CommentBlock, Declaration, DeclarationKind};

/// Everything documented in one source file.
///
/// At most one class is recorded. Methods are keyed by name (a repeated
/// name replaces the earlier doc). Properties merge their `get`/`set`
/// accessors under one name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_extends: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_doc: Option<CommentBlock>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    methods: IndexMap<String, CommentBlock>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    properties: IndexMap<String, PropertyEntry>,
}

/// A documented property and whether it can be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    doc: CommentBlock,
    read_only: bool,
}

impl PropertyEntry {
    /// Doc of the first accessor found for this property
    pub fn doc(&self) -> &CommentBlock {
        &self.doc
    }

    /// True until a documented `set` accessor is seen
    pub fn read_only(&self) -> bool {
        self.read_only
    }
}

/// One item of [`FileMetadata::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataEntry<'a> {
    pub kind: DeclarationKind,
    pub name: &'a str,
    pub doc: &'a CommentBlock,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn class_extends(&self) -> Option<&str> {
        self.class_extends.as_deref()
    }

    pub fn class_doc(&self) -> Option<&CommentBlock> {
        self.class_doc.as_ref()
    }

    /// Documented method names in discovery order
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn method(&self, name: &str) -> Option<&CommentBlock> {
        self.methods.get(name)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Documented property names in discovery order
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.get(name)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// No class, method or property was recorded.
    pub fn is_empty(&self) -> bool {
        self.class_doc.is_none() && self.methods.is_empty() && self.properties.is_empty()
    }

    /// Class first, then properties, then methods.
    pub fn entries(&self) -> Vec<MetadataEntry<'_>> {
        let class = self.class_doc.iter().map(|doc| MetadataEntry {
            kind: DeclarationKind::Class,
            name: self.class_name.as_deref().unwrap_or_default(),
            doc,
        });
        let properties = self.properties.iter().map(|(name, entry)| MetadataEntry {
            kind: DeclarationKind::Property,
            name,
            doc: &entry.doc,
        });
        let methods = self.methods.iter().map(|(name, doc)| MetadataEntry {
            kind: DeclarationKind::Method,
            name,
            doc,
        });
        class.chain(properties).chain(methods).collect()
    }

    /// Record a classified comment block.
    ///
    /// Returns `false` when the block was not kept: it documents nothing,
    /// or it is a second class in the same file.
    pub fn record(&mut self, block: CommentBlock) -> bool {
        match block.declaration().clone() {
            Declaration::Class { name, extends } => {
                if let Some(existing) = &self.class_name {
                    tracing::debug!(
                        file = %self.file_name,
                        class = %existing,
                        ignored = %name,
                        "ignoring additional class declaration"
                    );
                    return false;
                }
                self.class_name = Some(name);
                self.class_extends = extends;
                self.class_doc = Some(block);
            }
            Declaration::Property { name, accessor } => {
                self.properties
                    .entry(name)
                    .and_modify(|entry| {
                        if accessor == Accessor::Set {
                            entry.read_only = false;
                        }
                    })
                    .or_insert(PropertyEntry {
                        doc: block,
                        read_only: accessor == Accessor::Get,
                    });
            }
            Declaration::Method { name } => {
                self.methods.insert(name, block);
            }
            Declaration::None => return false,
        }
        true
    }
}
