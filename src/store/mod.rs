//! @module "Collection Store"
//! @summary "Namespace-keyed metadata store"
//! @layer model
//!
//! Collected metadata, keyed by namespace.
//!
//! A namespace is a file's path relative to the collection root, with `/`
//! separators and the final extension removed (`sub/Other.js` becomes
//! `sub/Other`). The store is append-only: entries are never replaced.

mod types;

pub use types::{FileMetadata, MetadataEntry, PropertyEntry};

use std::fs::File;
use std::io::BufWriter;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{MetaError, Result};

/// Metadata for every file of one collection, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStore {
    root: PathBuf,
    metadata: IndexMap<String, FileMetadata>,
}

impl CollectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            metadata: IndexMap::new(),
        }
    }

    /// Path the collection started from
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    /// Namespaces in lexical order, independent of completion order
    pub fn sorted_namespaces(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.namespaces().collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, namespace: &str) -> Option<&FileMetadata> {
        self.metadata.get(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.metadata.contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileMetadata)> {
        self.metadata.iter().map(|(ns, meta)| (ns.as_str(), meta))
    }

    /// Add metadata under a new namespace.
    ///
    /// An existing namespace is left untouched and reported as
    /// [`MetaError::NamespaceCollision`].
    pub fn insert(&mut self, namespace: impl Into<String>, metadata: FileMetadata) -> Result<()> {
        let namespace = namespace.into();
        if self.metadata.contains_key(&namespace) {
            return Err(MetaError::NamespaceCollision(namespace));
        }
        self.metadata.insert(namespace, metadata);
        Ok(())
    }

    /// Write the store to a JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Derive the namespace of `path` under `root`.
///
/// A path equal to the root (a single-file collection) uses its file stem.
/// Paths outside the root fall back to their own normalized form.
pub fn namespace_for(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => {
            return path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(rel) => rel,
        Err(_) => path,
    };

    let stripped = relative.with_extension("");
    let mut parts: Vec<String> = Vec::new();
    for component in stripped.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_for() {
        let root = Path::new("/project/mocks");
        assert_eq!(namespace_for(root, Path::new("/project/mocks/Mock.js")), "Mock");
        assert_eq!(
            namespace_for(root, Path::new("/project/mocks/sub/OtherMock.js")),
            "sub/OtherMock"
        );
        assert_eq!(
            namespace_for(root, Path::new("/project/mocks/a/b/c.test.js")),
            "a/b/c.test"
        );
        assert_eq!(namespace_for(Path::new("./src"), Path::new("./src/x.src")), "x");
    }

    #[test]
    fn test_namespace_for_single_file_root() {
        let file = Path::new("/project/mocks/Mock.js");
        assert_eq!(namespace_for(file, file), "Mock");
    }

    #[test]
    fn test_insert_keeps_first_entry() {
        let mut store = CollectionStore::new("/root");
        store.insert("a", FileMetadata::new("a.js")).unwrap();
        let err = store.insert("a", FileMetadata::new("other/a.js")).unwrap_err();

        assert!(matches!(err, MetaError::NamespaceCollision(ref ns) if ns == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().file_name(), "a.js");
    }

    #[test]
    fn test_sorted_namespaces() {
        let mut store = CollectionStore::new("/root");
        for ns in ["sub/c", "b", "a"] {
            store.insert(ns, FileMetadata::default()).unwrap();
        }
        assert_eq!(store.namespaces().collect::<Vec<_>>(), vec!["sub/c", "b", "a"]);
        assert_eq!(store.sorted_namespaces(), vec!["a", "b", "sub/c"]);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let mut store = CollectionStore::new("/root");
        store.insert("sub/c", FileMetadata::new("sub/c.js")).unwrap();
        store.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["metadata"]["sub/c"].is_object());
        assert_eq!(value["root"], "/root");
    }
}
