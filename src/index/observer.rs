//! @module "Collect Observer"
//! @summary "Traversal event callbacks and channel events"
//! @layer service
//!
//! Traversal notifications.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::MetaError;
use crate::store::{CollectionStore, FileMetadata};

/// Receives traversal events as they happen.
///
/// `file_parsed` calls for sibling files arrive in no particular order,
/// possibly from several threads at once. `complete` is called exactly
/// once, after every `file_parsed`.
pub trait CollectObserver: Send + Sync {
    fn file_parsed(&self, metadata: &FileMetadata, namespace: &str) {
        let _ = (metadata, namespace);
    }

    /// A branch failed; the rest of the traversal continues
    fn error(&self, error: &MetaError) {
        let _ = error;
    }

    fn complete(&self, store: &CollectionStore) {
        let _ = store;
    }
}

/// Ignores every event
impl CollectObserver for () {}

impl<T: CollectObserver + ?Sized> CollectObserver for Arc<T> {
    fn file_parsed(&self, metadata: &FileMetadata, namespace: &str) {
        (**self).file_parsed(metadata, namespace)
    }

    fn error(&self, error: &MetaError) {
        (**self).error(error)
    }

    fn complete(&self, store: &CollectionStore) {
        (**self).complete(store)
    }
}

/// Owned form of an observer callback, for channel consumers
#[derive(Debug, Clone)]
pub enum CollectEvent {
    FileParsed {
        namespace: String,
        metadata: FileMetadata,
    },
    Error(String),
    Complete {
        files: usize,
    },
}

impl CollectObserver for UnboundedSender<CollectEvent> {
    fn file_parsed(&self, metadata: &FileMetadata, namespace: &str) {
        let _ = self.send(CollectEvent::FileParsed {
            namespace: namespace.to_string(),
            metadata: metadata.clone(),
        });
    }

    fn error(&self, error: &MetaError) {
        let _ = self.send(CollectEvent::Error(error.to_string()));
    }

    fn complete(&self, store: &CollectionStore) {
        let _ = self.send(CollectEvent::Complete { files: store.len() });
    }
}
