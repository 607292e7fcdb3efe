//! @module "Traversal"
//! @summary "Bookkeeping shared by the traversal drivers"
//! @layer service
//!
//! Bookkeeping shared by the async and blocking traversal drivers.
//!
//! Drivers do the I/O and dispatch children; every counter transition goes
//! through [`Traversal`] so both drivers complete the same way.

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::counter::WorkCounter;
use super::filter::FileFilter;
use super::observer::CollectObserver;
use crate::error::MetaError;
use crate::scan::Scanner;
use crate::store::{namespace_for, CollectionStore};

/// What to do with a stat'ed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryAction {
    Descend,
    Scan,
    Skip,
}

pub(crate) struct Traversal {
    root: PathBuf,
    follow_symlinks: bool,
    filter: Arc<dyn FileFilter>,
    scanner: Scanner,
    observer: Arc<dyn CollectObserver>,
    cancelled: Arc<AtomicBool>,
    counter: WorkCounter,
    store: Mutex<CollectionStore>,
    errors: Mutex<Vec<MetaError>>,
    visited: Mutex<HashSet<PathBuf>>,
    root_failure: Mutex<Option<MetaError>>,
    parsed: AtomicUsize,
    done: Notify,
}

impl Traversal {
    pub(crate) fn new(
        root: PathBuf,
        follow_symlinks: bool,
        filter: Arc<dyn FileFilter>,
        observer: Arc<dyn CollectObserver>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store: Mutex::new(CollectionStore::new(root.clone())),
            root,
            follow_symlinks,
            filter,
            scanner: Scanner::new(),
            observer,
            cancelled,
            counter: WorkCounter::new(),
            errors: Mutex::new(Vec::new()),
            visited: Mutex::new(HashSet::new()),
            root_failure: Mutex::new(None),
            parsed: AtomicUsize::new(0),
            done: Notify::new(),
        }
    }

    pub(crate) fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the last unit finished
    pub(crate) async fn finished(&self) {
        self.done.notified().await
    }

    /// Decide how to handle an entry from its metadata.
    pub(crate) fn action(&self, path: &Path, metadata: &Metadata) -> EntryAction {
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            tracing::debug!(path = %path.display(), "skipping symlink");
            return EntryAction::Skip;
        }
        if path != self.root {
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if self.filter.is_excluded(relative) {
                tracing::debug!(path = %path.display(), "excluded");
                return EntryAction::Skip;
            }
        }
        if file_type.is_dir() {
            EntryAction::Descend
        } else if file_type.is_file() && self.filter.is_eligible(path) {
            EntryAction::Scan
        } else {
            EntryAction::Skip
        }
    }

    /// Record a directory by its canonical path; `false` if seen before.
    pub(crate) fn first_visit(&self, canonical: &Path) -> bool {
        self.visited.lock().insert(canonical.to_path_buf())
    }

    /// Replace a directory unit with its children and return the ones to
    /// dispatch. After cancellation the directory finishes childless.
    pub(crate) fn expand(&self, dir: &Path, children: Vec<PathBuf>) -> Vec<PathBuf> {
        let children = if self.is_cancelled() {
            tracing::debug!(path = %dir.display(), "cancelled, not descending");
            Vec::new()
        } else {
            children
        };
        tracing::debug!(path = %dir.display(), children = children.len(), "expanding directory");
        if self.counter.expand(children.len()) {
            self.complete();
        }
        children
    }

    /// Scan one file's content and store the result.
    pub(crate) fn scanned(&self, path: &Path, content: &str) {
        let namespace = namespace_for(&self.root, path);
        let scanned = self.scanner.scan(&path.to_string_lossy(), content);

        if let Some(err) = scanned.error {
            self.report(MetaError::in_file(namespace.as_str(), err));
        }

        self.observer.file_parsed(&scanned.metadata, &namespace);
        self.parsed.fetch_add(1, Ordering::Relaxed);

        let inserted = self.store.lock().insert(namespace, scanned.metadata);
        if let Err(err) = inserted {
            self.report(err);
        }
        self.finish_unit();
    }

    pub(crate) fn skipped(&self) {
        self.finish_unit();
    }

    pub(crate) fn failed(&self, err: MetaError) {
        self.report(err);
        self.finish_unit();
    }

    /// A directory could not be resolved or listed. For the root this ends
    /// the traversal without `complete`; the driver reports it.
    pub(crate) fn dir_failed(&self, dir: &Path, err: MetaError) {
        if dir != self.root {
            return self.failed(err);
        }
        *self.root_failure.lock() = Some(err);
        self.finish_unit();
    }

    /// Error that made the root unreadable, if any
    pub(crate) fn take_root_failure(&self) -> Option<MetaError> {
        self.root_failure.lock().take()
    }

    fn report(&self, err: MetaError) {
        tracing::warn!(error = %err, "collection error");
        self.observer.error(&err);
        self.errors.lock().push(err);
    }

    fn finish_unit(&self) {
        if self.counter.finish_one() {
            self.complete();
        }
    }

    fn complete(&self) {
        if self.root_failure.lock().is_some() {
            self.done.notify_one();
            return;
        }
        let store = self.store.lock();
        tracing::info!(
            root = %self.root.display(),
            files = self.parsed.load(Ordering::Relaxed),
            stored = store.len(),
            errors = self.errors.lock().len(),
            "collection complete"
        );
        self.observer.complete(&store);
        drop(store);
        self.done.notify_one();
    }

    /// Move the results out once the traversal is complete.
    pub(crate) fn take_results(&self) -> (CollectionStore, Vec<MetaError>) {
        let store = std::mem::replace(
            &mut *self.store.lock(),
            CollectionStore::new(self.root.clone()),
        );
        let errors = std::mem::take(&mut *self.errors.lock());
        (store, errors)
    }
}
