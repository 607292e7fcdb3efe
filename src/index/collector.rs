//! @module "Collector"
//! @summary "Async and blocking tree traversal drivers"
//! @layer service
//!
//! Directory tree collection with parallel file processing.
//!
//! Walks a root path, scanning every eligible file it discovers, and
//! gathers the results into a [`CollectionStore`]. The number of files is
//! not known up front: each directory listing reveals more work, tracked by
//! a [`WorkCounter`](super::WorkCounter) shared by all branches.

use std::fs::Metadata;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use super::filter::{FileFilter, SourceFilter};
use super::observer::CollectObserver;
use super::traversal::{EntryAction, Traversal};
use crate::config::Config;
use crate::error::{MetaError, Result};
use crate::store::CollectionStore;

/// Lifecycle of a [`Collector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Traversing,
    /// Every reachable branch finished, possibly with errors
    Complete,
    /// The root itself could not be read
    Failed,
}

/// Outcome of a finished traversal.
#[derive(Debug)]
pub struct Collection {
    pub store: CollectionStore,
    /// Branch errors, in the order they were reported
    pub errors: Vec<MetaError>,
}

impl Collection {
    /// No branch reported an error
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Collects metadata for a source tree. Each collector runs once.
pub struct Collector {
    config: Config,
    filter: Arc<dyn FileFilter>,
    state: Mutex<TraversalState>,
    cancelled: Arc<AtomicBool>,
}

type VisitFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

impl Collector {
    /// Create a collector whose filter follows the config's extension and
    /// exclude patterns.
    pub fn new(config: Config) -> Result<Self> {
        let filter = SourceFilter::from_config(&config)?;
        Ok(Self {
            config,
            filter: Arc::new(filter),
            state: Mutex::new(TraversalState::Idle),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the eligibility filter.
    pub fn with_filter(mut self, filter: impl FileFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> TraversalState {
        *self.state.lock()
    }

    /// Stop dispatching new work. Reads already in flight finish and the
    /// traversal still completes.
    pub fn cancel(&self) {
        tracing::debug!("collection cancelled");
        self.cancelled.store(true, Ordering::Release);
    }

    /// Collect the tree under `root` using async I/O.
    ///
    /// Must be called from within a tokio runtime. Returns an error only if
    /// the root cannot be stat'ed or listed, or the collector already ran;
    /// per-branch failures are listed in [`Collection::errors`].
    pub async fn collect<P, O>(&self, root: P, observer: O) -> Result<Collection>
    where
        P: AsRef<Path>,
        O: CollectObserver + 'static,
    {
        let root = root.as_ref().to_path_buf();
        let observer: Arc<dyn CollectObserver> = Arc::new(observer);
        self.begin()?;

        let metadata = match stat(&root, self.config.follow_symlinks).await {
            Ok(metadata) => metadata,
            Err(e) => return Err(self.fail(&*observer, MetaError::stat(&root, e))),
        };

        let traversal = Arc::new(self.traversal(&root, Arc::clone(&observer)));
        let limiter = Arc::new(Semaphore::new(self.config.max_open_files.max(1)));

        tokio::spawn(visit(
            Arc::clone(&traversal),
            limiter,
            root,
            Some(metadata),
        ));
        // Completion stores a permit if it fires before we wait.
        traversal.finished().await;

        self.finish(&*observer, &traversal)
    }

    /// Collect the tree under `root` on the rayon thread pool with blocking
    /// I/O. Same events and results as [`collect`](Self::collect).
    pub fn collect_blocking<P, O>(&self, root: P, observer: O) -> Result<Collection>
    where
        P: AsRef<Path>,
        O: CollectObserver + 'static,
    {
        let root = root.as_ref().to_path_buf();
        let observer: Arc<dyn CollectObserver> = Arc::new(observer);
        self.begin()?;

        let metadata = match stat_blocking(&root, self.config.follow_symlinks) {
            Ok(metadata) => metadata,
            Err(e) => return Err(self.fail(&*observer, MetaError::stat(&root, e))),
        };

        let traversal = self.traversal(&root, Arc::clone(&observer));
        rayon::scope(|scope| visit_blocking(scope, &traversal, root, Some(metadata)));

        self.finish(&*observer, &traversal)
    }

    fn begin(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != TraversalState::Idle {
            return Err(MetaError::AlreadyStarted);
        }
        *state = TraversalState::Traversing;
        Ok(())
    }

    fn fail(&self, observer: &dyn CollectObserver, err: MetaError) -> MetaError {
        tracing::warn!(error = %err, "collection root unreadable");
        observer.error(&err);
        *self.state.lock() = TraversalState::Failed;
        err
    }

    fn traversal(&self, root: &Path, observer: Arc<dyn CollectObserver>) -> Traversal {
        Traversal::new(
            root.to_path_buf(),
            self.config.follow_symlinks,
            Arc::clone(&self.filter),
            observer,
            Arc::clone(&self.cancelled),
        )
    }

    fn finish(&self, observer: &dyn CollectObserver, traversal: &Traversal) -> Result<Collection> {
        if let Some(err) = traversal.take_root_failure() {
            return Err(self.fail(observer, err));
        }
        *self.state.lock() = TraversalState::Complete;
        let (store, errors) = traversal.take_results();
        Ok(Collection { store, errors })
    }
}

async fn stat(path: &Path, follow_symlinks: bool) -> std::io::Result<Metadata> {
    if follow_symlinks {
        tokio::fs::metadata(path).await
    } else {
        tokio::fs::symlink_metadata(path).await
    }
}

fn stat_blocking(path: &Path, follow_symlinks: bool) -> std::io::Result<Metadata> {
    if follow_symlinks {
        std::fs::metadata(path)
    } else {
        std::fs::symlink_metadata(path)
    }
}

/// Handle one unit: stat it, then scan, skip or expand it. Children are
/// spawned as separate tasks.
fn visit(
    traversal: Arc<Traversal>,
    limiter: Arc<Semaphore>,
    path: PathBuf,
    known: Option<Metadata>,
) -> VisitFuture {
    Box::pin(async move {
        if traversal.is_cancelled() {
            return traversal.skipped();
        }

        let metadata = match known {
            Some(metadata) => metadata,
            None => match stat(&path, traversal.follow_symlinks()).await {
                Ok(metadata) => metadata,
                Err(e) => return traversal.failed(MetaError::stat(&path, e)),
            },
        };

        match traversal.action(&path, &metadata) {
            EntryAction::Skip => traversal.skipped(),
            EntryAction::Scan => {
                let content = {
                    let _permit = limiter.acquire().await.ok();
                    tokio::fs::read_to_string(&path).await
                };
                match content {
                    Ok(content) => traversal.scanned(&path, &content),
                    Err(e) => traversal.failed(MetaError::read_file(&path, e)),
                }
            }
            EntryAction::Descend => {
                if traversal.follow_symlinks() {
                    match tokio::fs::canonicalize(&path).await {
                        Ok(canonical) if !traversal.first_visit(&canonical) => {
                            return traversal.skipped();
                        }
                        Ok(_) => {}
                        Err(e) => return traversal.dir_failed(&path, MetaError::stat(&path, e)),
                    }
                }

                let listing = {
                    let _permit = limiter.acquire().await.ok();
                    list_dir(&path).await
                };
                let children = match listing {
                    Ok(children) => children,
                    Err(e) => return traversal.dir_failed(&path, MetaError::read_dir(&path, e)),
                };

                for child in traversal.expand(&path, children) {
                    tokio::spawn(visit(
                        Arc::clone(&traversal),
                        Arc::clone(&limiter),
                        child,
                        None,
                    ));
                }
            }
        }
    })
}

async fn list_dir(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut children = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        children.push(entry.path());
    }
    Ok(children)
}

fn visit_blocking<'s>(
    scope: &rayon::Scope<'s>,
    traversal: &'s Traversal,
    path: PathBuf,
    known: Option<Metadata>,
) {
    if traversal.is_cancelled() {
        return traversal.skipped();
    }

    let metadata = match known {
        Some(metadata) => metadata,
        None => match stat_blocking(&path, traversal.follow_symlinks()) {
            Ok(metadata) => metadata,
            Err(e) => return traversal.failed(MetaError::stat(&path, e)),
        },
    };

    match traversal.action(&path, &metadata) {
        EntryAction::Skip => traversal.skipped(),
        EntryAction::Scan => match std::fs::read_to_string(&path) {
            Ok(content) => traversal.scanned(&path, &content),
            Err(e) => traversal.failed(MetaError::read_file(&path, e)),
        },
        EntryAction::Descend => {
            if traversal.follow_symlinks() {
                match std::fs::canonicalize(&path) {
                    Ok(canonical) if !traversal.first_visit(&canonical) => {
                        return traversal.skipped();
                    }
                    Ok(_) => {}
                    Err(e) => return traversal.dir_failed(&path, MetaError::stat(&path, e)),
                }
            }

            let listing = std::fs::read_dir(&path).and_then(|entries| {
                entries
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<std::io::Result<Vec<_>>>()
            });
            let children = match listing {
                Ok(children) => children,
                Err(e) => return traversal.dir_failed(&path, MetaError::read_dir(&path, e)),
            };

            for child in traversal.expand(&path, children) {
                scope.spawn(move |scope| visit_blocking(scope, traversal, child, None));
            }
        }
    }
}
