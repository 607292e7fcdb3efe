//! @module "Index"
//! @summary "Recursive source-tree collection"
//! @layer service
//!
//! A [`Collector`] walks a directory, scans every eligible file and reports
//! progress to a [`CollectObserver`]. Completion is detected with a
//! [`WorkCounter`], so it fires exactly once even though the size of the
//! tree is only learned while walking it.

mod collector;
mod counter;
mod filter;
mod observer;
mod traversal;

pub use collector::{Collection, Collector, TraversalState};
pub use counter::WorkCounter;
pub use filter::{FileFilter, SourceFilter};
pub use observer::{CollectEvent, CollectObserver};
