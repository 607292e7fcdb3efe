#![forbid(unsafe_code)]

//! @module "docmeta Library"
//! @summary "Doc-comment annotation metadata for class-based source trees"
//! @layer api
//!
//! # docmeta
//!
//! Scans `/** ... */` comments for `@name {type} value` annotations, works
//! out which class, method or accessor each comment documents, and collects
//! the results for a whole directory tree keyed by namespace.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docmeta::{Collector, Config};
//!
//! #[tokio::main]
//! async fn main() -> docmeta::Result<()> {
//!     let collector = Collector::new(Config::default())?;
//!     let collection = collector.collect("./models", ()).await?;
//!
//!     for (namespace, file) in collection.store.iter() {
//!         println!("{namespace}: {} methods", file.method_count());
//!     }
//!     collection.store.write_json("models.meta.json")?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod parse;
pub mod scan;
pub mod store;

// Re-exports
pub use config::Config;
pub use error::{MetaError, Result};
pub use index::{
    CollectEvent, CollectObserver, Collection, Collector, FileFilter, SourceFilter,
    TraversalState, WorkCounter,
};
pub use parse::{Annotation, CommentBlock, Declaration, DeclarationKind};
pub use scan::{Scanned, Scanner};
pub use store::{CollectionStore, FileMetadata, PropertyEntry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
