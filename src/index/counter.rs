//! @module "Work Counter"
//! @summary "Outstanding-work counting with a single completion point"
//! @layer service
//!
//! Outstanding-work counting for traversals of unknown size.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts discovered-but-unfinished units of a traversal.
///
/// Starts at one unit (the root). A directory replaces itself with its
/// children through [`expand`](Self::expand); every other unit calls
/// [`finish_one`](Self::finish_one) exactly once. The call that takes the
/// count from one to zero returns `true`, and no other call ever does.
#[derive(Debug)]
pub struct WorkCounter {
    pending: AtomicUsize,
}

impl WorkCounter {
    pub fn new() -> Self {
        Self {
            pending: AtomicUsize::new(1),
        }
    }

    /// Add `children` units, then finish the unit that discovered them.
    ///
    /// Must be called before any child is dispatched.
    pub fn expand(&self, children: usize) -> bool {
        self.pending.fetch_add(children, Ordering::AcqRel);
        self.finish_one()
    }

    /// Finish one unit. Returns `true` for the final unit.
    pub fn finish_one(&self) -> bool {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "work counter underflow");
        previous == 1
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for WorkCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_single_file_root() {
        let counter = WorkCounter::new();
        assert!(counter.finish_one());
        assert!(counter.is_done());
    }

    #[test]
    fn test_empty_directory_root() {
        let counter = WorkCounter::new();
        assert!(counter.expand(0));
    }

    #[test]
    fn test_sequential_tree() {
        // root -> [dir, file], dir -> [file, file]
        let counter = WorkCounter::new();
        assert!(!counter.expand(2));
        assert!(!counter.expand(2));
        assert_eq!(counter.pending(), 3);
        assert!(!counter.finish_one());
        assert!(!counter.finish_one());
        assert!(counter.finish_one());
    }

    /// Each thread owns a subtree: a directory with `width` files. The
    /// counter must drain exactly once however the threads interleave.
    #[test]
    fn test_concurrent_expansion_fires_once() {
        for _ in 0..50 {
            let counter = WorkCounter::new();
            let fired = AtomicUsize::new(0);
            let dirs = 8;
            let width = 16;

            let record = |done: bool| {
                if done {
                    fired.fetch_add(1, Ordering::SeqCst);
                }
            };

            record(counter.expand(dirs));
            std::thread::scope(|s| {
                for _ in 0..dirs {
                    s.spawn(|| {
                        record(counter.expand(width));
                        for _ in 0..width {
                            record(counter.finish_one());
                        }
                    });
                }
            });

            assert_eq!(fired.load(Ordering::SeqCst), 1);
            assert!(counter.is_done());
        }
    }
}
