//! Per-junction progress callbacks.
//!
//! Smoothing a large tree touches one neighborhood per junction; callers that
//! want feedback pass a [`Progress`] to the `_with_progress` entry points.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use vascular_junctions::algo::Progress;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let sink = Arc::clone(&seen);
//! let progress = Progress::new(move |current, total, stage| {
//!     eprintln!("[{current}/{total}] {stage}");
//!     sink.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! progress.report(0, 2, "Smoothing junction regions");
//! progress.finish(2, "Smoothing junction regions");
//! assert_eq!(seen.load(Ordering::Relaxed), 2);
//! ```

use std::sync::Arc;

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Receives `(current, total, stage)` updates.
///
/// Cheap to clone; clones share the callback.
#[derive(Clone)]
pub struct Progress {
    callback: Option<Arc<Callback>>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// A reporter that drops every update.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Whether updates reach a callback.
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    /// Report that `current` of `total` steps of `stage` are done.
    #[inline]
    pub fn report(&self, current: usize, total: usize, stage: &str) {
        if let Some(callback) = &self.callback {
            callback(current, total, stage);
        }
    }

    /// Report `stage` as complete.
    #[inline]
    pub fn finish(&self, total: usize, stage: &str) {
        self.report(total, total, stage);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("active", &self.is_active())
            .finish()
    }
}
