//! Overall loading progress across every tracked asset.

/// Progress notifications, in the order they occur.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadingEvent {
    /// The first item of a loading batch started.
    Started {
        /// Item that started the batch.
        label: String,
        /// Items resolved so far.
        loaded: usize,
        /// Items tracked so far.
        total: usize,
    },
    /// An item resolved (successfully or not).
    Progress {
        /// Item that resolved.
        label: String,
        /// Items resolved so far.
        loaded: usize,
        /// Items tracked so far.
        total: usize,
    },
    /// An item failed. Followed by a `Progress` for the same item.
    Error {
        /// Item that failed.
        label: String,
    },
    /// Every tracked item has resolved.
    Loaded,
}

/// Counts started and resolved items, like a browser-style loading manager.
///
/// Failed items count as resolved, so a single broken asset never keeps the
/// loading screen up forever.
#[derive(Debug, Default)]
pub struct LoadingTracker {
    loaded: usize,
    total: usize,
    failed: usize,
    loading: bool,
}

impl LoadingTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item that is about to load.
    pub fn item_start(&mut self, label: &str) -> Vec<LoadingEvent> {
        self.total += 1;
        let mut events = Vec::new();
        if !self.loading {
            self.loading = true;
            tracing::info!(
                "Started loading: {label} ({} of {} loaded)",
                self.loaded,
                self.total
            );
            events.push(LoadingEvent::Started {
                label: label.to_string(),
                loaded: self.loaded,
                total: self.total,
            });
        }
        events
    }

    /// Mark an item as successfully loaded.
    pub fn item_end(&mut self, label: &str) -> Vec<LoadingEvent> {
        self.resolve(label)
    }

    /// Mark an item as failed. It still counts towards completion.
    pub fn item_error(&mut self, label: &str) -> Vec<LoadingEvent> {
        self.failed += 1;
        tracing::error!("There was an error loading {label}");
        let mut events = vec![LoadingEvent::Error {
            label: label.to_string(),
        }];
        events.extend(self.resolve(label));
        events
    }

    fn resolve(&mut self, label: &str) -> Vec<LoadingEvent> {
        if self.loaded >= self.total {
            tracing::warn!("{label} resolved but was never started");
            return Vec::new();
        }
        self.loaded += 1;
        tracing::info!("Loaded {label} ({} of {})", self.loaded, self.total);
        let mut events = vec![LoadingEvent::Progress {
            label: label.to_string(),
            loaded: self.loaded,
            total: self.total,
        }];
        if self.is_complete() {
            self.loading = false;
            tracing::info!("All items loaded");
            events.push(LoadingEvent::Loaded);
        }
        events
    }

    /// Fraction resolved in `0.0..=1.0`. Zero before anything is tracked.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }

    /// At least one item was tracked and all of them resolved.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.loaded == self.total
    }

    /// Items resolved so far.
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Items tracked so far.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items that failed.
    pub fn failed(&self) -> usize {
        self.failed
    }
}
