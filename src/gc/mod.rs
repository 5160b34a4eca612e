//! Heap registry for runtime objects
//!
//! Objects are reference counted, so acyclic garbage is freed as soon as
//! the last handle goes away. Cycles (a constructor and its prototype, a
//! closure captured in its own scope) are not, and the registry exists for
//! them: it holds a weak reference to every object a runtime allocates and,
//! when the runtime is dropped, clears each surviving object's properties,
//! prototype and internal slots so the cycles fall apart.
//!
//! Handles a host keeps past that point stay valid but refer to emptied
//! objects.

use crate::runtime::{Object, ObjectRef};
use std::cell::RefCell;
use std::rc::Weak;
use tracing::debug;

/// Heap registry configuration
#[derive(Debug, Clone)]
pub struct HeapConfig {
    /// Registrations between sweeps of dead weak entries
    pub prune_threshold: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            prune_threshold: 4096,
        }
    }
}

/// Heap statistics
#[derive(Debug, Clone, Default)]
pub struct HeapStats {
    /// Total objects registered
    pub total_allocations: usize,
    /// Entries dropped by pruning because their object was already freed
    pub total_freed: usize,
    /// Number of prune passes
    pub prunes: u64,
    /// Objects cleared by the last teardown
    pub torn_down: usize,
}

/// Weak registry of every object allocated by one runtime
pub struct Heap {
    config: HeapConfig,
    stats: HeapStats,
    entries: Vec<Weak<RefCell<Object>>>,
    since_prune: usize,
}

impl Heap {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: HeapConfig) -> Self {
        Self {
            config,
            stats: HeapStats::default(),
            entries: Vec::new(),
            since_prune: 0,
        }
    }

    /// Get heap statistics
    pub fn stats(&self) -> &HeapStats {
        &self.stats
    }

    /// Record a freshly allocated object
    pub fn register(&mut self, object: &ObjectRef) {
        self.entries.push(std::rc::Rc::downgrade(object));
        self.stats.total_allocations += 1;
        self.since_prune += 1;
        if self.since_prune >= self.config.prune_threshold {
            self.prune();
        }
    }

    /// Drop entries whose object has already been freed
    pub fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.strong_count() > 0);
        let freed = before - self.entries.len();
        self.stats.total_freed += freed;
        self.stats.prunes += 1;
        self.since_prune = 0;
        debug!(freed, live = self.entries.len(), "heap pruned");
    }

    /// Clear every live object, breaking all reference cycles
    ///
    /// Every survivor is held while the contents are cleared, so no object
    /// is freed mid-walk and deep object chains come apart without recursion.
    pub fn teardown(&mut self) {
        let live: Vec<ObjectRef> = self.entries.drain(..).filter_map(|e| e.upgrade()).collect();
        let mut cleared = 0;
        for object in &live {
            // Take the contents out before dropping them so destructors
            // that reach other objects never see this one borrowed
            let contents = match object.try_borrow_mut() {
                Ok(mut obj) => std::mem::replace(&mut *obj, Object::empty()),
                Err(_) => continue,
            };
            drop(contents);
            cleared += 1;
        }
        drop(live);
        self.stats.torn_down = cleared;
        debug!(cleared, "heap torn down");
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
