//! Per-call cycle and depth tracking.

use std::collections::HashSet;

use scenewire_scene::InstanceId;

use crate::config::ProjectionConfig;

/// Outcome of [`TraversalContext::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Proceed,
    AlreadyVisited,
}

/// Outcome of [`TraversalContext::push_depth`] and
/// [`TraversalContext::push_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Proceed,
    Exceeded,
}

/// Traversal state for one top-level projection call.
///
/// Every identity passed to [`enter`](Self::enter) is remembered for the
/// rest of the call, not just along the current path: a reference reached
/// twice through unrelated attributes is fully projected only the first
/// time.
///
/// A successful `push_*` must be paired with the matching `pop_*`; an
/// `Exceeded` push leaves the counter untouched.
#[derive(Debug)]
pub struct TraversalContext {
    visited: HashSet<InstanceId>,
    depth: usize,
    max_depth: usize,
    record_depth: usize,
    max_record_depth: usize,
}

impl TraversalContext {
    pub fn new(max_depth: usize, max_record_depth: usize) -> Self {
        Self {
            visited: HashSet::new(),
            depth: 0,
            max_depth,
            record_depth: 0,
            max_record_depth,
        }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(config.max_depth, config.max_record_depth)
    }

    /// Marks `id` as projected. Returns `AlreadyVisited` if it was marked
    /// earlier in this call.
    pub fn enter(&mut self, id: InstanceId) -> Visit {
        if self.visited.insert(id) {
            Visit::Proceed
        } else {
            Visit::AlreadyVisited
        }
    }

    pub fn is_visited(&self, id: InstanceId) -> bool {
        self.visited.contains(&id)
    }

    pub fn push_depth(&mut self) -> Depth {
        if self.depth >= self.max_depth {
            return Depth::Exceeded;
        }
        self.depth += 1;
        Depth::Proceed
    }

    pub fn pop_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Enter a nested value record. The first record entry plus
    /// `max_record_depth` further levels are allowed.
    pub fn push_record(&mut self) -> Depth {
        if self.record_depth > self.max_record_depth {
            return Depth::Exceeded;
        }
        self.record_depth += 1;
        Depth::Proceed
    }

    pub fn pop_record(&mut self) {
        self.record_depth = self.record_depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn record_depth(&self) -> usize {
        self.record_depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

impl Default for TraversalContext {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}
