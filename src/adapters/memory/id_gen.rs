//! Sequential ID generator.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ports::IdGenerator;

/// Produces `<prefix>-001`, `<prefix>-002`, ... in call order.
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose IDs start with `prefix`.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string(), next: AtomicU64::new(1) }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n:03}", self.prefix)
    }
}
