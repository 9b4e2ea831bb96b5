//! Service context bundling all port trait objects.

use chrono::{DateTime, Utc};

use crate::adapters::live::{LiveClock, LiveFileSystem, LiveIdGenerator};
use crate::adapters::memory::{MemoryFileSystem, SequentialIdGenerator, SteppingClock};
use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::id_gen::IdGenerator;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors wire up
/// different adapter implementations (live or in-memory).
pub struct ServiceContext {
    /// Clock for block records and plan lifecycle stamps.
    pub clock: Box<dyn Clock>,
    /// Filesystem used by the plan store.
    pub fs: Box<dyn FileSystem>,
    /// ID generator for execution plan identifiers.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a live context backed by the system clock, real disk, and
    /// random UUIDs.
    #[must_use]
    pub fn live() -> Self {
        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            id_gen: Box::new(LiveIdGenerator::new()),
        }
    }

    /// Creates a fully deterministic context: time pinned at `at`, an empty
    /// in-memory filesystem, and sequential `plan-NNN` identifiers.
    #[must_use]
    pub fn in_memory(at: DateTime<Utc>) -> Self {
        Self {
            clock: Box::new(SteppingClock::fixed(at)),
            fs: Box::new(MemoryFileSystem::new()),
            id_gen: Box::new(SequentialIdGenerator::new("plan")),
        }
    }
}
