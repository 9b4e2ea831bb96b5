//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the scheduling core and the
//! outside world (time, filesystem, IDs). Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod id_gen;

pub use clock::Clock;
pub use filesystem::FileSystem;
pub use id_gen::IdGenerator;
