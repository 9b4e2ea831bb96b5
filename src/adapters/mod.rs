//! Adapter implementations of the port traits.
//!
//! `live` talks to the real system; `memory` is deterministic and used by
//! tests.

pub mod live;
pub mod memory;
