//! The computation-engine boundary.
//!
//! The engine is an external module that exclusively owns a flat, growable
//! linear memory region. The bridge only ever reads that region, and every
//! mutating boundary call may grow (and thus relocate) it. The contract is
//! expressed through ownership: views borrow from [`Engine::memory`], and
//! mutating entry points take `&mut self`, so the borrow checker forbids
//! holding a view across any boundary crossing.

mod boundary;
mod diagnostics;

pub use boundary::{BufferKind, Engine, PresentationHandle};
pub use diagnostics::{DiagnosticsSink, HostLog};
