//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per table; all public functions are re-exported here.

mod elder;
mod family_member;
mod provider;
mod visit;
mod visit_log;

pub use elder::*;
pub use family_member::*;
pub use provider::*;
pub use visit::*;
pub use visit_log::*;
