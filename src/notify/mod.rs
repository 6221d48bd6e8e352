//! Visit-completion notification logic: change-event decoding,
//! transition detection, and message composition. Dispatch lives in
//! the webhook endpoints, which own the per-recipient failure policy.

pub mod event;
pub mod message;

pub use event::{ChangeEvent, VisitRecord};
