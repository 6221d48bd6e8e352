//! Domain types for the care-coordination data model.

pub mod elder;
pub mod family_member;
pub mod provider;
pub mod visit;
pub mod visit_log;

pub use elder::Elder;
pub use family_member::FamilyMember;
pub use provider::ServiceProvider;
pub use visit::{Visit, VisitStatus};
pub use visit_log::{Mood, TimelineEntry, Vitals, VisitLog};
