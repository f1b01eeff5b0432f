//! Mercata Entitlement — plan-derived feature resolution, request
//! admission gating, and subscription lifecycle management.

pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod resolver;
pub mod scheduler;

pub use error::EntitlementError;
pub use gate::{Admission, AdmissionGate, CallerIdentity};
pub use lifecycle::{LifecycleManager, PlanStatus, SweepOutcome};
pub use resolver::EntitlementResolver;
pub use scheduler::SweepScheduler;
