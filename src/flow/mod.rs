//! Flow module - step sequencing and condition waiting
//!
//! Steps are executed in order by the [`StepRunner`]. Each action goes
//! through the [`Actuator`], state transitions are confirmed by the
//! [`ConditionWaiter`], and evidence is written by [`ArtifactCapture`].

pub mod actuator;
pub mod assertion;
pub mod capture;
pub mod condition;
pub mod runner;
pub mod scenario;
pub mod step;
pub mod waiter;

pub use actuator::Actuator;
pub use assertion::{assert_equals, assert_member, AssertionResult};
pub use capture::{ArtifactCapture, ArtifactRecord};
pub use condition::Condition;
pub use runner::{Run, RunFailure, RunReport, RunStatus, Session, StepRunner};
pub use scenario::Scenario;
pub use step::{Check, Expected, Step, StepKind};
pub use waiter::ConditionWaiter;
