//! Batch planning
//!
//! Splits a selection into channel-sized batches, rotates reagent sources
//! across them and decides how each batch is dispatched to the instruments.

pub mod dispatch;
pub mod partition;
pub mod source;

pub use dispatch::{for_each_target, plan_targets, select, Dispatch, Target, TargetList};
pub use partition::{partition, Batch, BatchPlan, CHANNEL_COUNT, MAX_BATCHES};
pub use source::{SourceGroup, Supply, MAX_SOURCES};
