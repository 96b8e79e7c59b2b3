//! State module for tracking pipeline progress
//!
//! # Components
//!
//! - `PipelineStage` / `PipelineState`: the per-URL idempotence ledger
//! - `OriginState`: per-origin request timing used by the politeness gate

mod origin_state;
mod stage;

pub use origin_state::OriginState;
pub use stage::{PipelineStage, PipelineState};
