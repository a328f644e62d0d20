//! Response models for the operational endpoints
//!
//! Serialized bodies of `/stats` and `/health`.

pub mod responses;

pub use responses::{HealthResponse, StatsResponse};
