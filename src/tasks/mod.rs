//! Background Tasks Module
//!
//! # Tasks
//! - Fragment cleanup: drops expired fragments at a configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
