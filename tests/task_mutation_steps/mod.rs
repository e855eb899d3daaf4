//! Step definitions for task mutation scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
