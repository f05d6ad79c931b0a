//! Core domain types
//!
//! These types describe what a caller wants to run (`JobSpec`) and what the
//! remote service reports back (`Job`, `JobState`, `Me`).

pub mod job;
pub mod me;
pub mod spec;
