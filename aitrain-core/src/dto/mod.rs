//! Data Transfer Objects for the training API
//!
//! Wire representations that differ from the domain types they are built from.

pub mod job;
