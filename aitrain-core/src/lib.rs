//! AI Training Core
//!
//! Core types for driving remote AI training jobs.
//!
//! This crate contains:
//! - Domain types: job specifications, job records, lifecycle states
//! - DTOs: the wire shapes sent to the training API
//!
//! Nothing here performs I/O; the HTTP side lives in `aitrain-client`.

pub mod domain;
pub mod dto;
