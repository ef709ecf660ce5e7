//! studyloop-core — Weak-concept remediation and adaptive retest.
//!
//! This crate defines the data model, the history aggregator, the
//! weak-concept model, the handoff slot, and the retest orchestrator that
//! the rest of studyloop builds on.

pub mod analytics;
pub mod error;
pub mod handoff;
pub mod model;
pub mod quiz;
pub mod retest;
pub mod traits;
pub mod validation;
pub mod weakness;
