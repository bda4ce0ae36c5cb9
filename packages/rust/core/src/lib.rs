//! Core pipeline orchestration and domain logic for jekyllize.
//!
//! This crate ties together section discovery, categorization, page writing
//! and navigation splicing into end-to-end workflows (e.g., `convert`).

pub mod categorize;
pub mod discovery;
pub mod maintenance;
pub mod navigation;
pub mod pipeline;
pub mod repair;
pub mod site;
