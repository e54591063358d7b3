//! depgov - Dependency-version governance engine
//!
//! This library provides:
//! - Version discovery against a Maven Central compatible index
//! - Policy filtering (ignores, retractions, pins, exact/major/minor markers)
//! - Best-version resolution with optional coordinate migrations
//! - Snapshot files and before/after diff reports

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod policy;
pub mod progress;
pub mod registry;
pub mod snapshot;
pub mod update;
