//! Test execution server library.
//!
//! Tracks manual test runs: the executions created for each selected test
//! case, per-step results with evidence, and the status rollups reported on
//! top of them.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
