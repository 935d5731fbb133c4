//! Runway orchestrator
//!
//! Dispatches script executions to executor backends, follows them until they
//! complete and relays executions to agents running in private clusters.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod definitions;
pub mod executor;
pub mod metrics;
pub mod relay;
pub mod repository;
pub mod service;
