//! Runway agent
//!
//! Runs inside a cluster the control plane cannot reach. The agent dials out
//! to the control plane, holds the relay stream open and executes the runs it
//! is sent through a local orchestrator.

pub mod config;
pub mod handler;
pub mod tunnel;
