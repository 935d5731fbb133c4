//! Core domain types
//!
//! This module contains the core domain structures used across Runway services.
//! These types are shared between the orchestrator (for persistence), the agent
//! (for relayed execution) and the client tooling (for rendering).

pub mod execution;
pub mod executor;
pub mod script;
